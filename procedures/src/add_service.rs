// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bring a named service, and its first instance, into existence.
//!
//! `prepare` resolves everything the operation needs (dependencies,
//! package, image, server, any already-existing service and instance) and
//! computes which of the four execute steps are still required.  `execute`
//! performs only those steps, in dependency order: import the image, update
//! a stale service image reference, create the service record, create the
//! first instance.  Side effects are strictly additive; an existing
//! instance is never deleted or reprovisioned by this procedure.

use async_trait::async_trait;
use slog::Logger;
use slog::info;
use slog::o;
use std::collections::BTreeSet;
use swrite::SWrite;
use swrite::swrite;
use swrite::swriteln;
use uuid::Uuid;

use dcadm_clients::InstanceCreate;
use dcadm_clients::ServiceCreate;
use dcadm_common::Error;
use dcadm_common::LookupType;
use dcadm_common::ResourceType;
use dcadm_common::types::Image;
use dcadm_common::types::ImageSource;
use dcadm_common::types::Instance;
use dcadm_common::types::NicClass;
use dcadm_common::types::Package;
use dcadm_common::types::Server;
use dcadm_common::types::Service;
use dcadm_common::types::Vm;

use crate::context::EngineContext;
use crate::procedure::PrepareOutcome;
use crate::procedure::Procedure;

/// How the target image is selected.
#[derive(Clone, Debug)]
pub enum ImageSelector {
    /// Newest image of the expected name on the (explicit or default)
    /// channel.
    Latest,
    /// Newest image of the expected name already in the local catalog.
    Current,
    /// A specific image id, resolved local-first then remote.
    Id(Uuid),
    /// A specific version, resolved local-first then remote.
    Version(String),
}

/// How the target server is selected.  Unspecified means the server
/// executing this invocation.
#[derive(Clone, Debug)]
pub enum ServerSelector {
    Id(Uuid),
    Hostname(String),
}

#[derive(Clone, Debug)]
pub struct AddServiceConfig {
    pub service_name: String,
    pub image: ImageSelector,
    pub channel: Option<String>,
    pub server: Option<ServerSelector>,
    pub package_name: String,
    pub networks: Vec<NicClass>,
    pub firewall: bool,
    /// Services that must already exist in the topology registry before
    /// this one can be added.
    pub dependencies: Vec<String>,
}

pub struct AddServiceProcedure {
    config: AddServiceConfig,
    prepared: Option<Prepared>,
}

/// Remote state resolved by `prepare`.
struct Prepared {
    channel: String,
    package: Package,
    service: Option<Service>,
    instance: Option<Instance>,
    /// Compute record backing the existing first instance, if any.
    vm: Option<Vm>,
    image: Image,
    download_needed: bool,
    server: Server,
}

impl Prepared {
    fn image_stale(&self) -> bool {
        self.service.as_ref().map_or(false, |svc| svc.image != self.image.id)
    }
}

impl AddServiceProcedure {
    pub fn new(config: AddServiceConfig) -> AddServiceProcedure {
        AddServiceProcedure { config, prepared: None }
    }

    fn log(&self, cx: &EngineContext) -> Logger {
        cx.log.new(o!(
            "procedure" => "add-service",
            "service" => self.config.service_name.clone(),
        ))
    }

    /// Resolve the target image per the configured selector.  A record
    /// resolved from the remote catalog still needs to be downloaded.
    async fn resolve_image(
        &self,
        cx: &EngineContext,
        channel: &str,
    ) -> Result<(Image, ImageSource), Error> {
        // A service's image is expected to carry the service's name.
        let name = &self.config.service_name;
        match &self.config.image {
            ImageSelector::Latest => {
                let mut images =
                    cx.remote_images.list_images(channel, name).await?;
                images.sort_by(|a, b| a.published_at.cmp(&b.published_at));
                let Some(newest) = images.pop() else {
                    return Err(Error::validation(format!(
                        "no \"{}\" image found on channel \"{}\"",
                        name, channel
                    )));
                };
                let source = if cx.images.get_image(newest.id).await?.is_some()
                {
                    ImageSource::Local
                } else {
                    ImageSource::Remote
                };
                Ok((newest, source))
            }
            ImageSelector::Current => {
                let mut images = cx.images.list_images(name).await?;
                images.sort_by(|a, b| a.published_at.cmp(&b.published_at));
                let Some(newest) = images.pop() else {
                    return Err(Error::validation(format!(
                        "no \"{}\" image found in the local catalog",
                        name
                    )));
                };
                Ok((newest, ImageSource::Local))
            }
            ImageSelector::Id(id) => {
                let (image, source) = match cx.images.get_image(*id).await? {
                    Some(image) => (image, ImageSource::Local),
                    None => match cx
                        .remote_images
                        .get_image(channel, *id)
                        .await?
                    {
                        Some(image) => (image, ImageSource::Remote),
                        None => {
                            return Err(LookupType::ById(*id)
                                .into_not_found(ResourceType::Image));
                        }
                    },
                };
                if image.name != *name {
                    return Err(Error::validation(format!(
                        "image {} is a \"{}\" image, not the \"{}\" image \
                         this service requires",
                        id, image.name, name
                    )));
                }
                Ok((image, source))
            }
            ImageSelector::Version(version) => {
                let local = cx.images.list_images(name).await?;
                if let Some(image) =
                    local.into_iter().find(|i| i.version == *version)
                {
                    return Ok((image, ImageSource::Local));
                }
                let remote =
                    cx.remote_images.list_images(channel, name).await?;
                match remote.into_iter().find(|i| i.version == *version) {
                    Some(image) => Ok((image, ImageSource::Remote)),
                    None => Err(Error::validation(format!(
                        "no \"{}\" image with version \"{}\" found locally \
                         or on channel \"{}\"",
                        name, version, channel
                    ))),
                }
            }
        }
    }

    async fn resolve_server(
        &self,
        cx: &EngineContext,
    ) -> Result<Server, Error> {
        match &self.config.server {
            Some(ServerSelector::Id(id)) => cx
                .servers
                .get_server(*id)
                .await?
                .ok_or_else(|| {
                    LookupType::ById(*id).into_not_found(ResourceType::Server)
                }),
            Some(ServerSelector::Hostname(hostname)) => {
                let servers =
                    cx.servers.list_servers(Some(hostname.as_str())).await?;
                servers.into_iter().next().ok_or_else(|| {
                    LookupType::ByName(hostname.clone())
                        .into_not_found(ResourceType::Server)
                })
            }
            None => cx
                .servers
                .get_server(cx.local_server_id)
                .await?
                .ok_or_else(|| {
                    Error::internal(format!(
                        "server inventory has no record of this host ({})",
                        cx.local_server_id
                    ))
                }),
        }
    }
}

#[async_trait]
impl Procedure for AddServiceProcedure {
    async fn prepare(
        &mut self,
        cx: &EngineContext,
    ) -> Result<PrepareOutcome, Error> {
        let log = self.log(cx);
        let name = self.config.service_name.clone();

        // Validate that all declared dependency services are present.
        let services = cx.registry.list_services().await?;
        let present: BTreeSet<&str> =
            services.iter().map(|svc| svc.name.as_str()).collect();
        let missing: Vec<&str> = self
            .config
            .dependencies
            .iter()
            .map(String::as_str)
            .filter(|dep| !present.contains(dep))
            .collect();
        if !missing.is_empty() {
            let mut message = format!(
                "cannot add service \"{}\": required services are not \
                 present:",
                name
            );
            for dep in &missing {
                swrite!(
                    message,
                    "\n    \"{}\" (add it first: `dcadm post-setup {}`)",
                    dep,
                    dep
                );
            }
            return Err(Error::validation(message));
        }

        let channel = self
            .config
            .channel
            .clone()
            .unwrap_or_else(|| cx.default_channel.clone());

        // Package names are expected to be unique among active packages.
        let packages =
            cx.packages.list_packages(&self.config.package_name, true).await?;
        let package = match packages.len() {
            1 => packages.into_iter().next().ok_or_else(|| {
                Error::internal("package list changed length")
            })?,
            0 => {
                return Err(Error::validation(format!(
                    "no active package named \"{}\"",
                    self.config.package_name
                )));
            }
            n => {
                return Err(Error::validation(format!(
                    "package name \"{}\" is ambiguous: {} active packages \
                     match",
                    self.config.package_name, n
                )));
            }
        };

        let service = services.into_iter().find(|svc| svc.name == name);
        let (instance, vm) = match &service {
            Some(svc) => {
                let instances = cx.registry.list_instances(svc.id).await?;
                let instance = instances.into_iter().next();
                let vm = match &instance {
                    Some(inst) => cx.compute.get_vm(inst.id).await?,
                    None => None,
                };
                (instance, vm)
            }
            None => (None, None),
        };

        let (image, source) = self.resolve_image(cx, &channel).await?;
        let download_needed = source == ImageSource::Remote;
        let server = self.resolve_server(cx).await?;

        let nothing_to_do = service.is_some()
            && !download_needed
            && service.as_ref().map_or(false, |svc| svc.image == image.id)
            && instance.is_some();

        info!(
            log,
            "prepared";
            "image_id" => %image.id,
            "download_needed" => download_needed,
            "service_exists" => service.is_some(),
            "instance_exists" => instance.is_some(),
            "nothing_to_do" => nothing_to_do,
        );

        self.prepared = Some(Prepared {
            channel,
            package,
            service,
            instance,
            vm,
            image,
            download_needed,
            server,
        });
        Ok(if nothing_to_do {
            PrepareOutcome::NothingToDo
        } else {
            PrepareOutcome::HasWork
        })
    }

    fn summarize(&self) -> String {
        let Some(p) = &self.prepared else {
            return String::new();
        };
        let name = &self.config.service_name;
        let mut out = String::new();
        if p.download_needed {
            swriteln!(
                out,
                "- download image {} ({}@{}) from channel \"{}\"",
                p.image.id,
                p.image.name,
                p.image.version,
                p.channel
            );
        }
        if p.image_stale() {
            swriteln!(
                out,
                "- update service \"{}\" to image {}@{}",
                name,
                p.image.name,
                p.image.version
            );
        }
        if p.service.is_none() {
            swriteln!(
                out,
                "- create service \"{}\" (package \"{}\", image {}@{})",
                name,
                p.package.name,
                p.image.name,
                p.image.version
            );
        }
        if p.instance.is_none() {
            swriteln!(
                out,
                "- provision first \"{}\" instance on server \"{}\"",
                name,
                p.server.hostname
            );
        } else if let Some(vm) = &p.vm {
            swriteln!(
                out,
                "- instance \"{}\" already provisioned on server {}",
                vm.alias,
                vm.server_id
            );
        }
        out
    }

    async fn execute(&mut self, cx: &EngineContext) -> Result<(), Error> {
        let log = self.log(cx);
        let name = self.config.service_name.clone();
        let p = self.prepared.as_mut().ok_or_else(|| {
            Error::internal("AddServiceProcedure executed before prepare")
        })?;

        if p.download_needed {
            info!(
                log,
                "importing image";
                "image_id" => %p.image.id,
                "channel" => &p.channel,
            );
            cx.images.import_image(p.image.id, &p.channel).await?;
            p.download_needed = false;
        }

        match &mut p.service {
            Some(svc) => {
                if svc.image != p.image.id {
                    info!(
                        log,
                        "updating service image reference";
                        "image_id" => %p.image.id,
                    );
                    cx.registry
                        .update_service_image(svc.id, p.image.id)
                        .await?;
                    svc.image = p.image.id;
                }
            }
            None => {
                let boot_script = cx.registry.boot_script_template().await?;
                info!(log, "creating service");
                let svc = cx
                    .registry
                    .create_service(ServiceCreate {
                        name: name.clone(),
                        package: p.package.id,
                        image: p.image.id,
                        networks: self.config.networks.clone(),
                        firewall_enabled: self.config.firewall,
                        domain: format!("{}.{}", name, cx.dns_domain),
                        boot_script: Some(boot_script),
                    })
                    .await?;
                p.service = Some(svc);
            }
        }

        if p.instance.is_none() {
            // The service record exists by this point: either it already
            // did, or the branch above just created it.
            let service_id = p
                .service
                .as_ref()
                .map(|svc| svc.id)
                .ok_or_else(|| {
                    Error::internal(
                        "instance creation reached with no service record",
                    )
                })?;
            info!(
                log,
                "provisioning first instance";
                "server" => &p.server.hostname,
            );
            let instance = cx
                .registry
                .create_instance(InstanceCreate {
                    service_id,
                    alias: format!("{}0", name),
                    server_id: p.server.id,
                })
                .await?;
            p.instance = Some(instance);
        }

        Ok(())
    }
}

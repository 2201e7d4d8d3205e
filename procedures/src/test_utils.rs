// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test helpers: an in-memory datacenter implementing every collaborator
//! trait, with builder methods to describe a synthetic fleet and a record
//! of every mutation the engine performs against it.

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use slog::Logger;
use slog::o;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use uuid::Uuid;

use dcadm_clients::ComputeInventory;
use dcadm_clients::HistoryStore;
use dcadm_clients::ImageCatalog;
use dcadm_clients::InstanceCreate;
use dcadm_clients::NetworkInventory;
use dcadm_clients::NicCreate;
use dcadm_clients::OperatorUi;
use dcadm_clients::PackageCatalog;
use dcadm_clients::RemoteImageCatalog;
use dcadm_clients::ServerInventory;
use dcadm_clients::ServiceCreate;
use dcadm_clients::ServiceRegistry;
use dcadm_common::Error;
use dcadm_common::config::EngineConfig;
use dcadm_common::history::RunRecord;
use dcadm_common::types::Image;
use dcadm_common::types::Instance;
use dcadm_common::types::Network;
use dcadm_common::types::Nic;
use dcadm_common::types::Package;
use dcadm_common::types::Server;
use dcadm_common::types::Service;
use dcadm_common::types::Vm;
use dcadm_common::types::VmState;

use crate::context::ClientHandles;
use crate::context::EngineContext;

/// A mutation the engine performed against the fake datacenter.  Builder
/// methods do not record ops; only calls through the collaborator traits
/// do.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    ImportImage(Uuid),
    CreateService(String),
    UpdateServiceImage(Uuid),
    CreateInstance(String),
    ReprovisionInstance(Uuid),
    CreateNic(Uuid),
}

#[derive(Default)]
struct State {
    services: Vec<Service>,
    instances: Vec<Instance>,
    vms: Vec<Vm>,
    networks: Vec<Network>,
    nics: Vec<Nic>,
    servers: Vec<Server>,
    local_images: Vec<Image>,
    remote_images: Vec<(String, Image)>,
    packages: Vec<Package>,
    boot_script: String,
    publish_counter: i64,
    ops: Vec<Op>,
    fail_nic_create: BTreeSet<Uuid>,
}

pub struct FakePlatform {
    state: Mutex<State>,
    pub local_server_id: Uuid,
}

impl FakePlatform {
    pub fn new() -> Arc<FakePlatform> {
        let local_server_id = Uuid::new_v4();
        let platform = FakePlatform {
            state: Mutex::new(State {
                boot_script: "#!/usr/bin/bash\nset -o errexit\n".to_string(),
                ..Default::default()
            }),
            local_server_id,
        };
        {
            let mut state = platform.state.lock().unwrap();
            state.servers.push(Server {
                id: local_server_id,
                hostname: "headnode".to_string(),
                setup: true,
            });
        }
        Arc::new(platform)
    }

    pub fn context(self: &Arc<Self>) -> EngineContext {
        let config = EngineConfig {
            default_channel: "release".to_string(),
            dns_domain: "dc1.example.com".to_string(),
            nic_concurrency: 5,
        };
        EngineContext::new(
            Logger::root(slog::Discard, o!()),
            ClientHandles {
                registry: self.clone(),
                compute: self.clone(),
                networks: self.clone(),
                servers: self.clone(),
                images: self.clone(),
                remote_images: self.clone(),
                packages: self.clone(),
            },
            &config,
            self.local_server_id,
        )
    }

    fn next_published_at(state: &mut State) -> DateTime<Utc> {
        state.publish_counter += 1;
        DateTime::from_timestamp(1_700_000_000 + state.publish_counter, 0)
            .unwrap()
    }

    // Fleet builders.  These describe pre-existing datacenter state and do
    // not show up in `ops()`.

    pub fn add_server(&self, hostname: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().servers.push(Server {
            id,
            hostname: hostname.to_string(),
            setup: true,
        });
        id
    }

    pub fn add_package(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().packages.push(Package {
            id,
            name: name.to_string(),
            active: true,
        });
        id
    }

    pub fn add_local_image(&self, name: &str, version: &str) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let id = Uuid::new_v4();
        let published_at = Self::next_published_at(&mut state);
        state.local_images.push(Image {
            id,
            name: name.to_string(),
            version: version.to_string(),
            published_at,
        });
        id
    }

    pub fn add_remote_image(
        &self,
        channel: &str,
        name: &str,
        version: &str,
    ) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let id = Uuid::new_v4();
        let published_at = Self::next_published_at(&mut state);
        state.remote_images.push((
            channel.to_string(),
            Image {
                id,
                name: name.to_string(),
                version: version.to_string(),
                published_at,
            },
        ));
        id
    }

    /// Copy a remote image into the local catalog out-of-band, as if some
    /// other actor imported it.
    pub fn import_remote(&self, id: Uuid) {
        let mut state = self.state.lock().unwrap();
        let image = state
            .remote_images
            .iter()
            .find(|(_, image)| image.id == id)
            .map(|(_, image)| image.clone())
            .expect("remote image exists");
        state.local_images.push(image);
    }

    pub fn add_service(&self, name: &str, image: Uuid, package: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().services.push(Service {
            id,
            name: name.to_string(),
            package,
            image,
            networks: Vec::new(),
            firewall_enabled: false,
            domain: format!("{}.dc1.example.com", name),
            boot_script: None,
        });
        id
    }

    pub fn add_instance(
        &self,
        service_id: Uuid,
        alias: &str,
        server_id: Uuid,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        state.instances.push(Instance {
            id,
            service_id,
            alias: alias.to_string(),
            server_id,
        });
        state.vms.push(Vm {
            id,
            alias: alias.to_string(),
            server_id,
            state: VmState::Running,
            ram_mib: 1024,
        });
        id
    }

    pub fn add_network(&self, name: &str, fabric: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().networks.push(Network {
            id,
            name: name.to_string(),
            fabric,
        });
        id
    }

    pub fn add_nic(&self, instance_id: Uuid, network_id: Uuid, primary: bool) {
        self.state.lock().unwrap().nics.push(Nic {
            id: Uuid::new_v4(),
            belongs_to: instance_id,
            network_id,
            primary,
            ip: None,
        });
    }

    pub fn fail_nic_create(&self, instance_id: Uuid) {
        self.state.lock().unwrap().fail_nic_create.insert(instance_id);
    }

    // Observers.

    pub fn ops(&self) -> Vec<Op> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn service_named(&self, name: &str) -> Option<Service> {
        self.state
            .lock()
            .unwrap()
            .services
            .iter()
            .find(|svc| svc.name == name)
            .cloned()
    }

    pub fn instances_of(&self, service_id: Uuid) -> Vec<Instance> {
        self.state
            .lock()
            .unwrap()
            .instances
            .iter()
            .filter(|inst| inst.service_id == service_id)
            .cloned()
            .collect()
    }

    pub fn nics_of(&self, instance_id: Uuid) -> Vec<Nic> {
        self.state
            .lock()
            .unwrap()
            .nics
            .iter()
            .filter(|nic| nic.belongs_to == instance_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ServiceRegistry for FakePlatform {
    async fn list_services(&self) -> Result<Vec<Service>, Error> {
        Ok(self.state.lock().unwrap().services.clone())
    }

    async fn get_service(&self, name: &str) -> Result<Option<Service>, Error> {
        Ok(self.service_named(name))
    }

    async fn create_service(
        &self,
        params: ServiceCreate,
    ) -> Result<Service, Error> {
        let mut state = self.state.lock().unwrap();
        let service = Service {
            id: Uuid::new_v4(),
            name: params.name.clone(),
            package: params.package,
            image: params.image,
            networks: params.networks,
            firewall_enabled: params.firewall_enabled,
            domain: params.domain,
            boot_script: params.boot_script,
        };
        state.ops.push(Op::CreateService(params.name));
        state.services.push(service.clone());
        Ok(service)
    }

    async fn update_service_image(
        &self,
        service_id: Uuid,
        image_id: Uuid,
    ) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        let Some(service) =
            state.services.iter_mut().find(|svc| svc.id == service_id)
        else {
            return Err(Error::collaborator(
                "service registry",
                format!("no service {}", service_id),
            ));
        };
        service.image = image_id;
        state.ops.push(Op::UpdateServiceImage(image_id));
        Ok(())
    }

    async fn list_instances(
        &self,
        service_id: Uuid,
    ) -> Result<Vec<Instance>, Error> {
        Ok(self.instances_of(service_id))
    }

    async fn create_instance(
        &self,
        params: InstanceCreate,
    ) -> Result<Instance, Error> {
        let instance = {
            let mut state = self.state.lock().unwrap();
            let id = Uuid::new_v4();
            let instance = Instance {
                id,
                service_id: params.service_id,
                alias: params.alias.clone(),
                server_id: params.server_id,
            };
            state.instances.push(instance.clone());
            state.vms.push(Vm {
                id,
                alias: params.alias.clone(),
                server_id: params.server_id,
                state: VmState::Running,
                ram_mib: 1024,
            });
            state.ops.push(Op::CreateInstance(params.alias));
            instance
        };
        Ok(instance)
    }

    async fn reprovision_instance(
        &self,
        instance_id: Uuid,
        _image_id: Uuid,
    ) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if !state.instances.iter().any(|inst| inst.id == instance_id) {
            return Err(Error::collaborator(
                "service registry",
                format!("no instance {}", instance_id),
            ));
        }
        state.ops.push(Op::ReprovisionInstance(instance_id));
        Ok(())
    }

    async fn boot_script_template(&self) -> Result<String, Error> {
        Ok(self.state.lock().unwrap().boot_script.clone())
    }
}

#[async_trait]
impl ComputeInventory for FakePlatform {
    async fn get_vm(&self, id: Uuid) -> Result<Option<Vm>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .vms
            .iter()
            .find(|vm| vm.id == id)
            .cloned())
    }
}

#[async_trait]
impl NetworkInventory for FakePlatform {
    async fn list_networks(
        &self,
        fabric: Option<bool>,
    ) -> Result<Vec<Network>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .networks
            .iter()
            .filter(|n| fabric.map_or(true, |f| n.fabric == f))
            .cloned()
            .collect())
    }

    async fn list_nics(&self, belongs_to: Uuid) -> Result<Vec<Nic>, Error> {
        Ok(self.nics_of(belongs_to))
    }

    async fn create_nic(&self, params: NicCreate) -> Result<Nic, Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_nic_create.contains(&params.belongs_to) {
            return Err(Error::collaborator(
                "network inventory",
                "no free IPs on network",
            ));
        }
        let nic = Nic {
            id: Uuid::new_v4(),
            belongs_to: params.belongs_to,
            network_id: params.network_id,
            primary: params.primary,
            ip: None,
        };
        state.nics.push(nic.clone());
        state.ops.push(Op::CreateNic(params.belongs_to));
        Ok(nic)
    }
}

#[async_trait]
impl ServerInventory for FakePlatform {
    async fn get_server(&self, id: Uuid) -> Result<Option<Server>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .servers
            .iter()
            .find(|server| server.id == id)
            .cloned())
    }

    async fn list_servers(
        &self,
        hostname: Option<&str>,
    ) -> Result<Vec<Server>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .servers
            .iter()
            .filter(|server| {
                hostname.map_or(true, |h| server.hostname == h)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ImageCatalog for FakePlatform {
    async fn get_image(&self, id: Uuid) -> Result<Option<Image>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .local_images
            .iter()
            .find(|image| image.id == id)
            .cloned())
    }

    async fn list_images(&self, name: &str) -> Result<Vec<Image>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .local_images
            .iter()
            .filter(|image| image.name == name)
            .cloned()
            .collect())
    }

    async fn import_image(
        &self,
        id: Uuid,
        channel: &str,
    ) -> Result<Image, Error> {
        let mut state = self.state.lock().unwrap();
        let Some(image) = state
            .remote_images
            .iter()
            .find(|(ch, image)| ch == channel && image.id == id)
            .map(|(_, image)| image.clone())
        else {
            return Err(Error::collaborator(
                "image catalog",
                format!("image {} not on channel \"{}\"", id, channel),
            ));
        };
        state.local_images.push(image.clone());
        state.ops.push(Op::ImportImage(id));
        Ok(image)
    }
}

#[async_trait]
impl RemoteImageCatalog for FakePlatform {
    async fn get_image(
        &self,
        channel: &str,
        id: Uuid,
    ) -> Result<Option<Image>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .remote_images
            .iter()
            .find(|(ch, image)| ch == channel && image.id == id)
            .map(|(_, image)| image.clone()))
    }

    async fn list_images(
        &self,
        channel: &str,
        name: &str,
    ) -> Result<Vec<Image>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .remote_images
            .iter()
            .filter(|(ch, image)| ch == channel && image.name == name)
            .map(|(_, image)| image.clone())
            .collect())
    }
}

#[async_trait]
impl PackageCatalog for FakePlatform {
    async fn list_packages(
        &self,
        name: &str,
        active_only: bool,
    ) -> Result<Vec<Package>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .packages
            .iter()
            .filter(|pkg| pkg.name == name && (!active_only || pkg.active))
            .cloned()
            .collect())
    }
}

/// Scripted confirmation UI that records what it was shown.
pub struct TestUi {
    answer: bool,
    summaries: Mutex<Vec<String>>,
    confirms: Mutex<Vec<String>>,
}

impl TestUi {
    pub fn new(answer: bool) -> TestUi {
        TestUi {
            answer,
            summaries: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
        }
    }

    pub fn summaries(&self) -> Vec<String> {
        self.summaries.lock().unwrap().clone()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.confirms.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperatorUi for TestUi {
    fn summary(&self, text: &str) {
        self.summaries.lock().unwrap().push(text.to_string());
    }

    async fn confirm(&self, text: &str) -> Result<bool, Error> {
        self.confirms.lock().unwrap().push(text.to_string());
        Ok(self.answer)
    }

    fn info(&self, _text: &str) {}
}

/// In-memory history store.
#[derive(Default)]
pub struct MemoryHistory {
    started: Mutex<Vec<RunRecord>>,
    finished: Mutex<Vec<RunRecord>>,
}

impl MemoryHistory {
    pub fn started(&self) -> Vec<RunRecord> {
        self.started.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<RunRecord> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn start(&self, record: &RunRecord) -> Result<(), Error> {
        self.started.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn finish(&self, record: &RunRecord) -> Result<(), Error> {
        self.finished.lock().unwrap().push(record.clone());
        Ok(())
    }
}

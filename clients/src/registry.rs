// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The service topology registry: the source of truth for which services
//! exist and which instances back them.

use async_trait::async_trait;
use uuid::Uuid;

use dcadm_common::Error;
use dcadm_common::types::Instance;
use dcadm_common::types::NicClass;
use dcadm_common::types::Service;

/// Parameters for creating a service record.
#[derive(Clone, Debug)]
pub struct ServiceCreate {
    pub name: String,
    pub package: Uuid,
    pub image: Uuid,
    pub networks: Vec<NicClass>,
    pub firewall_enabled: bool,
    pub domain: String,
    pub boot_script: Option<String>,
}

/// Parameters for creating an instance of a service.
#[derive(Clone, Debug)]
pub struct InstanceCreate {
    pub service_id: Uuid,
    pub alias: String,
    pub server_id: Uuid,
}

#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn list_services(&self) -> Result<Vec<Service>, Error>;

    async fn get_service(&self, name: &str) -> Result<Option<Service>, Error>;

    async fn create_service(
        &self,
        params: ServiceCreate,
    ) -> Result<Service, Error>;

    async fn update_service_image(
        &self,
        service_id: Uuid,
        image_id: Uuid,
    ) -> Result<(), Error>;

    async fn list_instances(
        &self,
        service_id: Uuid,
    ) -> Result<Vec<Instance>, Error>;

    async fn create_instance(
        &self,
        params: InstanceCreate,
    ) -> Result<Instance, Error>;

    /// Reprovision an existing instance onto a new image.  Used by the
    /// simple single-instance update procedures.
    async fn reprovision_instance(
        &self,
        instance_id: Uuid,
        image_id: Uuid,
    ) -> Result<(), Error>;

    /// The shared boot-script template applied to newly created services.
    async fn boot_script_template(&self) -> Result<String, Error>;
}

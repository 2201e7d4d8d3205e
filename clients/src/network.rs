// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The network inventory service: networks and per-instance attachments.

use async_trait::async_trait;
use uuid::Uuid;

use dcadm_common::Error;
use dcadm_common::types::Network;
use dcadm_common::types::Nic;

/// Parameters for provisioning a new network attachment.
#[derive(Clone, Debug)]
pub struct NicCreate {
    /// The instance the attachment belongs to.
    pub belongs_to: Uuid,
    pub network_id: Uuid,
    pub primary: bool,
}

#[async_trait]
pub trait NetworkInventory: Send + Sync {
    /// List networks, optionally filtered to fabric (`Some(true)`) or
    /// non-fabric (`Some(false)`) networks.
    async fn list_networks(
        &self,
        fabric: Option<bool>,
    ) -> Result<Vec<Network>, Error>;

    /// List the attachments belonging to one instance.
    async fn list_nics(&self, belongs_to: Uuid) -> Result<Vec<Nic>, Error>;

    async fn create_nic(&self, params: NicCreate) -> Result<Nic, Error>;
}

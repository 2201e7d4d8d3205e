// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The server inventory service.

use async_trait::async_trait;
use uuid::Uuid;

use dcadm_common::Error;
use dcadm_common::types::Server;

#[async_trait]
pub trait ServerInventory: Send + Sync {
    async fn get_server(&self, id: Uuid) -> Result<Option<Server>, Error>;

    /// List servers, optionally filtered by hostname.
    async fn list_servers(
        &self,
        hostname: Option<&str>,
    ) -> Result<Vec<Server>, Error>;
}

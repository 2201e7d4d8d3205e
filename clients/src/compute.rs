// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The compute/instance inventory service.

use async_trait::async_trait;
use uuid::Uuid;

use dcadm_common::Error;
use dcadm_common::types::Vm;

#[async_trait]
pub trait ComputeInventory: Send + Sync {
    async fn get_vm(&self, id: Uuid) -> Result<Option<Vm>, Error>;
}

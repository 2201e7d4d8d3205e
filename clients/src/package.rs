// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The billing/sizing package catalog.

use async_trait::async_trait;

use dcadm_common::Error;
use dcadm_common::types::Package;

#[async_trait]
pub trait PackageCatalog: Send + Sync {
    /// List packages matching a name, optionally restricted to active
    /// packages.
    async fn list_packages(
        &self,
        name: &str,
        active_only: bool,
    ) -> Result<Vec<Package>, Error>;
}

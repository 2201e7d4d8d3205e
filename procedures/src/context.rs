// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The explicit context value threaded into every `prepare` and `execute`
//! call: client handles for the remote collaborators plus the
//! datacenter-level settings the engine needs.  There is no ambient global
//! state.

use slog::Logger;
use std::sync::Arc;
use uuid::Uuid;

use dcadm_clients::ComputeInventory;
use dcadm_clients::ImageCatalog;
use dcadm_clients::NetworkInventory;
use dcadm_clients::PackageCatalog;
use dcadm_clients::RemoteImageCatalog;
use dcadm_clients::ServerInventory;
use dcadm_clients::ServiceRegistry;
use dcadm_common::config::EngineConfig;

pub struct EngineContext {
    pub log: Logger,

    pub registry: Arc<dyn ServiceRegistry>,
    pub compute: Arc<dyn ComputeInventory>,
    pub networks: Arc<dyn NetworkInventory>,
    pub servers: Arc<dyn ServerInventory>,
    pub images: Arc<dyn ImageCatalog>,
    pub remote_images: Arc<dyn RemoteImageCatalog>,
    pub packages: Arc<dyn PackageCatalog>,

    /// Image channel used when a procedure's configuration does not name
    /// one.
    pub default_channel: String,
    /// DNS domain for generated service domains.
    pub dns_domain: String,
    /// The server executing this invocation.  Procedures that place new
    /// instances with no explicit target place them here.
    pub local_server_id: Uuid,
    /// Fan-out cap for per-instance NIC checks and provisioning.
    pub nic_concurrency: usize,
}

/// The collaborator handles an [`EngineContext`] is built from.
pub struct ClientHandles {
    pub registry: Arc<dyn ServiceRegistry>,
    pub compute: Arc<dyn ComputeInventory>,
    pub networks: Arc<dyn NetworkInventory>,
    pub servers: Arc<dyn ServerInventory>,
    pub images: Arc<dyn ImageCatalog>,
    pub remote_images: Arc<dyn RemoteImageCatalog>,
    pub packages: Arc<dyn PackageCatalog>,
}

impl EngineContext {
    pub fn new(
        log: Logger,
        clients: ClientHandles,
        config: &EngineConfig,
        local_server_id: Uuid,
    ) -> EngineContext {
        EngineContext {
            log,
            registry: clients.registry,
            compute: clients.compute,
            networks: clients.networks,
            servers: clients.servers,
            images: clients.images,
            remote_images: clients.remote_images,
            packages: clients.packages,
            default_channel: config.default_channel.clone(),
            dns_domain: config.dns_domain.clone(),
            local_server_id,
            nic_concurrency: config.nic_concurrency,
        }
    }
}

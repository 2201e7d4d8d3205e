// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Trait contracts for the remote collaborators the procedure engine
//! drives: the service topology registry, compute inventory, network
//! inventory, server inventory, image catalogs, and package catalog, plus
//! the operator-facing confirmation UI and the durable run-history store.
//!
//! The engine treats all of these as opaque: it sees already-deserialized
//! structured records and never a wire format.  Concrete implementations
//! (HTTP clients against the real services, or in-memory fakes for tests)
//! live with their callers.

pub mod compute;
pub mod history;
pub mod image;
pub mod network;
pub mod package;
pub mod registry;
pub mod server;
pub mod ui;

pub use compute::ComputeInventory;
pub use history::HistoryStore;
pub use image::ImageCatalog;
pub use image::RemoteImageCatalog;
pub use network::NetworkInventory;
pub use network::NicCreate;
pub use package::PackageCatalog;
pub use registry::InstanceCreate;
pub use registry::ServiceCreate;
pub use registry::ServiceRegistry;
pub use server::ServerInventory;
pub use ui::OperatorUi;

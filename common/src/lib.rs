// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Types shared across the dcadm workspace: the control-plane data model,
//! the engine's error taxonomy, engine configuration, and run-history
//! records.
//!
//! Nothing here talks to the network.  The remote collaborator contracts
//! built on these types live in `dcadm-clients`, and the procedure engine
//! itself lives in `dcadm-procedures`.

pub mod config;
pub mod error;
pub mod history;
pub mod plan;
pub mod types;

pub use error::Error;
pub use error::LookupType;
pub use error::ResourceType;
pub use error::merge_error_list;

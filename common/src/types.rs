// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The control-plane data model: services, instances, and the records the
//! engine reads from (and writes through) the remote collaborators.
//!
//! These are already-deserialized structured records; wire formats are the
//! concern of the individual client implementations.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use std::net::IpAddr;
use uuid::Uuid;

/// A named, independently versioned component of the platform, as recorded
/// in the service topology registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    /// Billing/sizing package backing each instance of this service.
    pub package: Uuid,
    /// The image instances of this service are provisioned from.
    pub image: Uuid,
    /// Network attachments every instance of this service gets at
    /// provision time.
    pub networks: Vec<NicClass>,
    pub firewall_enabled: bool,
    /// Generated DNS name for the service (`<name>.<dns_domain>`).
    pub domain: String,
    pub boot_script: Option<String>,
}

/// One provisioned compute unit backing a service, as recorded in the
/// topology registry.  The instance id doubles as the compute-side VM id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: Uuid,
    pub service_id: Uuid,
    pub alias: String,
    pub server_id: Uuid,
}

/// The compute-inventory record backing an instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vm {
    pub id: Uuid,
    pub alias: String,
    pub server_id: Uuid,
    pub state: VmState,
    pub ram_mib: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmState {
    Provisioning,
    Running,
    Stopped,
    Failed,
}

/// The closed set of network roles an instance's attachment can serve.
/// The non-fabric network whose name equals a class's canonical string is
/// the network of that class.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NicClass {
    Admin,
    External,
    Manta,
}

/// A network known to the network inventory service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: Uuid,
    pub name: String,
    pub fabric: bool,
}

/// A network attachment belonging to an instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Nic {
    pub id: Uuid,
    /// The instance this attachment belongs to.
    pub belongs_to: Uuid,
    pub network_id: Uuid,
    pub primary: bool,
    pub ip: Option<IpAddr>,
}

/// A physical server in the server inventory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: Uuid,
    pub hostname: String,
    pub setup: bool,
}

/// An image record from the local or remote catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub published_at: DateTime<Utc>,
}

/// Which catalog an image record was resolved from.  Resolving from the
/// remote catalog means the image bytes still need to be downloaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Local,
    Remote,
}

/// A billing/sizing package from the package catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

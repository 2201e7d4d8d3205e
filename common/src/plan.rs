// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Update plans: the desired-state changes produced by diffing desired
//! vs. current topology, and the current instance topology they apply to.

use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::types::Instance;

/// One desired mutation in an update plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub kind: ChangeKind,
    /// Name of the target service.
    pub service: String,
    /// Target image, for changes that move a service to a new image.
    pub image: Option<Uuid>,
    /// Target instance, for instance-scoped changes.
    pub instance: Option<Uuid>,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ChangeKind {
    AddInstance,
    UpdateService,
    UpdateInstance,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} service \"{}\"", self.kind, self.service)?;
        if let Some(image) = &self.image {
            write!(f, " to image {}", image)?;
        }
        if let Some(instance) = &self.instance {
            write!(f, " (instance {})", instance)?;
        }
        Ok(())
    }
}

/// A flat list of desired changes plus the current fleet topology they were
/// computed against, instances grouped by service name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdatePlan {
    pub changes: Vec<Change>,
    pub topology: BTreeMap<String, Vec<Instance>>,
}

impl UpdatePlan {
    pub fn instances_of(&self, service: &str) -> &[Instance] {
        self.topology.get(service).map(Vec::as_slice).unwrap_or(&[])
    }
}

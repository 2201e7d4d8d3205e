// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration, loaded from a TOML file by command front-ends.

use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use serde::Serialize;

/// Datacenter-level settings the engine needs beyond its client handles.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Image channel used when a command does not name one explicitly.
    pub default_channel: String,
    /// DNS domain under which generated service domains are created.
    pub dns_domain: String,
    /// Fan-out cap for per-instance NIC checks and provisioning.
    #[serde(default = "default_nic_concurrency")]
    pub nic_concurrency: usize,
}

fn default_nic_concurrency() -> usize {
    5
}

impl EngineConfig {
    pub fn from_file(path: &Utf8Path) -> Result<EngineConfig, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            LoadError::Io { path: path.to_owned(), err }
        })?;
        toml::from_str(&contents)
            .map_err(|err| LoadError::Parse { path: path.to_owned(), err })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("error reading \"{path}\"")]
    Io {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("error parsing \"{path}\"")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        err: toml::de::Error,
    },
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run-history records.  The durable store itself is an external
//! collaborator (see `dcadm_clients::history`); the engine only appends and
//! updates these records around the execute phase of a run.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::plan::Change;

/// Append-only record of one command invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    /// The changes this run attempted.
    pub changes: Vec<Change>,
    pub started: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
    /// Terminal error, if the run stopped at a failing procedure.
    pub error: Option<String>,
}

impl RunRecord {
    pub fn new(changes: Vec<Change>) -> RunRecord {
        RunRecord {
            id: Uuid::new_v4(),
            changes,
            started: Utc::now(),
            finished: None,
            error: None,
        }
    }
}

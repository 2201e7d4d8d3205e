// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The durable run-history store.

use async_trait::async_trait;

use dcadm_common::Error;
use dcadm_common::history::RunRecord;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a record for a run whose execute phase is starting.
    async fn start(&self, record: &RunRecord) -> Result<(), Error>;

    /// Update the record with the run's finish time and terminal error.
    async fn finish(&self, record: &RunRecord) -> Result<(), Error>;
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The operator-facing confirmation and progress renderer.  Command
//! front-ends supply a terminal implementation; tests supply a scripted
//! one.

use async_trait::async_trait;

use dcadm_common::Error;

#[async_trait]
pub trait OperatorUi: Send + Sync {
    /// Present the combined summary of the work a run is about to perform.
    fn summary(&self, text: &str);

    /// Ask the operator to confirm the presented work.  Returning
    /// `Ok(false)` is a normal decline, not an error.
    async fn confirm(&self, text: &str) -> Result<bool, Error>;

    /// Informational progress output.
    fn info(&self, text: &str);
}

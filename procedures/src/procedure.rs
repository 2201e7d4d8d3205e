// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Procedure contract.
//!
//! A procedure is a stateful, single-use unit of orchestration.  Its life
//! cycle is: constructed → prepared (possibly reporting nothing to do) →
//! summarized → executed → discarded.  `prepare` gathers remote state and
//! decides viability and necessity; `summarize` renders that decision with
//! no further remote calls; `execute` performs the mutations, each step
//! itself an idempotent "create if missing / update if different" check so
//! that re-running after a partial failure is safe.

use async_trait::async_trait;

use dcadm_common::Error;
use dcadm_common::plan::Change;

use crate::context::EngineContext;

/// What `prepare` concluded about the work ahead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// There is work for `execute` to perform.
    HasWork,
    /// The desired outcome already holds; the runner will skip this
    /// procedure's summary and `execute` entirely.
    NothingToDo,
}

impl PrepareOutcome {
    pub fn nothing_to_do(&self) -> bool {
        matches!(self, PrepareOutcome::NothingToDo)
    }
}

#[async_trait]
pub trait Procedure: Send {
    /// Gather all remote state needed to decide whether this operation is
    /// viable and whether it has already been satisfied.  Must be safe to
    /// call against a system in any valid current state, including one
    /// where a prior interrupted run completed part of the work.
    async fn prepare(
        &mut self,
        cx: &EngineContext,
    ) -> Result<PrepareOutcome, Error>;

    /// A human-readable bullet list of the work `execute` will perform,
    /// derived purely from the state captured in `prepare`.  Never makes
    /// remote calls.
    fn summarize(&self) -> String;

    /// Perform the mutations implied by the summary, in the order
    /// correctness requires.  Must only be called after a successful
    /// `prepare`.
    async fn execute(&mut self, cx: &EngineContext) -> Result<(), Error>;

    /// The plan changes this procedure was seeded with, if any, for
    /// history recording.  Procedures constructed directly (rather than by
    /// the plan coordinator) typically have none.
    fn changes(&self) -> &[Change] {
        &[]
    }
}

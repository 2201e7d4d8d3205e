// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The dcadm procedure engine.
//!
//! A command assembles an ordered list of [`Procedure`]s (directly, or via
//! [`coordinate_plan`]) and hands them to [`run_procs`], which drives each
//! through the prepare / summarize / confirm / execute life cycle for one
//! invocation.  Procedures re-derive "what remains to be done" from current
//! remote state in `prepare`, so an interrupted run is recovered by simply
//! re-running the same command.
//!
//! Ordering within the list is a correctness mechanism: `prepare` and
//! `execute` both walk the list sequentially, so a later procedure can rely
//! on an earlier one's mutations (see the `volatile` flag on
//! [`EnsureNicOnInstancesProcedure`]).

mod add_service;
mod context;
mod coordinator;
mod download_images;
mod ensure_nic;
mod procedure;
mod runner;
#[cfg(test)]
mod test_utils;
mod update_service;

pub use add_service::AddServiceConfig;
pub use add_service::AddServiceProcedure;
pub use add_service::ImageSelector;
pub use add_service::ServerSelector;
pub use context::ClientHandles;
pub use context::EngineContext;
pub use coordinator::CoordinateOptions;
pub use coordinator::EARLY_UPDATE_SERVICES;
pub use coordinator::coordinate_plan;
pub use download_images::DownloadImagesProcedure;
pub use ensure_nic::EnsureNicConfig;
pub use ensure_nic::EnsureNicOnInstancesProcedure;
pub use procedure::PrepareOutcome;
pub use procedure::Procedure;
pub use runner::RunArgs;
pub use runner::RunOutcome;
pub use runner::run_procs;
pub use update_service::UpdateSingleInstanceProcedure;

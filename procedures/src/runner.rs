// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drive an ordered list of procedures through one invocation's life
//! cycle: prepare everything, present a combined summary, confirm, then
//! execute.
//!
//! Both phases walk the list sequentially, in order.  That ordering is a
//! correctness mechanism, not an optimization: later procedures may depend
//! on remote state produced by earlier ones, and a `volatile` procedure's
//! deferred lookup must observe every earlier procedure's mutations.

use slog::error;
use slog::info;
use slog_error_chain::InlineErrorChain;

use chrono::Utc;
use dcadm_clients::HistoryStore;
use dcadm_clients::OperatorUi;
use dcadm_common::Error;
use dcadm_common::history::RunRecord;
use dcadm_common::plan::Change;

use crate::context::EngineContext;
use crate::procedure::Procedure;

/// Arguments for [`run_procs`].
pub struct RunArgs<'a> {
    pub cx: &'a EngineContext,
    pub ui: &'a dyn OperatorUi,
    /// Durable run history; `None` for callers that keep none (e.g.
    /// read-only tooling).
    pub history: Option<&'a dyn HistoryStore>,
    /// Skip the confirmation prompt.
    pub skip_confirm: bool,
    /// Stop after the summary; execute nothing.
    pub dry_run: bool,
}

/// How a run concluded.  Everything here is a successful exit: failures
/// propagate as errors instead.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use = "callers report the outcome of a run to the operator"]
pub enum RunOutcome {
    /// Every procedure reported nothing to do; no prompt was shown.
    NothingToDo,
    /// The operator declined the confirmation prompt.  Nothing was
    /// mutated and no history was recorded; this is a clean abort, not an
    /// error.
    Declined,
    /// Dry run: the summary was presented and nothing was executed.
    DryRun,
    /// All non-trivial procedures executed.
    Executed { executed: usize },
}

/// Run each procedure through prepare, one combined summary/confirmation,
/// and execute.
///
/// `prepare` failures abort before anything is mutated.  `execute`
/// failures abort the remaining procedures but never roll back completed
/// ones: the engine is forward-only, and recovery is re-running the same
/// command, relying on each procedure's idempotent recomputation of what
/// remains.
pub async fn run_procs(
    args: RunArgs<'_>,
    procs: &mut [Box<dyn Procedure>],
) -> Result<RunOutcome, Error> {
    let RunArgs { cx, ui, history, skip_confirm, dry_run } = args;

    let mut has_work = vec![false; procs.len()];
    for (i, proc) in procs.iter_mut().enumerate() {
        has_work[i] = !proc.prepare(cx).await?.nothing_to_do();
    }

    if !has_work.iter().any(|w| *w) {
        info!(cx.log, "all procedures report nothing to do");
        ui.info("Nothing to do.");
        return Ok(RunOutcome::NothingToDo);
    }

    let mut summary = String::new();
    for (i, proc) in procs.iter().enumerate() {
        if has_work[i] {
            summary.push_str(&proc.summarize());
        }
    }
    ui.summary(&summary);

    if !skip_confirm && !dry_run {
        if !ui.confirm(&summary).await? {
            info!(cx.log, "operator declined; aborting");
            return Ok(RunOutcome::Declined);
        }
    }
    if dry_run {
        info!(cx.log, "dry run; stopping before execute");
        return Ok(RunOutcome::DryRun);
    }

    let changes: Vec<Change> = procs
        .iter()
        .enumerate()
        .filter(|(i, _)| has_work[*i])
        .flat_map(|(_, proc)| proc.changes().iter().cloned())
        .collect();
    let mut record = RunRecord::new(changes);
    if let Some(history) = history {
        history.start(&record).await?;
    }

    let mut executed = 0;
    let mut terminal: Option<Error> = None;
    for (i, proc) in procs.iter_mut().enumerate() {
        if !has_work[i] {
            continue;
        }
        match proc.execute(cx).await {
            Ok(()) => executed += 1,
            Err(err) => {
                error!(
                    cx.log,
                    "procedure failed; aborting remaining procedures";
                    "error" => %InlineErrorChain::new(&err),
                );
                terminal = Some(err);
                break;
            }
        }
    }

    if let Some(history) = history {
        record.finished = Some(Utc::now());
        record.error = terminal.as_ref().map(|err| err.to_string());
        if let Err(err) = history.finish(&record).await {
            error!(
                cx.log,
                "failed to update run history";
                "error" => %InlineErrorChain::new(&err),
            );
            // A history failure only surfaces when it is the sole failure;
            // it must not mask the terminal procedure error.
            if terminal.is_none() {
                terminal = Some(err);
            }
        }
    }

    match terminal {
        Some(err) => Err(err),
        None => Ok(RunOutcome::Executed { executed }),
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Partition an update plan's changes into procedures.
//!
//! Partitioning runs as a fixed, ordered sequence of passes.  The first
//! computes image-download needs; the rest claim `update-service` changes,
//! early-update services first, then a catch-all.  A claiming pass only
//! takes a change whose service has exactly one instance, running on the
//! host executing this command: the simple update procedure knows nothing
//! about coordinating multi-instance rollouts, and refusing the claim here
//! is what keeps it from ever seeing one.
//!
//! Any change left unclaimed after all passes fails the whole coordination:
//! the engine never silently ignores a requested change it does not know
//! how to perform.

use slog::info;
use swrite::SWrite;
use swrite::swriteln;
use uuid::Uuid;

use dcadm_common::Error;
use dcadm_common::plan::Change;
use dcadm_common::plan::ChangeKind;
use dcadm_common::plan::UpdatePlan;

use crate::context::EngineContext;
use crate::download_images::DownloadImagesProcedure;
use crate::procedure::Procedure;
use crate::update_service::UpdateSingleInstanceProcedure;

/// Services other services depend on at runtime; they update before the
/// general population, each in its own procedure, in this order.
pub const EARLY_UPDATE_SERVICES: &[&str] = &["binder", "manatee", "moray"];

#[derive(Clone, Copy, Debug, Default)]
pub struct CoordinateOptions {
    /// Retain only the image-download procedure: the caller wants to
    /// pre-fetch images without changing any service.
    pub images_only: bool,
}

/// Partition `plan`'s changes into procedures ready for [`run_procs`].
///
/// [`run_procs`]: crate::run_procs
pub async fn coordinate_plan(
    cx: &EngineContext,
    plan: &UpdatePlan,
    options: CoordinateOptions,
) -> Result<Vec<Box<dyn Procedure>>, Error> {
    let mut procs: Vec<Box<dyn Procedure>> = Vec::new();

    // Pass 1: images referenced by any change and absent from the local
    // catalog.  This pass claims no changes; the update passes still need
    // them.
    let mut referenced: Vec<Uuid> = plan
        .changes
        .iter()
        .filter_map(|change| change.image)
        .collect();
    referenced.sort_unstable();
    referenced.dedup();
    let mut to_download = Vec::new();
    for image_id in referenced {
        if cx.images.get_image(image_id).await?.is_none() {
            to_download.push(image_id);
        }
    }
    let downloads_added = !to_download.is_empty();
    if downloads_added {
        procs.push(Box::new(DownloadImagesProcedure::new(to_download)));
    }

    let mut remaining: Vec<Change> = plan.changes.clone();

    // Passes 2..: one per early-update service, then the catch-all.
    for service in EARLY_UPDATE_SERVICES {
        let claimed = claim_simple_updates(&mut remaining, plan, cx, |name| {
            name == *service
        });
        if !claimed.is_empty() {
            procs.push(Box::new(UpdateSingleInstanceProcedure::new(claimed)));
        }
    }
    let claimed = claim_simple_updates(&mut remaining, plan, cx, |_| true);
    if !claimed.is_empty() {
        procs.push(Box::new(UpdateSingleInstanceProcedure::new(claimed)));
    }

    if !remaining.is_empty() {
        let mut message = format!(
            "update plan contains {} change(s) this command does not know \
             how to execute:",
            remaining.len()
        );
        for change in &remaining {
            swriteln!(message, "");
            message.push_str("    ");
            message.push_str(&change.to_string());
        }
        return Err(Error::validation(message));
    }

    info!(
        cx.log,
        "coordinated update plan";
        "changes" => plan.changes.len(),
        "procedures" => procs.len(),
        "downloads_added" => downloads_added,
    );

    if options.images_only {
        procs.truncate(if downloads_added { 1 } else { 0 });
    }
    Ok(procs)
}

/// Remove and return every `update-service` change matching `filter` whose
/// service meets the single-local-instance precondition.
fn claim_simple_updates(
    remaining: &mut Vec<Change>,
    plan: &UpdatePlan,
    cx: &EngineContext,
    filter: impl Fn(&str) -> bool,
) -> Vec<Change> {
    let mut claimed = Vec::new();
    let mut keep = Vec::new();
    for change in remaining.drain(..) {
        let eligible = change.kind == ChangeKind::UpdateService
            && filter(&change.service)
            && single_local_instance(plan, &change.service, cx.local_server_id);
        if eligible {
            claimed.push(change);
        } else {
            keep.push(change);
        }
    }
    *remaining = keep;
    claimed
}

fn single_local_instance(
    plan: &UpdatePlan,
    service: &str,
    server_id: Uuid,
) -> bool {
    match plan.instances_of(service) {
        [only] => only.server_id == server_id,
        _ => false,
    }
}

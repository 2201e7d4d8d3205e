// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The simple per-topology update variant: move a service with exactly one
//! instance, running on the host executing this command, to a new image.
//!
//! Highly-available services need more careful coordination than this
//! procedure provides; the plan coordinator only hands it changes whose
//! topology meets the single-local-instance precondition, and `prepare`
//! re-verifies that against live state.

use async_trait::async_trait;
use slog::info;
use slog::o;
use swrite::SWrite;
use swrite::swriteln;

use dcadm_common::Error;
use dcadm_common::LookupType;
use dcadm_common::ResourceType;
use dcadm_common::plan::Change;
use dcadm_common::types::Image;
use dcadm_common::types::Instance;
use dcadm_common::types::Service;

use crate::context::EngineContext;
use crate::procedure::PrepareOutcome;
use crate::procedure::Procedure;

pub struct UpdateSingleInstanceProcedure {
    changes: Vec<Change>,
    prepared: Option<Vec<PlannedUpdate>>,
}

/// One service update this procedure will perform.
struct PlannedUpdate {
    service: Service,
    instance: Instance,
    image: Image,
}

impl UpdateSingleInstanceProcedure {
    pub fn new(changes: Vec<Change>) -> UpdateSingleInstanceProcedure {
        UpdateSingleInstanceProcedure { changes, prepared: None }
    }
}

#[async_trait]
impl Procedure for UpdateSingleInstanceProcedure {
    async fn prepare(
        &mut self,
        cx: &EngineContext,
    ) -> Result<PrepareOutcome, Error> {
        let log = cx.log.new(o!("procedure" => "update-service"));
        let mut planned = Vec::new();

        for change in &self.changes {
            let image_id = change.image.ok_or_else(|| {
                Error::internal(format!(
                    "coordinator claimed a change with no target image: {}",
                    change
                ))
            })?;
            let service = cx
                .registry
                .get_service(&change.service)
                .await?
                .ok_or_else(|| {
                    LookupType::ByName(change.service.clone())
                        .into_not_found(ResourceType::Service)
                })?;
            if service.image == image_id {
                // Already updated, possibly by a prior interrupted run.
                continue;
            }
            let instances = cx.registry.list_instances(service.id).await?;
            if instances.len() != 1 {
                return Err(Error::validation(format!(
                    "service \"{}\" has {} instances; only single-instance \
                     services can be updated this way",
                    change.service,
                    instances.len()
                )));
            }
            let instance = instances.into_iter().next().ok_or_else(|| {
                Error::internal("instance list changed length")
            })?;

            // The image record may still be remote-only here: a download
            // procedure earlier in this run imports it before our execute
            // runs.
            let image = match cx.images.get_image(image_id).await? {
                Some(image) => image,
                None => cx
                    .remote_images
                    .get_image(&cx.default_channel, image_id)
                    .await?
                    .ok_or_else(|| {
                        LookupType::ById(image_id)
                            .into_not_found(ResourceType::Image)
                    })?,
            };
            planned.push(PlannedUpdate { service, instance, image });
        }

        info!(log, "prepared service updates"; "count" => planned.len());
        let outcome = if planned.is_empty() {
            PrepareOutcome::NothingToDo
        } else {
            PrepareOutcome::HasWork
        };
        self.prepared = Some(planned);
        Ok(outcome)
    }

    fn summarize(&self) -> String {
        let Some(planned) = &self.prepared else {
            return String::new();
        };
        let mut out = String::new();
        for update in planned {
            swriteln!(
                out,
                "- update service \"{}\" to image {}@{} (reprovision \
                 instance \"{}\")",
                update.service.name,
                update.image.name,
                update.image.version,
                update.instance.alias
            );
        }
        out
    }

    async fn execute(&mut self, cx: &EngineContext) -> Result<(), Error> {
        let log = cx.log.new(o!("procedure" => "update-service"));
        let planned = self.prepared.as_ref().ok_or_else(|| {
            Error::internal(
                "UpdateSingleInstanceProcedure executed before prepare",
            )
        })?;

        for update in planned {
            // Update the registry's image reference first so that a crash
            // between the two steps leaves the registry ahead of the
            // instance, which a re-run recovers, rather than behind it.
            info!(
                log,
                "updating service";
                "service" => &update.service.name,
                "image_id" => %update.image.id,
            );
            cx.registry
                .update_service_image(update.service.id, update.image.id)
                .await?;
            cx.registry
                .reprovision_instance(update.instance.id, update.image.id)
                .await?;
        }
        Ok(())
    }

    fn changes(&self) -> &[Change] {
        &self.changes
    }
}

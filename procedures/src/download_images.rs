// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pre-fetch the images an update plan references into the local catalog.
//!
//! The plan coordinator seeds this procedure with the distinct image ids no
//! pass found locally; `prepare` re-checks the local catalog (an earlier
//! run may have completed some downloads) and resolves the remainder
//! against the remote catalog.  Imports run sequentially and fail fast:
//! unlike per-instance NIC provisioning, later procedures in the run need
//! every one of these images, so there is no value in continuing past a
//! failed download.

use async_trait::async_trait;
use slog::info;
use slog::o;
use swrite::SWrite;
use swrite::swriteln;
use uuid::Uuid;

use dcadm_common::Error;
use dcadm_common::types::Image;

use crate::context::EngineContext;
use crate::procedure::PrepareOutcome;
use crate::procedure::Procedure;

pub struct DownloadImagesProcedure {
    image_ids: Vec<Uuid>,
    channel: Option<String>,
    /// Still-missing images resolved from the remote catalog, plus the
    /// channel they resolve on.
    prepared: Option<(String, Vec<Image>)>,
}

impl DownloadImagesProcedure {
    pub fn new(image_ids: Vec<Uuid>) -> DownloadImagesProcedure {
        DownloadImagesProcedure { image_ids, channel: None, prepared: None }
    }

    pub fn with_channel(mut self, channel: String) -> DownloadImagesProcedure {
        self.channel = Some(channel);
        self
    }
}

#[async_trait]
impl Procedure for DownloadImagesProcedure {
    async fn prepare(
        &mut self,
        cx: &EngineContext,
    ) -> Result<PrepareOutcome, Error> {
        let log = cx.log.new(o!("procedure" => "download-images"));
        let channel = self
            .channel
            .clone()
            .unwrap_or_else(|| cx.default_channel.clone());

        let mut missing = Vec::new();
        for id in &self.image_ids {
            if cx.images.get_image(*id).await?.is_some() {
                continue;
            }
            let image = cx
                .remote_images
                .get_image(&channel, *id)
                .await?
                .ok_or_else(|| {
                    Error::validation(format!(
                        "image {} not found on channel \"{}\"",
                        id, channel
                    ))
                })?;
            missing.push(image);
        }

        info!(
            log,
            "checked local catalog";
            "requested" => self.image_ids.len(),
            "to_download" => missing.len(),
        );
        let outcome = if missing.is_empty() {
            PrepareOutcome::NothingToDo
        } else {
            PrepareOutcome::HasWork
        };
        self.prepared = Some((channel, missing));
        Ok(outcome)
    }

    fn summarize(&self) -> String {
        let Some((channel, missing)) = &self.prepared else {
            return String::new();
        };
        let mut out = String::new();
        for image in missing {
            swriteln!(
                out,
                "- download image {} ({}@{}) from channel \"{}\"",
                image.id,
                image.name,
                image.version,
                channel
            );
        }
        out
    }

    async fn execute(&mut self, cx: &EngineContext) -> Result<(), Error> {
        let log = cx.log.new(o!("procedure" => "download-images"));
        let (channel, missing) = self.prepared.as_ref().ok_or_else(|| {
            Error::internal("DownloadImagesProcedure executed before prepare")
        })?;

        for image in missing {
            // A prior interrupted run may have gotten this far already.
            if cx.images.get_image(image.id).await?.is_some() {
                continue;
            }
            info!(
                log,
                "importing image";
                "image_id" => %image.id,
                "name" => &image.name,
                "version" => &image.version,
            );
            cx.images.import_image(image.id, channel).await?;
        }
        Ok(())
    }
}

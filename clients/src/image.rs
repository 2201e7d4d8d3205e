// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The image catalogs: the datacenter-local catalog and the channel-scoped
//! remote catalog images are downloaded from.

use async_trait::async_trait;
use uuid::Uuid;

use dcadm_common::Error;
use dcadm_common::types::Image;

/// The datacenter-local image catalog.
#[async_trait]
pub trait ImageCatalog: Send + Sync {
    async fn get_image(&self, id: Uuid) -> Result<Option<Image>, Error>;

    /// List local images of the given name.
    async fn list_images(&self, name: &str) -> Result<Vec<Image>, Error>;

    /// Import an image from the named remote channel into the local
    /// catalog.  The byte transfer itself is the collaborator's concern.
    async fn import_image(
        &self,
        id: Uuid,
        channel: &str,
    ) -> Result<Image, Error>;
}

/// The remote, channel-scoped image catalog.
#[async_trait]
pub trait RemoteImageCatalog: Send + Sync {
    async fn get_image(
        &self,
        channel: &str,
        id: Uuid,
    ) -> Result<Option<Image>, Error>;

    async fn list_images(
        &self,
        channel: &str,
        name: &str,
    ) -> Result<Vec<Image>, Error>;
}

use std::sync::Arc;

use crate::decode::TextureMeta;
use crate::error::LoadError;
use crate::resource::ResourceData;

/// Opaque GPU-side handle for an allocated texture slot. Copies are handed
/// to the upload task; ownership for release purposes lives with the
/// [`TextureResource`] installed into the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHandle(pub u64);

/// Parameters the uploader thread exposes to a queued task.
pub trait GpuUploadContext {
    fn upload_texture(
        &mut self,
        descriptor: DescriptorHandle,
        meta: &TextureMeta,
        data: &[u8],
    ) -> Result<(), LoadError>;
}

pub type UploadTask = Box<dyn FnOnce(&mut dyn GpuUploadContext) + Send>;

/// The renderer surface this subsystem consumes. Descriptor pools are
/// externally synchronized; upload tasks run on the uploader thread at low
/// priority.
pub trait GpuBackend: Send + Sync {
    fn allocate_texture_descriptor(&self) -> Option<DescriptorHandle>;

    fn allocate_cube_texture_descriptor(&self) -> Option<DescriptorHandle>;

    fn free_texture_descriptor(
        &self,
        descriptor: DescriptorHandle,
        cubemap: bool,
    );

    fn enqueue_low_priority_upload(
        &self,
        task: UploadTask,
    );

    /// Pushes any staged geometry buffers to the device. Called by the
    /// manager when the last active job retires.
    fn flush_geometry_staging(&self);
}

/// Installed payload for a texture slot: the descriptor plus the header the
/// slot was decoded from. Returns the descriptor to its pool on drop.
pub struct TextureResource {
    descriptor: DescriptorHandle,
    meta: TextureMeta,
    gpu: Arc<dyn GpuBackend>,
}

impl TextureResource {
    pub fn new(
        descriptor: DescriptorHandle,
        meta: TextureMeta,
        gpu: Arc<dyn GpuBackend>,
    ) -> Self {
        TextureResource {
            descriptor,
            meta,
            gpu,
        }
    }

    pub fn descriptor(&self) -> DescriptorHandle {
        self.descriptor
    }

    pub fn meta(&self) -> &TextureMeta {
        &self.meta
    }
}

impl ResourceData for TextureResource {}

impl Drop for TextureResource {
    fn drop(&mut self) {
        self.gpu
            .free_texture_descriptor(self.descriptor, self.meta.cubemap);
    }
}

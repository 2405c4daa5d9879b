use std::sync::Arc;

use crossbeam_channel::Sender;
use soulstudio_base::ResourceKind;

use crate::decode::TextureContainerReader;
use crate::error::LoadError;
use crate::gpu::{GpuBackend, GpuUploadContext, TextureResource};
use crate::job::{JobCounters, JobFailure};
use crate::pool::WorkerPool;
use crate::request::{ContainerSource, ExpandContainerRequest, LoadReply, TextureSlotRequest};
use crate::resource::ResourcePayload;

/// The texture side of a job: container expansion fanning out into the
/// bounded slot loader. Containers multiply into one request per slot, so
/// the expansion stage bumps the job estimate by slot count and the slot
/// loader is what actually publishes replies.
pub(crate) struct TexturePipeline {
    expand_stage: WorkerPool<ExpandContainerRequest>,
    slot_stage: WorkerPool<TextureSlotRequest>,
}

impl TexturePipeline {
    pub fn new(
        expand_width: usize,
        slot_width: usize,
        textures_enabled: bool,
        strict_resource_checking: bool,
        reader: Arc<dyn TextureContainerReader>,
        gpu: Arc<dyn GpuBackend>,
        counters: Arc<JobCounters>,
        failure: Arc<JobFailure>,
        reply_tx: Sender<LoadReply>,
    ) -> Self {
        let slot_stage = {
            let reader = reader.clone();
            let gpu = gpu.clone();
            let failure = failure.clone();
            WorkerPool::new(
                "Texture Slot Loader",
                slot_width,
                Arc::new(move |request: TextureSlotRequest| {
                    profiling::scope!("load_texture_slot");
                    if failure.is_failed() {
                        return;
                    }

                    let slot = &request.container.slots[request.slot_index];
                    let meta = match reader.decode_slot_metadata(&slot.data) {
                        Ok(meta) => meta,
                        Err(error) => {
                            log::warn!("failed to decode texture header {}: {}", request.path, error);
                            return;
                        }
                    };

                    let descriptor = if meta.cubemap {
                        gpu.allocate_cube_texture_descriptor()
                    } else {
                        gpu.allocate_texture_descriptor()
                    };
                    let Some(descriptor) = descriptor else {
                        if strict_resource_checking {
                            let error = LoadError::ResourceExhausted(request.path.to_string());
                            log::error!("{}", error);
                            failure.fail(error);
                        } else {
                            log::warn!("descriptor pool exhausted, dropping {}", request.path);
                        }
                        return;
                    };

                    // The upload task owns the encoded bytes; they go away
                    // once the uploader thread has filled the descriptor.
                    let upload_meta = meta.clone();
                    let upload_data = slot.data.clone();
                    gpu.enqueue_low_priority_upload(Box::new(move |context: &mut dyn GpuUploadContext| {
                        if let Err(error) =
                            context.upload_texture(descriptor, &upload_meta, &upload_data)
                        {
                            log::warn!("texture upload failed: {}", error);
                        }
                    }));

                    let payload = ResourcePayload::new(
                        ResourceKind::Texture,
                        Box::new(TextureResource::new(descriptor, meta, gpu.clone())),
                    );
                    reply_tx
                        .send(LoadReply {
                            path: request.path,
                            access: request.access,
                            payload,
                        })
                        .unwrap();
                }),
            )
        };

        let expand_stage = {
            let slot_tx = slot_stage.sender();
            WorkerPool::new(
                "Texture Container Expansion",
                expand_width,
                Arc::new(move |request: ExpandContainerRequest| {
                    profiling::scope!("expand_texture_container");
                    if !textures_enabled {
                        log::trace!("textures disabled, discarding container {}", request.path_base);
                        return;
                    }

                    let container = match &request.source {
                        ContainerSource::File(path) => reader.read_file(path),
                        ContainerSource::Bytes(bytes) => reader.read_bytes(bytes),
                    };
                    let container = match container {
                        Ok(container) => container,
                        Err(error) => {
                            log::warn!(
                                "failed to read texture container under {}: {}",
                                request.path_base,
                                error
                            );
                            return;
                        }
                    };

                    counters.bump_estimate(container.slots.len());

                    let container = Arc::new(container);
                    for slot_index in 0..container.slots.len() {
                        let slot_path = request.path_base.join(&container.slots[slot_index].name);
                        slot_tx
                            .send(TextureSlotRequest {
                                path: slot_path,
                                container: container.clone(),
                                slot_index,
                                access: request.access,
                                game: request.game,
                            })
                            .unwrap();
                    }
                }),
            )
        };

        TexturePipeline {
            expand_stage,
            slot_stage,
        }
    }

    pub fn post_container(
        &self,
        request: ExpandContainerRequest,
    ) -> bool {
        self.expand_stage.post(request)
    }

    pub fn post_slot(
        &self,
        request: TextureSlotRequest,
    ) -> bool {
        self.slot_stage.post(request)
    }

    /// Sender the archive-expansion stage forwards embedded containers to.
    pub fn container_sender(&self) -> Sender<ExpandContainerRequest> {
        self.expand_stage.sender()
    }

    pub fn close_expand(&self) {
        self.expand_stage.close();
    }

    pub fn wait_expand(&self) {
        self.expand_stage.wait_drain();
    }

    pub fn close_slots(&self) {
        self.slot_stage.close();
    }

    pub fn wait_slots(&self) {
        self.slot_stage.wait_drain();
    }
}

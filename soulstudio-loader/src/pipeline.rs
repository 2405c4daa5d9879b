use std::sync::Arc;

use crossbeam_channel::Sender;
use soulstudio_base::ResourceKind;

use crate::decode::Decoder;
use crate::pool::WorkerPool;
use crate::request::{BytesRequest, FileRequest, LoadReply};
use crate::resource::ResourcePayload;

/// Per-kind dataflow unit turning load requests into replies. The two ports
/// are independent worker pools; there is no cross-request ordering.
pub(crate) struct KindPipeline {
    bytes_port: WorkerPool<BytesRequest>,
    file_port: WorkerPool<FileRequest>,
}

impl KindPipeline {
    pub fn new(
        kind: ResourceKind,
        port_width: usize,
        decoder: Option<Arc<dyn Decoder>>,
        reply_tx: Sender<LoadReply>,
    ) -> Self {
        let bytes_port = {
            let decoder = decoder.clone();
            let reply_tx = reply_tx.clone();
            WorkerPool::new(
                &format!("{} Bytes Port", kind),
                port_width,
                Arc::new(move |request: BytesRequest| {
                    profiling::scope!("decode_bytes");
                    let Some(decoder) = &decoder else {
                        log::warn!("no decoder registered for {}, dropping {}", kind, request.path);
                        return;
                    };
                    match decoder.decode_bytes(&request.bytes, request.access, request.game) {
                        Ok(data) => {
                            reply_tx
                                .send(LoadReply {
                                    path: request.path,
                                    access: request.access,
                                    payload: ResourcePayload::new(kind, data),
                                })
                                .unwrap();
                        }
                        Err(error) => {
                            log::warn!("failed to decode {}: {}", request.path, error);
                        }
                    }
                }),
            )
        };

        let file_port = {
            let reply_tx = reply_tx;
            WorkerPool::new(
                &format!("{} File Port", kind),
                port_width,
                Arc::new(move |request: FileRequest| {
                    profiling::scope!("decode_file");
                    let Some(decoder) = &decoder else {
                        log::warn!("no decoder registered for {}, dropping {}", kind, request.path);
                        return;
                    };
                    match decoder.decode_file(&request.file, request.access, request.game) {
                        Ok(data) => {
                            reply_tx
                                .send(LoadReply {
                                    path: request.path,
                                    access: request.access,
                                    payload: ResourcePayload::new(kind, data),
                                })
                                .unwrap();
                        }
                        Err(error) => {
                            log::warn!("failed to decode {}: {}", request.path, error);
                        }
                    }
                }),
            )
        };

        KindPipeline {
            bytes_port,
            file_port,
        }
    }

    pub fn post_bytes(
        &self,
        request: BytesRequest,
    ) -> bool {
        self.bytes_port.post(request)
    }

    pub fn post_file(
        &self,
        request: FileRequest,
    ) -> bool {
        self.file_port.post(request)
    }

    /// Sender the archive-expansion stage feeds entry bytes through.
    pub fn bytes_sender(&self) -> Sender<BytesRequest> {
        self.bytes_port.sender()
    }

    /// No further posts accepted on either port.
    pub fn close_ports(&self) {
        self.bytes_port.close();
        self.file_port.close();
    }

    /// Blocks until both ports are closed, empty and their workers joined.
    pub fn wait_drain(&self) {
        self.bytes_port.wait_drain();
        self.file_port.wait_drain();
    }
}

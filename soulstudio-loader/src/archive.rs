use std::sync::Arc;

use crossbeam_channel::Sender;
use soulstudio_base::hashing::HashMap;
use soulstudio_base::{
    is_texture_container, kind_for_entry_name, normalize_map_texture_base, ResourceKind,
    VirtualPath,
};

use crate::database::ResourceDatabase;
use crate::decode::{binder_open_request, BinderReaderFactory};
use crate::job::JobCounters;
use crate::locator::AssetLocator;
use crate::pool::WorkerPool;
use crate::request::{BytesRequest, ContainerSource, ExpandContainerRequest, LoadArchiveRequest};

/// Front-end stage that unpacks archive tasks into per-entry requests for
/// the kind pipelines and the texture container expansion stage.
pub(crate) struct ArchiveExpandStage {
    pool: WorkerPool<LoadArchiveRequest>,
}

impl ArchiveExpandStage {
    pub fn new(
        width: usize,
        locator: Arc<dyn AssetLocator>,
        binder_factory: Arc<dyn BinderReaderFactory>,
        database: Arc<ResourceDatabase>,
        counters: Arc<JobCounters>,
        bytes_ports: HashMap<ResourceKind, Sender<BytesRequest>>,
        container_tx: Sender<ExpandContainerRequest>,
    ) -> Self {
        let pool = WorkerPool::new(
            "Archive Expansion",
            width,
            Arc::new(move |request: LoadArchiveRequest| {
                profiling::scope!("expand_archive");
                expand_archive(
                    &request,
                    &*locator,
                    &*binder_factory,
                    &database,
                    &counters,
                    &bytes_ports,
                    &container_tx,
                );
            }),
        );

        ArchiveExpandStage { pool }
    }

    pub fn post(
        &self,
        request: LoadArchiveRequest,
    ) -> bool {
        self.pool.post(request)
    }

    pub fn close(&self) {
        self.pool.close();
    }

    pub fn wait_drain(&self) {
        self.pool.wait_drain();
    }
}

fn expand_archive(
    request: &LoadArchiveRequest,
    locator: &dyn AssetLocator,
    binder_factory: &dyn BinderReaderFactory,
    database: &ResourceDatabase,
    counters: &JobCounters,
    bytes_ports: &HashMap<ResourceKind, Sender<BytesRequest>>,
    container_tx: &Sender<ExpandContainerRequest>,
) {
    let game = locator.game_type();

    let Some(resolved) = locator.virtual_to_real(&request.path) else {
        log::warn!("no filesystem path for archive {}", request.path);
        return;
    };

    let (dialect, source) = binder_open_request(game, &resolved.path);
    let binder = match binder_factory.open(dialect, &source) {
        Ok(binder) => binder,
        Err(error) => {
            log::warn!("failed to open binder {}: {}", request.path, error);
            return;
        }
    };

    for index in 0..binder.entry_count() {
        let entry_name = binder.entry_name(index).to_string();
        if let Some(whitelist) = &request.whitelist {
            if !whitelist.contains(&entry_name.to_ascii_lowercase()) {
                continue;
            }
        }

        let child_path = locator.join_binder(&request.path, &entry_name);

        if is_texture_container(&entry_name) {
            if !request.kinds.contains(ResourceKind::Texture) || request.populate_only {
                continue;
            }
            let bytes = match binder.read_entry(index) {
                Ok(bytes) => bytes,
                Err(error) => {
                    log::warn!("failed to extract {}: {}", child_path, error);
                    continue;
                }
            };
            // Estimate is not bumped here: container expansion will count
            // the actual slots.
            let path_base = normalize_map_texture_base(child_path.parent());
            container_tx
                .send(ExpandContainerRequest {
                    path_base: VirtualPath::new(&path_base),
                    source: ContainerSource::Bytes(bytes),
                    access: request.access,
                    game,
                })
                .unwrap();
            continue;
        }

        let Some(kind) = kind_for_entry_name(&entry_name, request.kinds) else {
            continue;
        };

        if request.populate_only {
            database.get_or_create(kind, &child_path);
            continue;
        }

        let bytes = match binder.read_entry(index) {
            Ok(bytes) => bytes,
            Err(error) => {
                log::warn!("failed to extract {}: {}", child_path, error);
                continue;
            }
        };

        counters.bump_estimate(1);
        bytes_ports[&kind]
            .send(BytesRequest {
                path: child_path,
                bytes,
                access: request.access,
                game,
            })
            .unwrap();
    }
}

use std::sync::Arc;

use soulstudio_base::hashing::HashSet;
use soulstudio_base::{
    is_texture_container, kind_for_entry_name, normalize_map_texture_base, AccessLevel,
    ResourceKindMask, VirtualPath,
};

use crate::job::{Job, JobCompletion};
use crate::manager::ResourceManager;
use crate::request::{
    ContainerSource, ExpandContainerRequest, FileRequest, LoadArchiveRequest, LoadRequest,
};

/// Façade for filling one job with load tasks. Archive posts are
/// de-duplicated through the manager's in-flight set, so issuing the same
/// archive twice while jobs are running is a no-op.
pub struct JobBuilder {
    manager: Arc<ResourceManager>,
    job: Arc<Job>,
}

impl JobBuilder {
    pub(crate) fn new(
        manager: Arc<ResourceManager>,
        name: &str,
    ) -> Self {
        let job = Job::new(name, manager.services(), manager.database());
        JobBuilder { manager, job }
    }

    pub fn job(&self) -> &Arc<Job> {
        &self.job
    }

    /// Queues an archive for expansion. `kinds` defaults to every kind;
    /// `whitelist` restricts expansion to the named entries.
    pub fn load_archive(
        &self,
        path: &str,
        access: AccessLevel,
        populate_only: bool,
        kinds: Option<ResourceKindMask>,
        whitelist: Option<HashSet<String>>,
    ) {
        let path = VirtualPath::new(path);
        if !self.manager.try_mark_in_flight(&path) {
            log::debug!("archive {} already in flight, skipping", path);
            return;
        }

        let whitelist = whitelist.map(|entries| {
            entries
                .into_iter()
                .map(|entry| entry.to_ascii_lowercase())
                .collect()
        });

        self.job.bump_course_estimate(1);
        self.job.post_archive(LoadArchiveRequest {
            path,
            access,
            populate_only,
            kinds: kinds.unwrap_or(ResourceKindMask::ALL),
            whitelist,
        });
    }

    /// Queues a single loose file, routed by extension the same way archive
    /// entries are.
    pub fn load_file(
        &self,
        path: &str,
        access: AccessLevel,
    ) {
        let path = VirtualPath::new(path);
        let locator = self.manager.services().locator.clone();
        let game = locator.game_type();

        let Some(resolved) = locator.virtual_to_real(&path) else {
            log::warn!("no filesystem path for {}", path);
            return;
        };

        let file_name = path.file_name().to_string();
        if is_texture_container(&file_name) {
            let path_base = normalize_map_texture_base(path.parent());
            self.job.post_container(ExpandContainerRequest {
                path_base: VirtualPath::new(&path_base),
                source: ContainerSource::File(resolved.path),
                access,
                game,
            });
            return;
        }

        let Some(kind) = kind_for_entry_name(&file_name, ResourceKindMask::ALL) else {
            log::warn!("no pipeline for {}, dropping", path);
            return;
        };

        self.job.bump_estimate(1);
        self.job.post(
            kind,
            LoadRequest::File(FileRequest {
                path,
                file: resolved.path,
                access,
                game,
            }),
        );
    }

    /// Picks up loose unpacked map textures: any unloaded `map/tex...`
    /// handle whose container exists under `<game_root>/map/tx` gets its
    /// container queued.
    pub fn load_udsfm_textures(&self) {
        let locator = self.manager.services().locator.clone();
        let game = locator.game_type();
        let tx_dir = locator.game_root().join("map").join("tx");

        for handle in self.manager.database().all_handles() {
            if handle.is_loaded() || !handle.virtual_path().starts_with("map/tex") {
                continue;
            }

            let file = tx_dir.join(format!("{}.tpf", handle.virtual_path().file_name()));
            if !file.exists() {
                continue;
            }

            self.job.post_container(ExpandContainerRequest {
                path_base: VirtualPath::new(handle.virtual_path().parent()),
                source: ContainerSource::File(file),
                access: AccessLevel::GpuOptimizedOnly,
                game,
            });
        }
    }

    /// Queues containers for unloaded asset environment textures, one per
    /// distinct aet id.
    pub fn load_unloaded_textures(&self) {
        let locator = self.manager.services().locator.clone();
        let game = locator.game_type();
        let mut seen_ids: HashSet<String> = Default::default();

        for handle in self.manager.database().all_handles() {
            if handle.is_loaded() || !handle.virtual_path().starts_with("aet/") {
                continue;
            }

            let rest = &handle.virtual_path().as_str()[4..];
            let Some(aet_id) = rest.split('/').next().filter(|id| !id.is_empty()) else {
                continue;
            };
            if !seen_ids.insert(aet_id.to_string()) {
                continue;
            }

            let Some(aet) = locator.get_aet_texture(aet_id) else {
                log::warn!("no texture container known for aet id {}", aet_id);
                continue;
            };

            self.job.post_container(ExpandContainerRequest {
                path_base: aet.path_base,
                source: ContainerSource::File(aet.file),
                access: AccessLevel::GpuOptimizedOnly,
                game,
            });
        }
    }

    /// Registers the job with the manager and kicks off its orderly
    /// shutdown of stages. No further posts are accepted.
    pub fn complete(self) -> JobCompletion {
        self.manager.start_job(self.job.clone());
        self.job.complete(self.manager.scheduler())
    }
}

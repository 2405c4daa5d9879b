use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crossbeam_channel::{Receiver, Sender};
use soulstudio_base::hashing::HashSet;
use soulstudio_base::{AccessLevel, ResourceConfig, ResourceKind, VirtualPath};

use crate::builder::JobBuilder;
use crate::database::ResourceDatabase;
use crate::decode::{BinderReaderFactory, DecoderTable, TextureContainerReader};
use crate::gpu::GpuBackend;
use crate::handle::ResourceObserver;
use crate::job::Job;
use crate::locator::AssetLocator;
use crate::pool::WorkerPool;
use crate::request::{ObserveRequest, UnloadRequest};

/// The external collaborators and configuration every job is built against.
pub(crate) struct LoaderServices {
    pub locator: Arc<dyn AssetLocator>,
    pub decoders: Arc<DecoderTable>,
    pub texture_reader: Arc<dyn TextureContainerReader>,
    pub binder_factory: Arc<dyn BinderReaderFactory>,
    pub gpu: Arc<dyn GpuBackend>,
    pub config: ResourceConfig,
}

pub(crate) type SchedulerTask = Box<dyn FnOnce() + Send>;

/// One row of [`ResourceManager::job_progress`].
#[derive(Debug, Clone)]
pub struct JobProgress {
    pub name: String,
    pub progress: usize,
    pub estimated_size: usize,
}

/// Process-wide coordinator: owns the database, the active jobs, the
/// deferred observe/unload queues and the per-frame tick that drives them.
/// The tick runs single-threaded on the UI thread; installs, unloads and
/// database removals happen only there.
pub struct ResourceManager {
    services: Arc<LoaderServices>,
    database: Arc<ResourceDatabase>,
    in_flight: Mutex<HashSet<VirtualPath>>,
    active_jobs: Mutex<Vec<Arc<Job>>>,
    observe_tx: Sender<ObserveRequest>,
    observe_rx: Receiver<ObserveRequest>,
    unload_tx: Sender<UnloadRequest>,
    unload_rx: Receiver<UnloadRequest>,
    scheduler: WorkerPool<SchedulerTask>,
    refresh_udsfm: AtomicBool,
    refresh_unloaded_textures: AtomicBool,
    had_active_jobs: AtomicBool,
}

impl ResourceManager {
    pub fn new(
        locator: Arc<dyn AssetLocator>,
        decoders: DecoderTable,
        texture_reader: Arc<dyn TextureContainerReader>,
        binder_factory: Arc<dyn BinderReaderFactory>,
        gpu: Arc<dyn GpuBackend>,
        config: ResourceConfig,
    ) -> Arc<Self> {
        let (observe_tx, observe_rx) = crossbeam_channel::unbounded();
        let (unload_tx, unload_rx) = crossbeam_channel::unbounded();

        let scheduler = WorkerPool::new(
            "Job Scheduler",
            config.job_scheduler_width,
            Arc::new(|task: SchedulerTask| task()),
        );

        Arc::new(ResourceManager {
            services: Arc::new(LoaderServices {
                locator,
                decoders: Arc::new(decoders),
                texture_reader,
                binder_factory,
                gpu,
                config,
            }),
            database: Arc::new(ResourceDatabase::new(unload_tx.clone())),
            in_flight: Mutex::new(Default::default()),
            active_jobs: Mutex::new(Vec::new()),
            observe_tx,
            observe_rx,
            unload_tx,
            unload_rx,
            scheduler,
            refresh_udsfm: AtomicBool::new(false),
            refresh_unloaded_textures: AtomicBool::new(false),
            had_active_jobs: AtomicBool::new(false),
        })
    }

    pub fn database(&self) -> &Arc<ResourceDatabase> {
        &self.database
    }

    pub(crate) fn services(&self) -> &Arc<LoaderServices> {
        &self.services
    }

    pub(crate) fn scheduler(&self) -> &WorkerPool<SchedulerTask> {
        &self.scheduler
    }

    pub fn create_job(
        self: &Arc<Self>,
        name: &str,
    ) -> JobBuilder {
        JobBuilder::new(self.clone(), name)
    }

    /// Queues an observer registration; the handle is created (if needed)
    /// and observed on the next tick.
    pub fn observe_resource(
        &self,
        path: &str,
        kind: ResourceKind,
        observer: Weak<dyn ResourceObserver>,
        required_access: AccessLevel,
        tag: u64,
    ) {
        let _ = self.observe_tx.send(ObserveRequest {
            path: VirtualPath::new(path),
            kind,
            observer,
            required_access,
            tag,
        });
    }

    /// Queues an unload. Conditional unloads only fire when the reference
    /// count is zero by the time the idle tick drains the queue;
    /// unconditional ones fire regardless, though the entry is only
    /// forgotten once unreferenced.
    pub fn request_unload(
        &self,
        path: &str,
        unconditional: bool,
    ) {
        let _ = self.unload_tx.send(UnloadRequest {
            path: VirtualPath::new(path),
            unconditional,
        });
    }

    /// Re-scan for loose unpacked map textures on the next idle tick.
    pub fn schedule_udsfm_refresh(&self) {
        self.refresh_udsfm.store(true, Ordering::Release);
    }

    /// Re-scan for unloaded asset environment textures on the next idle
    /// tick.
    pub fn schedule_unloaded_textures_refresh(&self) {
        self.refresh_unloaded_textures.store(true, Ordering::Release);
    }

    /// Progress of every active job, for the host's progress bar. Failed
    /// requests never produce replies, so `progress` may stay below
    /// `estimated_size`.
    pub fn job_progress(&self) -> Vec<JobProgress> {
        self.active_jobs
            .lock()
            .unwrap()
            .iter()
            .map(|job| JobProgress {
                name: job.name().to_string(),
                progress: job.progress(),
                estimated_size: job.estimated_size(),
            })
            .collect()
    }

    pub(crate) fn try_mark_in_flight(
        &self,
        path: &VirtualPath,
    ) -> bool {
        self.in_flight.lock().unwrap().insert(path.clone())
    }

    pub(crate) fn start_job(
        &self,
        job: Arc<Job>,
    ) {
        log::debug!("job {} started", job.name());
        self.active_jobs.lock().unwrap().push(job);
    }

    /// The per-frame cooperative step. Non-blocking: every receive is a
    /// try-receive and every action is bounded.
    #[profiling::function]
    pub fn tick(self: &Arc<Self>) {
        // Deferred observer registrations first, so observers never miss an
        // install processed later in the same tick.
        while let Ok(request) = self.observe_rx.try_recv() {
            self.database.observe(
                request.kind,
                &request.path,
                request.observer,
                request.required_access,
                request.tag,
            );
        }

        let mut active_jobs = self.active_jobs.lock().unwrap();

        if active_jobs.is_empty() {
            // Nothing can be racing the guard set now; new jobs re-insert.
            self.in_flight.lock().unwrap().clear();

            while let Ok(request) = self.unload_rx.try_recv() {
                if let Some(handle) = self.database.lookup(&request.path) {
                    if request.unconditional || handle.ref_count() == 0 {
                        handle.unload();
                        if handle.ref_count() == 0 {
                            self.database.remove_if_unused(&request.path);
                        }
                    }
                }
            }
        }

        active_jobs.retain(|job| {
            // Read the flag before draining: a job that reports finished
            // has already published every reply, so one full drain below
            // cannot miss any.
            let finished = job.finished();
            let failed = job.failed();
            while let Some(reply) = job.try_recv_reply() {
                if failed || job.failed() {
                    // A fatally failed job installs nothing further.
                    continue;
                }
                job.record_processed();
                let handle = self.database.get_or_create(reply.payload.kind(), &reply.path);
                handle.install(reply.payload, reply.access);
            }
            if finished {
                log::debug!(
                    "job {} retired after {} replies",
                    job.name(),
                    job.progress()
                );
            }
            !finished
        });

        let now_active = !active_jobs.is_empty();
        drop(active_jobs);

        if !now_active {
            self.services.gpu.flush_geometry_staging();

            if self.refresh_udsfm.swap(false, Ordering::AcqRel) {
                let builder = self.create_job("UDSFM Texture Load");
                builder.load_udsfm_textures();
                let _ = builder.complete();
            }
            if self.refresh_unloaded_textures.swap(false, Ordering::AcqRel) {
                let builder = self.create_job("Unloaded Texture Load");
                builder.load_unloaded_textures();
                let _ = builder.complete();
            }
        }

        // On the active->idle transition, drop payloads nobody references
        // anymore. Entries stay in the database; removal is the unload
        // queue's business.
        let had_active = self.had_active_jobs.swap(
            !self.active_jobs.lock().unwrap().is_empty(),
            Ordering::AcqRel,
        );
        if had_active && !now_active {
            for handle in self.database.all_handles() {
                handle.unload_if_unused();
            }
        }
    }

    /// Tears the subsystem down: disposes the job scheduler and discards
    /// queued requests that were never observed. In-flight workers finish
    /// their current request when their job is dropped.
    pub fn shutdown(&self) {
        log::debug!("resource manager shutting down");
        self.scheduler.close();
        self.scheduler.wait_drain();
        self.active_jobs.lock().unwrap().clear();
        while self.observe_rx.try_recv().is_ok() {}
        while self.unload_rx.try_recv().is_ok() {}
    }
}

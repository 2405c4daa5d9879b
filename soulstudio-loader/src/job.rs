use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::Receiver;
use soulstudio_base::hashing::HashMap;
use soulstudio_base::ResourceKind;

use crate::archive::ArchiveExpandStage;
use crate::database::ResourceDatabase;
use crate::error::LoadError;
use crate::manager::{LoaderServices, SchedulerTask};
use crate::pipeline::KindPipeline;
use crate::pool::WorkerPool;
use crate::request::{ExpandContainerRequest, LoadArchiveRequest, LoadReply, LoadRequest};
use crate::texture::TexturePipeline;

/// Thread-safe progress accounting for one job. The estimate grows as
/// expansion stages discover work; `course_estimate` is the builder's
/// coarser up-front guess. The UI reads `max` of the two, so a progress bar
/// never runs backwards when expansion outpaces the guess.
pub(crate) struct JobCounters {
    estimate: AtomicUsize,
    course_estimate: AtomicUsize,
    processed: AtomicUsize,
}

impl JobCounters {
    fn new() -> Self {
        JobCounters {
            estimate: AtomicUsize::new(0),
            course_estimate: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
        }
    }

    pub fn bump_estimate(
        &self,
        count: usize,
    ) {
        self.estimate.fetch_add(count, Ordering::Release);
    }

    pub fn bump_course_estimate(
        &self,
        count: usize,
    ) {
        self.course_estimate.fetch_add(count, Ordering::Release);
    }

    fn estimated_size(&self) -> usize {
        self.estimate
            .load(Ordering::Acquire)
            .max(self.course_estimate.load(Ordering::Acquire))
    }

    fn course_size(&self) -> usize {
        self.course_estimate.load(Ordering::Acquire)
    }

    fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Release);
    }

    fn processed(&self) -> usize {
        self.processed.load(Ordering::Acquire)
    }
}

/// First fatal error of a job, if any. Once set, the slot loader stops
/// emitting and the manager discards the job's remaining replies.
pub(crate) struct JobFailure {
    failed: AtomicBool,
    error: Mutex<Option<LoadError>>,
}

impl JobFailure {
    fn new() -> Self {
        JobFailure {
            failed: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub fn fail(
        &self,
        error: LoadError,
    ) {
        let mut slot = self.error.lock().unwrap();
        if slot.is_none() {
            *slot = Some(error);
        }
        self.failed.store(true, Ordering::Release);
    }

    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn error(&self) -> Option<LoadError> {
        self.error.lock().unwrap().clone()
    }
}

/// A named batch of load work: one pipeline per kind, the two front-end
/// expansion stages, and the reply buffer everything publishes into. Field
/// order mirrors the completion order so a dropped job tears down
/// upstream-first.
pub struct Job {
    name: String,
    counters: Arc<JobCounters>,
    failure: Arc<JobFailure>,
    finished: AtomicBool,
    completing: AtomicBool,
    archive_stage: ArchiveExpandStage,
    pipelines: HashMap<ResourceKind, KindPipeline>,
    texture_pipeline: TexturePipeline,
    reply_rx: Receiver<LoadReply>,
}

impl Job {
    pub(crate) fn new(
        name: &str,
        services: &LoaderServices,
        database: &Arc<ResourceDatabase>,
    ) -> Arc<Job> {
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded::<LoadReply>();
        let counters = Arc::new(JobCounters::new());
        let failure = Arc::new(JobFailure::new());
        let port_width = services.config.pipeline_port_parallelism;

        let mut pipelines = HashMap::default();
        for kind in [
            ResourceKind::Flver,
            ResourceKind::CollisionHkx,
            ResourceKind::Navmesh,
            ResourceKind::NavmeshHkx,
        ] {
            pipelines.insert(
                kind,
                KindPipeline::new(
                    kind,
                    port_width,
                    services.decoders.get(kind),
                    reply_tx.clone(),
                ),
            );
        }

        let texture_pipeline = TexturePipeline::new(
            port_width,
            port_width,
            services.config.textures_enabled,
            services.config.strict_resource_checking,
            services.texture_reader.clone(),
            services.gpu.clone(),
            counters.clone(),
            failure.clone(),
            reply_tx,
        );

        let mut bytes_ports = HashMap::default();
        for (kind, pipeline) in &pipelines {
            bytes_ports.insert(*kind, pipeline.bytes_sender());
        }

        let archive_stage = ArchiveExpandStage::new(
            port_width,
            services.locator.clone(),
            services.binder_factory.clone(),
            database.clone(),
            counters.clone(),
            bytes_ports,
            texture_pipeline.container_sender(),
        );

        Arc::new(Job {
            name: name.to_string(),
            counters,
            failure,
            finished: AtomicBool::new(false),
            completing: AtomicBool::new(false),
            archive_stage,
            pipelines,
            texture_pipeline,
            reply_rx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replies the manager has installed for this job so far.
    pub fn progress(&self) -> usize {
        self.counters.processed()
    }

    pub fn estimated_size(&self) -> usize {
        self.counters.estimated_size()
    }

    /// The builder's coarse task count, before expansion refines it.
    pub fn course_size(&self) -> usize {
        self.counters.course_size()
    }

    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub(crate) fn failed(&self) -> bool {
        self.failure.is_failed()
    }

    pub(crate) fn record_processed(&self) {
        self.counters.record_processed();
    }

    pub(crate) fn bump_estimate(
        &self,
        count: usize,
    ) {
        self.counters.bump_estimate(count);
    }

    pub(crate) fn bump_course_estimate(
        &self,
        count: usize,
    ) {
        self.counters.bump_course_estimate(count);
    }

    pub(crate) fn post_archive(
        &self,
        request: LoadArchiveRequest,
    ) {
        self.archive_stage.post(request);
    }

    pub(crate) fn post_container(
        &self,
        request: ExpandContainerRequest,
    ) {
        self.texture_pipeline.post_container(request);
    }

    pub(crate) fn post(
        &self,
        kind: ResourceKind,
        request: LoadRequest,
    ) {
        match request {
            LoadRequest::Bytes(request) => {
                self.pipelines[&kind].post_bytes(request);
            }
            LoadRequest::File(request) => {
                self.pipelines[&kind].post_file(request);
            }
            LoadRequest::TextureSlot(request) => {
                assert_eq!(kind, ResourceKind::Texture);
                self.texture_pipeline.post_slot(request);
            }
        }
    }

    pub(crate) fn try_recv_reply(&self) -> Option<LoadReply> {
        self.reply_rx.try_recv().ok()
    }

    /// Closes and drains the job's stages in dependency order: archive
    /// expansion produces pipeline and container requests, container
    /// expansion produces slot requests, so each stage must be drained
    /// before the stages it feeds are closed. Runs on the manager's job
    /// scheduler; the returned completion resolves once everything is
    /// joined and `finished` is flipped.
    pub(crate) fn complete(
        self: &Arc<Self>,
        scheduler: &WorkerPool<SchedulerTask>,
    ) -> JobCompletion {
        assert!(
            !self.completing.swap(true, Ordering::AcqRel),
            "job {} completed twice",
            self.name
        );

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let job = self.clone();
        let scheduled = scheduler.post(Box::new(move || {
            profiling::scope!("complete_job");
            log::debug!("completing job {}", job.name);

            job.archive_stage.close();
            job.archive_stage.wait_drain();

            for pipeline in job.pipelines.values() {
                pipeline.close_ports();
            }

            job.texture_pipeline.close_expand();
            job.texture_pipeline.wait_expand();
            job.texture_pipeline.close_slots();

            for pipeline in job.pipelines.values() {
                pipeline.wait_drain();
            }
            job.texture_pipeline.wait_slots();

            job.finished.store(true, Ordering::Release);
            log::debug!("job {} finished", job.name);

            let result = match job.failure.error() {
                Some(error) => Err(error),
                None => Ok(()),
            };
            let _ = done_tx.send(result);
        }));

        if !scheduled {
            log::warn!("job scheduler is shut down, {} will not complete", self.name);
        }

        JobCompletion {
            job: self.clone(),
            done_rx,
        }
    }
}

/// Handle to a job's single completion event.
pub struct JobCompletion {
    job: Arc<Job>,
    done_rx: Receiver<Result<(), LoadError>>,
}

impl JobCompletion {
    pub fn job(&self) -> &Arc<Job> {
        &self.job
    }

    /// Blocks until the job's stages have all drained. After this returns,
    /// no further replies for the job's requests will appear. Returns the
    /// job's fatal error when one was recorded.
    pub fn wait(&self) -> Result<(), LoadError> {
        match self.done_rx.recv() {
            Ok(result) => result,
            // Scheduler disposed mid-shutdown; nothing left to wait on.
            Err(_) => Ok(()),
        }
    }
}

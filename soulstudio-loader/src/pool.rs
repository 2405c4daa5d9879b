use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

/// Fixed-width worker pool over an unbounded request channel. Closing drops
/// the pool's sender; workers keep draining until the channel is both closed
/// and empty, so `close` followed by `wait_drain` is exactly the
/// closed-and-drained completion point a stage needs.
pub(crate) struct WorkerPool<R: Send + 'static> {
    request_tx: Mutex<Option<Sender<R>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<R: Send + 'static> WorkerPool<R> {
    pub fn new(
        name: &str,
        width: usize,
        handler: Arc<dyn Fn(R) + Send + Sync>,
    ) -> Self {
        assert!(width > 0, "worker pool {} needs at least one thread", name);
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<R>();

        let mut workers = Vec::with_capacity(width);
        for thread_index in 0..width {
            let request_rx = request_rx.clone();
            let handler = handler.clone();
            let thread_name = format!("{} {}", name, thread_index);
            let join_handle = std::thread::Builder::new()
                .name(thread_name.clone())
                .spawn(move || {
                    profiling::register_thread!(&thread_name);
                    while let Ok(request) = request_rx.recv() {
                        handler(request);
                    }
                })
                .unwrap();
            workers.push(join_handle);
        }

        WorkerPool {
            request_tx: Mutex::new(Some(request_tx)),
            workers: Mutex::new(workers),
        }
    }

    /// Returns false if the pool has been closed.
    pub fn post(
        &self,
        request: R,
    ) -> bool {
        match &*self.request_tx.lock().unwrap() {
            Some(request_tx) => request_tx.send(request).is_ok(),
            None => false,
        }
    }

    /// A sender another stage can feed this pool through. The clone keeps the
    /// channel open until the holder drops it, so upstream stages must be
    /// drained before this pool's drain can finish.
    pub fn sender(&self) -> Sender<R> {
        self.request_tx
            .lock()
            .unwrap()
            .as_ref()
            .expect("pool already closed")
            .clone()
    }

    /// Stops accepting requests. Already-posted requests still run.
    pub fn close(&self) {
        *self.request_tx.lock().unwrap() = None;
    }

    /// Blocks until every worker has drained the channel and exited. Only
    /// meaningful after `close` (and after upstream holders of `sender`
    /// clones have finished).
    pub fn wait_drain(&self) {
        let workers = std::mem::take(&mut *self.workers.lock().unwrap());
        for join_handle in workers {
            join_handle.join().unwrap();
        }
    }
}

impl<R: Send + 'static> Drop for WorkerPool<R> {
    fn drop(&mut self) {
        self.close();
        self.wait_drain();
    }
}

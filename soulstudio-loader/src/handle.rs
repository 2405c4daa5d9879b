use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crossbeam_channel::Sender;
use soulstudio_base::{AccessLevel, ResourceKind, VirtualPath};

use crate::error::LoadError;
use crate::request::UnloadRequest;
use crate::resource::ResourcePayload;

/// Receives load/unload events for a handle it registered interest in.
/// Held weakly: a dead observer is silently skipped and purged on the next
/// notification walk.
pub trait ResourceObserver: Send + Sync {
    fn on_loaded(
        &self,
        handle: &Arc<ResourceHandle>,
        tag: u64,
    );

    fn on_unloaded(
        &self,
        handle: &Arc<ResourceHandle>,
        tag: u64,
    );
}

struct ObserverEntry {
    observer: Weak<dyn ResourceObserver>,
    required_access: AccessLevel,
    tag: u64,
}

struct HandleState {
    access_level: AccessLevel,
    payload: Option<ResourcePayload>,
    observers: Vec<ObserverEntry>,
}

/// The stable identity for a resource across load/unload cycles: one per
/// virtual path, created lazily and never replaced while it stays in the
/// database.
///
/// `observe`, `acquire` and `release` may run from any thread; `install`
/// and `unload` run only on the manager's tick thread. The state mutex is
/// never held across observer callbacks.
pub struct ResourceHandle {
    virtual_path: VirtualPath,
    kind: ResourceKind,
    ref_count: AtomicU32,
    state: Mutex<HandleState>,
    unload_tx: Sender<UnloadRequest>,
}

impl ResourceHandle {
    pub(crate) fn new(
        virtual_path: VirtualPath,
        kind: ResourceKind,
        unload_tx: Sender<UnloadRequest>,
    ) -> Self {
        ResourceHandle {
            virtual_path,
            kind,
            ref_count: AtomicU32::new(0),
            state: Mutex::new(HandleState {
                access_level: AccessLevel::Unloaded,
                payload: None,
                observers: Vec::new(),
            }),
            unload_tx,
        }
    }

    pub fn virtual_path(&self) -> &VirtualPath {
        &self.virtual_path
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn access_level(&self) -> AccessLevel {
        self.state.lock().unwrap().access_level
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().unwrap().payload.is_some()
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::Acquire)
    }

    /// Runs `f` against the installed payload, if any.
    pub fn with_payload<T>(
        &self,
        f: impl FnOnce(&ResourcePayload) -> T,
    ) -> Option<T> {
        self.state.lock().unwrap().payload.as_ref().map(f)
    }

    /// Registers a weak observer. If the handle is already loaded at a
    /// satisfying access level the observer is notified immediately, alone.
    pub fn observe(
        self: &Arc<Self>,
        observer: Weak<dyn ResourceObserver>,
        required_access: AccessLevel,
        tag: u64,
    ) {
        let notify_now = {
            let mut state = self.state.lock().unwrap();
            let live = observer.upgrade();
            state.observers.push(ObserverEntry {
                observer,
                required_access,
                tag,
            });
            if required_access.satisfied_by(state.access_level) {
                live
            } else {
                None
            }
        };

        if let Some(observer) = notify_now {
            observer.on_loaded(self, tag);
        }
    }

    pub fn acquire(&self) {
        self.ref_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Drops one reference. Going below zero is a fatal invariant violation.
    /// When the count reaches zero on a loaded handle, a conditional unload
    /// is scheduled for the next idle tick.
    pub fn release(&self) {
        let previous = self
            .ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .unwrap_or_else(|_| {
                panic!("{}", LoadError::RefCountUnderflow(self.virtual_path.to_string()))
            });

        if previous == 1 && self.is_loaded() {
            let _ = self.unload_tx.send(UnloadRequest {
                path: self.virtual_path.clone(),
                unconditional: false,
            });
        }
    }

    /// Adopts a freshly decoded payload. A handle that was already loaded is
    /// unloaded first, so observers always see unloaded-then-loaded for a
    /// re-load. Tick thread only.
    pub(crate) fn install(
        self: &Arc<Self>,
        payload: ResourcePayload,
        access_level: AccessLevel,
    ) {
        if self.is_loaded() {
            log::debug!("reinstalling {}, unloading old payload first", self.virtual_path);
            self.unload();
        }

        let notify = {
            let mut state = self.state.lock().unwrap();
            state.payload = Some(payload);
            state.access_level = access_level;
            Self::collect_observers(&mut state, |entry| {
                entry.required_access.satisfied_by(access_level)
            })
        };

        log::debug!("installed {} at {:?}", self.virtual_path, access_level);
        for (observer, tag) in notify {
            observer.on_loaded(self, tag);
        }
    }

    /// Notifies observers, releases the payload and returns the handle to
    /// `Unloaded`. Tick thread only.
    pub(crate) fn unload(self: &Arc<Self>) {
        let (notify, payload) = {
            let mut state = self.state.lock().unwrap();
            if state.payload.is_none() {
                return;
            }
            let payload = state.payload.take();
            state.access_level = AccessLevel::Unloaded;
            (Self::collect_observers(&mut state, |_| true), payload)
        };

        log::debug!("unloaded {}", self.virtual_path);
        for (observer, tag) in notify {
            observer.on_unloaded(self, tag);
        }
        drop(payload);
    }

    /// The idle-sweep form of unload: only fires for unreferenced handles.
    /// Tick thread only.
    pub(crate) fn unload_if_unused(self: &Arc<Self>) {
        if self.ref_count() == 0 {
            self.unload();
        }
    }

    /// Upgrades live observers passing `filter` and purges dead entries.
    /// Runs under the state lock; callers dispatch outside it.
    fn collect_observers(
        state: &mut HandleState,
        filter: impl Fn(&ObserverEntry) -> bool,
    ) -> Vec<(Arc<dyn ResourceObserver>, u64)> {
        let mut notify = Vec::new();
        state.observers.retain(|entry| {
            match entry.observer.upgrade() {
                Some(observer) => {
                    if filter(entry) {
                        notify.push((observer, entry.tag));
                    }
                    true
                }
                None => false,
            }
        });
        notify
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("virtual_path", &self.virtual_path)
            .field("kind", &self.kind)
            .field("ref_count", &self.ref_count())
            .field("access_level", &self.access_level())
            .finish()
    }
}

/// RAII pairing of `acquire`/`release` for callers that hold a resource
/// across editor frames.
pub struct ResourceRef {
    handle: Arc<ResourceHandle>,
}

impl ResourceRef {
    pub fn new(handle: Arc<ResourceHandle>) -> Self {
        handle.acquire();
        ResourceRef { handle }
    }

    pub fn handle(&self) -> &Arc<ResourceHandle> {
        &self.handle
    }
}

impl Clone for ResourceRef {
    fn clone(&self) -> Self {
        ResourceRef::new(self.handle.clone())
    }
}

impl Drop for ResourceRef {
    fn drop(&mut self) {
        self.handle.release();
    }
}

use std::sync::{Arc, Weak};

use crossbeam_channel::Sender;
use dashmap::DashMap;
use soulstudio_base::{AccessLevel, ResourceKind, VirtualPath};

use crate::error::LoadError;
use crate::handle::{ResourceHandle, ResourceObserver};
use crate::request::UnloadRequest;

/// One row of [`ResourceDatabase::snapshot`], for the editor's resource
/// list window.
#[derive(Debug, Clone)]
pub struct ResourceSummary {
    pub path: VirtualPath,
    pub kind: ResourceKind,
    pub access_level: AccessLevel,
    pub ref_count: u32,
}

/// The shared map from canonical virtual path to resource handle. Lookups
/// and handle creation are safe from any thread; entry removal happens only
/// on the manager tick.
pub struct ResourceDatabase {
    handles: DashMap<VirtualPath, Arc<ResourceHandle>>,
    unload_tx: Sender<UnloadRequest>,
}

impl ResourceDatabase {
    pub(crate) fn new(unload_tx: Sender<UnloadRequest>) -> Self {
        ResourceDatabase {
            handles: DashMap::new(),
            unload_tx,
        }
    }

    pub fn lookup(
        &self,
        path: &VirtualPath,
    ) -> Option<Arc<ResourceHandle>> {
        self.handles.get(path).map(|entry| entry.value().clone())
    }

    /// Atomic get-or-create. Asking for an existing handle with a different
    /// kind is a programming error and fails fast.
    pub fn get_or_create(
        &self,
        kind: ResourceKind,
        path: &VirtualPath,
    ) -> Arc<ResourceHandle> {
        let handle = self
            .handles
            .entry(path.clone())
            .or_insert_with(|| {
                log::trace!("new handle {} ({})", path, kind);
                Arc::new(ResourceHandle::new(path.clone(), kind, self.unload_tx.clone()))
            })
            .clone();

        if handle.kind() != kind {
            panic!(
                "{}",
                LoadError::KindMismatch {
                    path: path.to_string(),
                    expected: kind,
                    actual: handle.kind(),
                }
            );
        }

        handle
    }

    /// Get-or-create plus observer registration in one step.
    pub fn observe(
        &self,
        kind: ResourceKind,
        path: &VirtualPath,
        observer: Weak<dyn ResourceObserver>,
        required_access: AccessLevel,
        tag: u64,
    ) -> Arc<ResourceHandle> {
        let handle = self.get_or_create(kind, path);
        handle.observe(observer, required_access, tag);
        handle
    }

    /// Forgets an entry that is unreferenced and unloaded. Tick thread only.
    pub(crate) fn remove_if_unused(
        &self,
        path: &VirtualPath,
    ) {
        self.handles.remove_if(path, |_, handle| {
            handle.ref_count() == 0 && !handle.is_loaded()
        });
    }

    /// All handles, decoupled from the map so callers can mutate while
    /// walking.
    pub(crate) fn all_handles(&self) -> Vec<Arc<ResourceHandle>> {
        self.handles
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn snapshot(&self) -> Vec<ResourceSummary> {
        self.handles
            .iter()
            .map(|entry| {
                let handle = entry.value();
                ResourceSummary {
                    path: handle.virtual_path().clone(),
                    kind: handle.kind(),
                    access_level: handle.access_level(),
                    ref_count: handle.ref_count(),
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

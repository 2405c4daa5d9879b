use std::path::PathBuf;
use std::sync::{Arc, Weak};

use soulstudio_base::hashing::HashSet;
use soulstudio_base::{AccessLevel, GameFamily, ResourceKind, ResourceKindMask, VirtualPath};

use crate::decode::TextureContainer;
use crate::handle::ResourceObserver;
use crate::resource::ResourcePayload;

/// Work unit for a pipeline's bytes port: an already-extracted entry.
pub struct BytesRequest {
    pub path: VirtualPath,
    pub bytes: Vec<u8>,
    pub access: AccessLevel,
    pub game: GameFamily,
}

/// Work unit for a pipeline's file port: a loose file on disk.
pub struct FileRequest {
    pub path: VirtualPath,
    pub file: PathBuf,
    pub access: AccessLevel,
    pub game: GameFamily,
}

/// Work unit for the texture slot loader: one subresource of a parsed
/// container.
pub struct TextureSlotRequest {
    pub path: VirtualPath,
    pub container: Arc<TextureContainer>,
    pub slot_index: usize,
    pub access: AccessLevel,
    pub game: GameFamily,
}

/// The tagged request forms a job accepts for a given kind.
pub enum LoadRequest {
    Bytes(BytesRequest),
    File(FileRequest),
    TextureSlot(TextureSlotRequest),
}

/// Result published by a pipeline worker into the job's reply buffer.
pub struct LoadReply {
    pub path: VirtualPath,
    pub access: AccessLevel,
    pub payload: ResourcePayload,
}

/// Where a texture container's bytes come from.
pub enum ContainerSource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

/// Work unit for the container-expansion stage. `path_base` is the already
/// normalized virtual directory that slot names are joined onto.
pub struct ExpandContainerRequest {
    pub path_base: VirtualPath,
    pub source: ContainerSource,
    pub access: AccessLevel,
    pub game: GameFamily,
}

/// Work unit for the archive-expansion stage.
pub struct LoadArchiveRequest {
    pub path: VirtualPath,
    pub access: AccessLevel,
    /// Create handles for matching entries without decoding anything.
    pub populate_only: bool,
    pub kinds: ResourceKindMask,
    /// Entry names to admit, matched case-insensitively. `None` admits all.
    pub whitelist: Option<HashSet<String>>,
}

/// Deferred observer registration, drained by the manager tick.
pub struct ObserveRequest {
    pub path: VirtualPath,
    pub kind: ResourceKind,
    pub observer: Weak<dyn ResourceObserver>,
    pub required_access: AccessLevel,
    pub tag: u64,
}

/// Deferred unload, drained by the manager tick when no jobs are active.
pub struct UnloadRequest {
    pub path: VirtualPath,
    pub unconditional: bool,
}

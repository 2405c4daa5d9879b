use std::path::{Path, PathBuf};
use std::sync::Arc;

use soulstudio_base::hashing::HashMap;
use soulstudio_base::{AccessLevel, GameFamily, ResourceKind};

use crate::error::LoadError;
use crate::resource::ResourceData;

/// Stateless per-kind decoder. Implementations live with the format
/// libraries; the pipelines only see this surface.
pub trait Decoder: Send + Sync {
    fn decode_bytes(
        &self,
        bytes: &[u8],
        access: AccessLevel,
        game: GameFamily,
    ) -> Result<Box<dyn ResourceData>, LoadError>;

    fn decode_file(
        &self,
        path: &Path,
        access: AccessLevel,
        game: GameFamily,
    ) -> Result<Box<dyn ResourceData>, LoadError>;
}

/// Decoder lookup keyed by kind tag.
#[derive(Default)]
pub struct DecoderTable {
    decoders: HashMap<ResourceKind, Arc<dyn Decoder>>,
}

impl DecoderTable {
    pub fn new() -> Self {
        DecoderTable {
            decoders: Default::default(),
        }
    }

    pub fn register(
        &mut self,
        kind: ResourceKind,
        decoder: Arc<dyn Decoder>,
    ) {
        let previous = self.decoders.insert(kind, decoder);
        assert!(previous.is_none(), "decoder for {} registered twice", kind);
    }

    pub fn get(
        &self,
        kind: ResourceKind,
    ) -> Option<Arc<dyn Decoder>> {
        self.decoders.get(&kind).cloned()
    }
}

/// Parsed texture container. Slot data stays encoded; the slot loader only
/// reads the header before handing the bytes to the GPU upload queue.
pub struct TextureContainer {
    pub slots: Vec<TextureSlotData>,
}

pub struct TextureSlotData {
    pub name: String,
    pub data: Arc<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct TextureMeta {
    pub cubemap: bool,
    pub width: u32,
    pub height: u32,
    pub mip_count: u32,
    pub format: u32,
}

/// Reader for texture container files and their slot headers.
pub trait TextureContainerReader: Send + Sync {
    fn read_file(
        &self,
        path: &Path,
    ) -> Result<TextureContainer, LoadError>;

    fn read_bytes(
        &self,
        bytes: &[u8],
    ) -> Result<TextureContainer, LoadError>;

    fn decode_slot_metadata(
        &self,
        bytes: &[u8],
    ) -> Result<TextureMeta, LoadError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderDialect {
    Legacy,
    V4,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinderSource {
    Single(PathBuf),
    Split { header: PathBuf, data: PathBuf },
}

/// An opened archive. Entry payloads come back decompressed.
pub trait BinderArchive {
    fn entry_count(&self) -> usize;

    fn entry_name(
        &self,
        index: usize,
    ) -> &str;

    fn read_entry(
        &self,
        index: usize,
    ) -> Result<Vec<u8>, LoadError>;
}

/// Opens binders for a given dialect and source layout. Implemented by the
/// format libraries.
pub trait BinderReaderFactory: Send + Sync {
    fn open(
        &self,
        dialect: BinderDialect,
        source: &BinderSource,
    ) -> Result<Box<dyn BinderArchive>, LoadError>;
}

/// Decides how a resolved archive path should be opened: the binder dialect
/// follows the game family, and a `bhd` header implies a split header+data
/// pair with the data half next to it as `<stem>.bdt`.
pub fn binder_open_request(
    game: GameFamily,
    real_path: &Path,
) -> (BinderDialect, BinderSource) {
    let dialect = if game.uses_legacy_binders() {
        BinderDialect::Legacy
    } else {
        BinderDialect::V4
    };

    let path_str = real_path.to_string_lossy();
    if path_str.len() >= 3 && path_str[path_str.len() - 3..].eq_ignore_ascii_case("bhd") {
        let mut data = path_str[..path_str.len() - 3].to_string();
        data.push_str("bdt");
        (
            dialect,
            BinderSource::Split {
                header: real_path.to_path_buf(),
                data: PathBuf::from(data),
            },
        )
    } else {
        (dialect, BinderSource::Single(real_path.to_path_buf()))
    }
}

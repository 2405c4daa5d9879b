use std::path::PathBuf;

use soulstudio_base::{GameFamily, VirtualPath};

/// A concrete filesystem location for a virtual path. `nested_binder_hint`
/// carries the inner archive name when the asset lives inside a binder that
/// is itself packed into another binder.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub nested_binder_hint: Option<String>,
}

/// Where an asset's texture container lives: the virtual base that slot
/// paths are joined onto, and the loose file holding the container.
#[derive(Debug, Clone)]
pub struct AetTexture {
    pub path_base: VirtualPath,
    pub file: PathBuf,
}

/// Translates virtual asset paths into concrete filesystem paths. Owned by
/// the host editor; this subsystem only consumes it.
pub trait AssetLocator: Send + Sync {
    fn virtual_to_real(
        &self,
        path: &VirtualPath,
    ) -> Option<ResolvedPath>;

    /// Forms the virtual path of an entry inside a binder.
    fn join_binder(
        &self,
        parent: &VirtualPath,
        entry_name: &str,
    ) -> VirtualPath;

    fn game_type(&self) -> GameFamily;

    fn game_root(&self) -> PathBuf;

    /// Looks up the texture container for an asset environment id.
    fn get_aet_texture(
        &self,
        aet_id: &str,
    ) -> Option<AetTexture>;

    /// Every known map id. Only exercised by tests.
    fn full_map_list(&self) -> Vec<String> {
        Vec::new()
    }
}

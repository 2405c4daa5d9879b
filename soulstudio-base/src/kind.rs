use std::fmt;
use std::ops::BitOr;

/// The resource families this subsystem knows how to route and install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Flver,
    CollisionHkx,
    Navmesh,
    NavmeshHkx,
    Texture,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Flver,
        ResourceKind::CollisionHkx,
        ResourceKind::Navmesh,
        ResourceKind::NavmeshHkx,
        ResourceKind::Texture,
    ];

    fn bit(self) -> u8 {
        match self {
            ResourceKind::Flver => 1 << 0,
            ResourceKind::CollisionHkx => 1 << 1,
            ResourceKind::Navmesh => 1 << 2,
            ResourceKind::NavmeshHkx => 1 << 3,
            ResourceKind::Texture => 1 << 4,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            ResourceKind::Flver => "flver",
            ResourceKind::CollisionHkx => "collision_hkx",
            ResourceKind::Navmesh => "navmesh",
            ResourceKind::NavmeshHkx => "navmesh_hkx",
            ResourceKind::Texture => "texture",
        };
        name.fmt(f)
    }
}

/// Bitmask over [`ResourceKind`] used to filter what archive expansion posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKindMask(u8);

impl ResourceKindMask {
    pub const NONE: ResourceKindMask = ResourceKindMask(0);
    pub const ALL: ResourceKindMask = ResourceKindMask(0x1f);

    pub fn only(kind: ResourceKind) -> ResourceKindMask {
        ResourceKindMask(kind.bit())
    }

    pub fn contains(
        self,
        kind: ResourceKind,
    ) -> bool {
        self.0 & kind.bit() != 0
    }
}

impl BitOr for ResourceKindMask {
    type Output = ResourceKindMask;

    fn bitor(
        self,
        rhs: ResourceKindMask,
    ) -> ResourceKindMask {
        ResourceKindMask(self.0 | rhs.0)
    }
}

impl From<ResourceKind> for ResourceKindMask {
    fn from(kind: ResourceKind) -> Self {
        ResourceKindMask::only(kind)
    }
}

/// Whether a binder entry name refers to a texture container rather than a
/// resource handled by a kind pipeline.
pub fn is_texture_container(entry_name: &str) -> bool {
    let name = entry_name.to_ascii_lowercase();
    name.ends_with(".tpf") || name.ends_with(".tpf.dcx")
}

/// Selects the pipeline kind for a binder entry or loose file by extension,
/// honoring the caller's kind mask. `.hkx` is claimed by both collision and
/// navmesh data; collision wins when both bits are set.
pub fn kind_for_entry_name(
    entry_name: &str,
    mask: ResourceKindMask,
) -> Option<ResourceKind> {
    let name = entry_name.to_ascii_lowercase();

    let kind = if name.ends_with(".flver") || name.ends_with(".flv") || name.ends_with(".flv.dcx") {
        ResourceKind::Flver
    } else if name.ends_with(".nvm") {
        ResourceKind::Navmesh
    } else if name.ends_with(".hkx") || name.ends_with(".hkx.dcx") {
        if mask.contains(ResourceKind::CollisionHkx) {
            ResourceKind::CollisionHkx
        } else if mask.contains(ResourceKind::NavmeshHkx) {
            ResourceKind::NavmeshHkx
        } else {
            return None;
        }
    } else {
        return None;
    };

    if mask.contains(kind) {
        Some(kind)
    } else {
        None
    }
}

use std::fmt;
use std::sync::Arc;

/// Stable, game-independent identifier for an asset. Virtual paths are
/// case-insensitive; the canonical form stored here is lowercase, so equality
/// and hashing are case-insensitive by construction.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath(Arc<str>);

impl VirtualPath {
    pub fn new(path: &str) -> Self {
        if path.bytes().any(|b| b.is_ascii_uppercase()) {
            VirtualPath(Arc::from(path.to_ascii_lowercase()))
        } else {
            VirtualPath(Arc::from(path))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment, e.g. `c0001.flv` for `chr/c0001/c0001.flv`.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Everything before the last path segment, or `""` for a bare name.
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Appends a child segment, canonicalizing the child's case.
    pub fn join(
        &self,
        child: &str,
    ) -> VirtualPath {
        let mut joined = String::with_capacity(self.0.len() + child.len() + 1);
        joined.push_str(&self.0);
        if !joined.is_empty() && !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(child);
        VirtualPath::new(&joined)
    }

    pub fn starts_with(
        &self,
        prefix: &str,
    ) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Debug for VirtualPath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "VirtualPath({})", self.0)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for VirtualPath {
    fn from(path: &str) -> Self {
        VirtualPath::new(path)
    }
}

/// Map texture containers carry per-tile suffixes in their directory names
/// that must not appear in the slot virtual paths. For bases under `map/tex`:
/// a trailing four-digit tile suffix is dropped together with its separator,
/// otherwise a trailing `tex` segment loses its last four characters.
pub fn normalize_map_texture_base(base: &str) -> String {
    if base.starts_with("map/tex") {
        let tail_is_tile_number = base.len() >= 5
            && base[base.len() - 4..].bytes().all(|b| b.is_ascii_digit());
        if tail_is_tile_number {
            return base[..base.len() - 5].to_string();
        }
        if base.ends_with("tex") && base.len() >= 4 {
            return base[..base.len() - 4].to_string();
        }
    }
    base.to_string()
}

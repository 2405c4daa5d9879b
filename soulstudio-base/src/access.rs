/// The capability a loaded resource was decoded for. `EditOnly` keeps the
/// CPU-side structures mutable, `GpuOptimizedOnly` keeps only the packed
/// GPU-facing form, `Full` keeps both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessLevel {
    Unloaded,
    EditOnly,
    GpuOptimizedOnly,
    Full,
}

impl AccessLevel {
    /// Whether a request for `self` is satisfied by a resource actually
    /// loaded at `actual`. `Full` satisfies any request; anything else
    /// satisfies only an exact match. `Unloaded` never satisfies anything.
    pub fn satisfied_by(
        self,
        actual: AccessLevel,
    ) -> bool {
        if actual == AccessLevel::Unloaded {
            return false;
        }
        actual == AccessLevel::Full || self == actual
    }
}

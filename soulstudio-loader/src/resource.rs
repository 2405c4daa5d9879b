use downcast_rs::{impl_downcast, Downcast};
use soulstudio_base::ResourceKind;

/// Decoded payload data produced by a [`Decoder`](crate::decode::Decoder).
/// Implementations own whatever CPU or GPU side state the decode produced;
/// dropping the value must release it.
pub trait ResourceData: Downcast + Send {}
impl_downcast!(ResourceData);

/// A decoded resource tagged with the kind that produced it. The kind tag is
/// what routes a reply back to the right database handle.
pub struct ResourcePayload {
    kind: ResourceKind,
    data: Box<dyn ResourceData>,
}

impl ResourcePayload {
    pub fn new(
        kind: ResourceKind,
        data: Box<dyn ResourceData>,
    ) -> Self {
        ResourcePayload { kind, data }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn data<T: ResourceData>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for ResourcePayload {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ResourcePayload")
            .field("kind", &self.kind)
            .finish()
    }
}

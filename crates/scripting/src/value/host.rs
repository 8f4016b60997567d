use super::Value;
use progs_core::ElementKind;
use std::fmt::Debug;

/// A domain object owned by the host application
///
/// Characters, items, locations and the other reference kinds live outside
/// the engine. Programs see them through this trait; property reads are
/// normally answered by [`dispatch`](crate::registry::dispatch) over the
/// same table that was registered with the
/// [`DotReferenceRegistryBuilder`](crate::registry::DotReferenceRegistryBuilder).
pub trait HostObject: Debug + Send + Sync {
    /// Concrete kind; must be a reference kind
    fn kind(&self) -> ElementKind;

    /// Identity within `kind`; two objects are equal when kind and id match
    fn id(&self) -> u64;

    fn name(&self) -> String;

    /// Case-insensitive property read, `None` when there is no such property
    fn get_property(&self, name: &str) -> Option<Value>;
}

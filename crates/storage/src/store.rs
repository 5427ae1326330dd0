//! The record store contract.

use alloc::vec::Vec;
use tessera_core::{DataId, Result, Value};
use tessera_query::{FragmentNode, QueryNode, UpdateConfig};

/// Options for applying a payload.
#[derive(Clone, Copy, Debug)]
pub struct UpdateOptions<'a> {
    /// Configs describing how to fold the payload into connections.
    pub configs: &'a [UpdateConfig],
    /// Whether the payload is a client-side guess rather than server data.
    pub is_optimistic: bool,
}

/// Describes a root call, e.g. `node(id: "123")` or `viewer`.
#[derive(Clone, Copy, Debug)]
pub struct RootCall<'a> {
    /// Root field name.
    pub field_name: &'a str,
    /// Identifying argument value, if any.
    pub identifying_arg: Option<&'a Value>,
}

/// A normalized record cache.
pub trait RecordStore {
    /// Applies `payload`, the response to `query`, to the records.
    fn apply_update(
        &mut self,
        query: &QueryNode,
        payload: &Value,
        options: &UpdateOptions<'_>,
    ) -> Result<()>;

    /// Resolves the record a root call refers to, if known.
    fn resolve_root_id(&self, call: &RootCall<'_>) -> Option<DataId>;

    /// Reads the data `fragment` selects on record `id`.
    fn read(&self, fragment: &FragmentNode, id: &str) -> Option<Value>;

    /// Reads `fragment` on every record in `ids`, in order.
    fn read_all(&self, fragment: &FragmentNode, ids: &[DataId]) -> Vec<Option<Value>> {
        ids.iter().map(|id| self.read(fragment, id)).collect()
    }
}

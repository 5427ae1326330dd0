//! Fragment pointers.
//!
//! A fragment pointer records which record a fragment was fetched for. It
//! lives inside an application-visible data object under `__fragments__`,
//! keyed by the fragment's identity, next to the primary record id under
//! `__dataID__`:
//!
//! ```text
//! {
//!   __dataID__: "123",
//!   __fragments__: { _TodoFragment0: "123", _TodoList1: ["1", "2"] }
//! }
//! ```
//!
//! One object can carry pointers for any number of fragments.

use crate::store::{RecordStore, RootCall};
use alloc::format;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;
use tessera_core::{DataId, Error, Object, Result, Value};
use tessera_query::{FragmentNode, QueryNode};

/// Key holding the primary record id of a data object.
pub const DATA_ID_KEY: &str = "__dataID__";

/// Key holding the fragment pointer map of a data object.
pub const FRAGMENTS_KEY: &str = "__fragments__";

/// Creates a data object pointing `fragment` at `data_id`.
pub fn create(data_id: &str, fragment: &FragmentNode) -> Object {
    let mut object = Object::new();
    object.insert(DATA_ID_KEY, data_id);
    add_fragment(&mut object, fragment, data_id);
    object
}

/// Creates a data object pointing a plural fragment at `data_ids`.
pub fn create_plural(data_ids: &[DataId], fragment: &FragmentNode) -> Object {
    let mut object = Object::new();
    insert_pointer(&mut object, fragment, ids_to_value(data_ids));
    object
}

/// Points `fragment` at `data_id` on an existing object.
///
/// Only the entry for this fragment changes; every other key of `target`,
/// including other fragments' pointers, is left as is.
pub fn add_fragment(target: &mut Object, fragment: &FragmentNode, data_id: &str) {
    insert_pointer(target, fragment, Value::from(data_id));
}

fn insert_pointer(target: &mut Object, fragment: &FragmentNode, pointer: Value) {
    let fragments = target.get_or_insert_with(FRAGMENTS_KEY, || Value::Object(Object::new()));
    if !matches!(fragments, Value::Object(_)) {
        *fragments = Value::Object(Object::new());
    }
    if let Value::Object(map) = fragments {
        map.insert(fragment.id().as_str(), pointer);
    }
}

fn ids_to_value(ids: &[DataId]) -> Value {
    Value::List(ids.iter().map(|id| Value::from(id.as_str())).collect())
}

fn pointer_entry<'a>(object: &'a Object, fragment: &FragmentNode) -> Result<Option<&'a Value>> {
    match object.get(FRAGMENTS_KEY) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(map.get(fragment.id().as_str())),
        Some(other) => Err(Error::invalid_pointer(
            fragment.name(),
            format!("`{}` is a {}, expected an object", FRAGMENTS_KEY, other.kind()),
        )),
    }
}

/// Reads the record id a singular fragment points at.
pub fn data_id(object: &Object, fragment: &FragmentNode) -> Result<Option<DataId>> {
    match pointer_entry(object, fragment)? {
        None => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.clone())),
        Some(other) => Err(Error::invalid_pointer(
            fragment.name(),
            format!("expected a single record id, found a {}", other.kind()),
        )),
    }
}

/// Reads the record ids a fragment points at. A singular pointer yields
/// one id.
pub fn data_ids(object: &Object, fragment: &FragmentNode) -> Result<Option<Vec<DataId>>> {
    match pointer_entry(object, fragment)? {
        None => Ok(None),
        Some(Value::String(id)) => Ok(Some(vec![id.clone()])),
        Some(Value::List(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::invalid_pointer(
                        fragment.name(),
                        format!("expected record ids, found a {}", item.kind()),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(other) => Err(Error::invalid_pointer(
            fragment.name(),
            format!("expected record ids, found a {}", other.kind()),
        )),
    }
}

/// Creates the data object for a root query's single fragment.
///
/// The root must select exactly one fragment and no fields, and must not
/// depend on a batch call variable. Returns `None` when the root call
/// resolves to no record, e.g. because it was never fetched.
pub fn create_for_root<S>(store: &S, root: &QueryNode) -> Result<Option<Object>>
where
    S: RecordStore + ?Sized,
{
    let query = root.as_root().ok_or_else(|| {
        Error::unexpected_node("create_for_root", "root", root.kind().as_str())
    })?;

    if let Some(field) = query.children().iter().find_map(QueryNode::as_field) {
        return Err(Error::root_field(query.name(), field.schema_name()));
    }
    let fragments: Vec<&FragmentNode> = query
        .children()
        .iter()
        .filter_map(QueryNode::as_fragment)
        .collect();
    let fragment = match fragments.as_slice() {
        [fragment] => *fragment,
        _ => return Err(Error::root_fragment_count(query.name(), fragments.len())),
    };
    if let Some(batch) = query.batch_call() {
        return Err(Error::batch_call_variable(query.name(), batch.ref_param_name.as_str()));
    }

    match query.identifying_arg() {
        Some(Value::List(args)) => {
            let ids: Vec<DataId> = args
                .iter()
                .filter_map(|arg| {
                    store.resolve_root_id(&RootCall {
                        field_name: query.field_name(),
                        identifying_arg: Some(arg),
                    })
                })
                .collect();
            if ids.is_empty() {
                return Ok(None);
            }
            Ok(Some(create_plural(&ids, fragment)))
        }
        arg => {
            let resolved = store.resolve_root_id(&RootCall {
                field_name: query.field_name(),
                identifying_arg: arg,
            });
            Ok(resolved.map(|id| create(&id, fragment)))
        }
    }
}

//! In-memory normalized record cache.
//!
//! This module provides `MemoryStore`, a `RecordStore` that keeps every
//! record once, keyed by its id. Nested objects carrying an `id` are split
//! out into their own records and replaced by `{__dataID__: id}` references.

use crate::fragment_pointer::DATA_ID_KEY;
use crate::store::{RecordStore, RootCall, UpdateOptions};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::HashMap;
use tessera_core::{DataId, Error, Object, Result, Value};
use tessera_query::{FieldNode, FragmentNode, QueryNode, RangeOperation, UpdateConfig};
use tracing::{debug, warn};

/// Field carrying a record's identity in server payloads.
const ID_FIELD: &str = "id";

/// Root field whose identifying argument is the record id itself.
const NODE_ROOT_FIELD: &str = "node";

/// Normalized record cache.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    /// Record id → record fields.
    records: HashMap<DataId, Object>,
    /// Root call key → record id.
    root_calls: HashMap<String, DataId>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks if a record exists.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Gets a record's normalized fields.
    pub fn record(&self, id: &str) -> Option<&Object> {
        self.records.get(id)
    }

    /// Writes a record, merging into any existing fields.
    pub fn put_record(&mut self, id: impl Into<DataId>, fields: Object) {
        let id = id.into();
        let normalized = self.normalize_object(&fields);
        self.merge_record(id, normalized);
    }

    /// Associates a root call with the record it returns.
    pub fn register_root_call(
        &mut self,
        field_name: &str,
        identifying_arg: Option<&Value>,
        id: impl Into<DataId>,
    ) {
        self.root_calls
            .insert(root_call_key(field_name, identifying_arg), id.into());
    }

    /// Returns the ids in `parent.connection`, in order.
    pub fn connection_ids(&self, parent_id: &str, connection: &str) -> Vec<DataId> {
        self.records
            .get(parent_id)
            .and_then(|record| record.get(connection))
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(reference_id).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Removes every record and root call.
    pub fn clear(&mut self) {
        self.records.clear();
        self.root_calls.clear();
    }

    fn merge_record(&mut self, id: DataId, fields: Object) {
        self.records
            .entry(id)
            .and_modify(|record| record.extend_from(&fields))
            .or_insert(fields);
    }

    fn normalize(&mut self, value: &Value) -> Value {
        match value {
            Value::Object(object) => {
                let normalized = self.normalize_object(object);
                match object.get(ID_FIELD).and_then(Value::as_str) {
                    Some(id) => {
                        self.merge_record(id.to_string(), normalized);
                        reference(id)
                    }
                    None => Value::Object(normalized),
                }
            }
            Value::List(items) => Value::List(items.iter().map(|item| self.normalize(item)).collect()),
            scalar => scalar.clone(),
        }
    }

    fn normalize_object(&mut self, object: &Object) -> Object {
        object
            .iter()
            .map(|(key, value)| (key.to_string(), self.normalize(value)))
            .collect()
    }

    fn apply_edit(&mut self, edit: ConnectionEdit<'_>) {
        match edit {
            ConnectionEdit::Insert {
                parent_id,
                connection,
                node_id,
                operation,
            } => self.update_connection(parent_id, connection, node_id, operation),
            ConnectionEdit::Remove {
                parent_id,
                connection,
                ids,
                delete_records,
            } => {
                for id in ids {
                    self.update_connection(parent_id, connection, &id, RangeOperation::Remove);
                    if delete_records {
                        self.records.remove(&id);
                        debug!(id = %id, "store.node_delete.removed");
                    }
                }
            }
        }
    }

    fn update_connection(
        &mut self,
        parent_id: &str,
        connection: &str,
        node_id: &str,
        operation: RangeOperation,
    ) {
        let Some(parent) = self.records.get_mut(parent_id) else {
            warn!(parent = %parent_id, connection = %connection, "store.connection.missing_parent");
            return;
        };
        if operation == RangeOperation::Refetch {
            parent.remove(connection);
            debug!(parent = %parent_id, connection = %connection, "store.connection.stale");
            return;
        }

        let items = parent.get_or_insert_with(connection, || Value::List(Vec::new()));
        if !items.is_list() {
            *items = Value::List(Vec::new());
        }
        let Value::List(items) = items else {
            return;
        };
        let position = items.iter().position(|item| reference_id(item) == Some(node_id));
        match (operation, position) {
            (RangeOperation::Append, None) => items.push(reference(node_id)),
            (RangeOperation::Prepend, None) => items.insert(0, reference(node_id)),
            (RangeOperation::Remove, Some(index)) => {
                items.remove(index);
            }
            _ => {}
        }
    }

    fn project(&self, selections: &[QueryNode], source: &Object, out: &mut Object) {
        for selection in selections {
            match selection {
                QueryNode::Field(field) => {
                    let key = field.serialization_key();
                    if let Some(value) = source.get(key) {
                        out.insert(key, self.resolve(field, value));
                    }
                }
                QueryNode::Fragment(fragment) => self.project(fragment.children(), source, out),
                QueryNode::Root(_) | QueryNode::Subscription(_) => {}
            }
        }
    }

    fn resolve(&self, field: &FieldNode, value: &Value) -> Value {
        if field.children().is_empty() {
            return match reference_id(value) {
                Some(id) => Value::from(id),
                None => value.clone(),
            };
        }
        match value {
            Value::List(items) => Value::List(items.iter().map(|item| self.resolve(field, item)).collect()),
            Value::Object(object) => match reference_id(value) {
                Some(id) => self
                    .read_selections(field.children(), id)
                    .unwrap_or(Value::Null),
                None => {
                    let mut out = Object::new();
                    self.project(field.children(), object, &mut out);
                    Value::Object(out)
                }
            },
            scalar => scalar.clone(),
        }
    }

    fn read_selections(&self, selections: &[QueryNode], id: &str) -> Option<Value> {
        let record = self.records.get(id)?;
        let mut out = Object::new();
        out.insert(DATA_ID_KEY, id);
        self.project(selections, record, &mut out);
        Some(Value::Object(out))
    }
}

impl RecordStore for MemoryStore {
    fn apply_update(
        &mut self,
        query: &QueryNode,
        payload: &Value,
        options: &UpdateOptions<'_>,
    ) -> Result<()> {
        if options.is_optimistic {
            return Err(Error::store("optimistic updates are not supported by MemoryStore"));
        }
        let payload = match payload {
            Value::Null => return Ok(()),
            Value::Object(object) => object,
            other => {
                return Err(Error::store(format!(
                    "expected an object payload, got a {}",
                    other.kind()
                )))
            }
        };

        // Every config is checked before anything is written.
        let edits = options
            .configs
            .iter()
            .map(|config| plan_edit(config, payload))
            .collect::<Result<Vec<_>>>()?;

        for (_, value) in payload.iter() {
            self.normalize(value);
        }
        for edit in edits.into_iter().flatten() {
            self.apply_edit(edit);
        }

        debug!(
            call = query.call_name().unwrap_or_default(),
            configs = options.configs.len(),
            records = self.records.len(),
            "store.update.applied"
        );
        Ok(())
    }

    fn resolve_root_id(&self, call: &RootCall<'_>) -> Option<DataId> {
        if call.field_name == NODE_ROOT_FIELD {
            if let Some(Value::String(id)) = call.identifying_arg {
                return Some(id.clone());
            }
        }
        self.root_calls
            .get(&root_call_key(call.field_name, call.identifying_arg))
            .cloned()
    }

    fn read(&self, fragment: &FragmentNode, id: &str) -> Option<Value> {
        self.read_selections(fragment.children(), id)
    }
}

/// A connection change derived from one config and a payload.
enum ConnectionEdit<'a> {
    Insert {
        parent_id: &'a str,
        connection: &'a str,
        node_id: &'a str,
        operation: RangeOperation,
    },
    Remove {
        parent_id: &'a str,
        connection: &'a str,
        ids: Vec<DataId>,
        delete_records: bool,
    },
}

/// Works out what `config` does with `payload` without touching the store.
fn plan_edit<'a>(config: &'a UpdateConfig, payload: &'a Object) -> Result<Option<ConnectionEdit<'a>>> {
    match config {
        UpdateConfig::RangeAdd {
            parent_id,
            connection_name,
            edge_name,
            range_behaviors,
            ..
        } => {
            let node_id = payload
                .get(edge_name)
                .and_then(|edge| edge.get("node"))
                .and_then(|node| node.get(ID_FIELD))
                .and_then(Value::as_str);
            let Some(node_id) = node_id else {
                warn!(edge = %edge_name, "store.range_add.missing_edge");
                return Ok(None);
            };
            // Connections are stored without call arguments.
            let call_key = "";
            let operation = range_behaviors
                .get(call_key)
                .copied()
                .ok_or_else(|| Error::missing_range_behavior(connection_name.as_str(), call_key))?;
            Ok(Some(ConnectionEdit::Insert {
                parent_id,
                connection: connection_name,
                node_id,
                operation,
            }))
        }
        UpdateConfig::NodeDelete {
            parent_id,
            connection_name,
            deleted_id_field_name,
            ..
        } => Ok(Some(ConnectionEdit::Remove {
            parent_id,
            connection: connection_name,
            ids: deleted_ids(payload, "NODE_DELETE", deleted_id_field_name)?,
            delete_records: true,
        })),
        UpdateConfig::RangeDelete {
            parent_id,
            connection_name,
            deleted_id_field_name,
            path_to_connection,
            ..
        } => Ok(Some(ConnectionEdit::Remove {
            parent_id,
            connection: path_to_connection.last().unwrap_or(connection_name),
            ids: deleted_ids(payload, "RANGE_DELETE", deleted_id_field_name)?,
            delete_records: false,
        })),
        UpdateConfig::RequiredChildren { .. } | UpdateConfig::FieldsChange { .. } => Ok(None),
    }
}

fn root_call_key(field_name: &str, identifying_arg: Option<&Value>) -> String {
    match identifying_arg {
        Some(arg) => format!("{}({})", field_name, arg),
        None => field_name.to_string(),
    }
}

fn reference(id: &str) -> Value {
    let mut object = Object::with_capacity(1);
    object.insert(DATA_ID_KEY, id);
    Value::Object(object)
}

fn reference_id(value: &Value) -> Option<&str> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.get(DATA_ID_KEY).and_then(Value::as_str)
}

fn deleted_ids(payload: &Object, config: &'static str, field: &str) -> Result<Vec<DataId>> {
    match payload.get(field) {
        Some(Value::String(id)) => Ok(vec![id.clone()]),
        Some(Value::List(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::missing_deleted_id(config, field))
            })
            .collect(),
        _ => Err(Error::missing_deleted_id(config, field)),
    }
}

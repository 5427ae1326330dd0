//! Prop resolution.
//!
//! Props handed to a subscription carry fragment pointers rather than
//! data. `resolve_props` swaps each pointer for the data its fragment reads
//! from the store.

use crate::subscription::Subscription;
use alloc::format;
use alloc::vec::Vec;
use tessera_core::{DataId, Diagnostic, DiagnosticKind, Error, Object, Result, Value};
use tessera_storage::{fragment_pointer, RecordStore};
use tracing::warn;

/// Props with fragment data filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedProps {
    pub props: Object,
    pub diagnostics: Vec<Diagnostic>,
}

/// Reads the data behind every fragment prop of `subscription`.
///
/// Props for undeclared names pass through untouched, as do `Null` props.
/// A missing prop or a singular prop without a pointer is reported as a
/// diagnostic; the mock data diagnostic is raised at most once per call.
pub fn resolve_props<S>(store: &S, subscription: &dyn Subscription, props: &Object) -> Result<ResolvedProps>
where
    S: RecordStore + ?Sized,
{
    let name = subscription.name();
    let mut resolved = props.clone();
    let mut diagnostics = Vec::new();
    let mut reported_mock_data = false;

    for (prop, node) in subscription.declared_fragments() {
        let fragment = node.as_fragment().ok_or_else(|| {
            Error::unexpected_node("resolve_props", "fragment", node.kind().as_str())
        })?;

        let value = match props.get(&prop) {
            None => {
                warn!(subscription = %name, prop = %prop, "subscription.props.missing");
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingFragmentData,
                    format!(
                        "Expected data for fragment `{}` to be supplied to `{}` as a prop. \
                         Pass an explicit `null` if this is intentional.",
                        prop, name
                    ),
                ));
                continue;
            }
            Some(Value::Null) => continue,
            Some(value) => value,
        };

        if fragment.is_plural() {
            let items = value.as_list().ok_or_else(|| {
                Error::invalid_prop(
                    name,
                    prop.as_str(),
                    "expected an array of records because the corresponding fragment is plural",
                )
            })?;
            let mut ids: Vec<DataId> = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let pointed = match item.as_object() {
                    Some(object) => fragment_pointer::data_ids(object, fragment)?,
                    None => None,
                };
                let pointed = pointed.ok_or_else(|| {
                    Error::invalid_prop(
                        name,
                        prop.as_str(),
                        format!("expected element at index {} to have query data", index),
                    )
                })?;
                ids.extend(pointed);
            }
            let data = store
                .read_all(fragment, &ids)
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect();
            resolved.insert(prop, Value::List(data));
        } else {
            if value.is_list() {
                return Err(Error::invalid_prop(
                    name,
                    prop.as_str(),
                    "expected a single record because the corresponding fragment is not plural",
                ));
            }
            let pointed = match value.as_object() {
                Some(object) => fragment_pointer::data_id(object, fragment)?,
                None => None,
            };
            match pointed {
                Some(id) => {
                    let data = store.read(fragment, &id).unwrap_or_default();
                    resolved.insert(prop, data);
                }
                None if !reported_mock_data => {
                    reported_mock_data = true;
                    warn!(subscription = %name, prop = %prop, "subscription.props.mock_data");
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::MockData,
                        format!(
                            "Expected prop `{}` supplied to `{}` to be data fetched by the \
                             store. This is likely an error unless you are purposely passing \
                             in mock data that conforms to the shape of this subscription's \
                             fragment.",
                            prop, name
                        ),
                    ));
                }
                None => {}
            }
        }
    }

    Ok(ResolvedProps {
        props: resolved,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use tessera_query::{QueryNode, SubscriptionNode, UpdateConfig};
    use tessera_storage::MemoryStore;

    struct ProfileSubscription;

    impl Subscription for ProfileSubscription {
        fn name(&self) -> &str {
            "ProfileSubscription"
        }

        fn subscription(&self) -> QueryNode {
            SubscriptionNode::declare("ProfileSubscription", "profileSubscribe", "ProfileSubscribeInput", vec![])
        }

        fn configs(&self) -> Vec<UpdateConfig> {
            Vec::new()
        }

        fn variables(&self) -> Object {
            Object::new()
        }

        fn fragments(&self) -> Vec<(String, QueryNode)> {
            let name = QueryNode::field("name", "String", vec![]);
            vec![
                ("user".to_string(), QueryNode::fragment("User", "User", vec![name.clone()])),
                ("friends".to_string(), QueryNode::plural_fragment("Friends", "User", vec![name])),
            ]
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.put_record("1", Object::from_iter([("name", "Ada")]));
        store.put_record("2", Object::from_iter([("name", "Grace")]));
        store.put_record("3", Object::from_iter([("name", "Barbara")]));
        store
    }

    fn pointer(prop: &str, id: &str) -> Value {
        let node = ProfileSubscription.fragment(prop).unwrap();
        Value::Object(fragment_pointer::create(id, node.as_fragment().unwrap()))
    }

    #[test]
    fn test_resolves_singular_and_plural() {
        let subscription = ProfileSubscription;
        let props = Object::from_iter([
            ("user", pointer("user", "1")),
            (
                "friends",
                Value::List(vec![pointer("friends", "2"), pointer("friends", "3")]),
            ),
            ("extra", Value::from(42i64)),
        ]);

        let resolved = resolve_props(&store(), &subscription, &props).unwrap();
        assert!(resolved.diagnostics.is_empty());
        assert_eq!(resolved.props.get("extra"), Some(&Value::from(42i64)));
        assert_eq!(
            resolved.props.get("user").and_then(|u| u.get("name")),
            Some(&Value::from("Ada"))
        );
        let friends = resolved.props.get("friends").and_then(Value::as_list).unwrap();
        let names: Vec<_> = friends.iter().filter_map(|f| f.get("name")).collect();
        assert_eq!(names, vec![&Value::from("Grace"), &Value::from("Barbara")]);
    }

    #[test]
    fn test_pointer_from_rebuilt_fragment_resolves() {
        let subscription = ProfileSubscription;
        let user = subscription.fragment("user").unwrap();
        let props = Object::from_iter([
            ("user", Value::Object(fragment_pointer::create("1", user.as_fragment().unwrap()))),
            ("friends", Value::Null),
        ]);

        let resolved = resolve_props(&store(), &subscription, &props).unwrap();
        assert!(resolved.diagnostics.is_empty());
        assert_eq!(
            resolved.props.get("user").and_then(|u| u.get("name")),
            Some(&Value::from("Ada"))
        );
    }

    #[test]
    fn test_missing_prop_warns_and_null_is_kept() {
        let subscription = ProfileSubscription;
        let props = Object::from_iter([("friends", Value::Null)]);

        let resolved = resolve_props(&store(), &subscription, &props).unwrap();
        assert_eq!(resolved.diagnostics.len(), 1);
        assert_eq!(resolved.diagnostics[0].kind, DiagnosticKind::MissingFragmentData);
        assert!(resolved.diagnostics[0].message.contains("`user`"));
        assert_eq!(resolved.props.get("friends"), Some(&Value::Null));
        assert!(!resolved.props.contains_key("user"));
    }

    #[test]
    fn test_plural_prop_must_be_a_list() {
        let subscription = ProfileSubscription;
        let props = Object::from_iter([
            ("user", Value::Null),
            ("friends", pointer("friends", "2")),
        ]);

        let err = resolve_props(&store(), &subscription, &props).unwrap_err();
        assert!(matches!(err, Error::InvalidProp { ref prop, .. } if prop == "friends"));
    }

    #[test]
    fn test_plural_elements_need_pointers() {
        let subscription = ProfileSubscription;
        let props = Object::from_iter([
            ("user", Value::Null),
            (
                "friends",
                Value::List(vec![pointer("friends", "2"), Value::Object(Object::new())]),
            ),
        ]);

        let err = resolve_props(&store(), &subscription, &props).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid prop `friends` supplied to `ProfileSubscription`, \
             expected element at index 1 to have query data."
        );
    }

    #[test]
    fn test_singular_prop_must_not_be_a_list() {
        let subscription = ProfileSubscription;
        let props = Object::from_iter([
            ("user", Value::List(vec![])),
            ("friends", Value::Null),
        ]);

        let err = resolve_props(&store(), &subscription, &props).unwrap_err();
        assert!(matches!(err, Error::InvalidProp { ref prop, .. } if prop == "user"));
    }

    #[test]
    fn test_mock_data_passes_through() {
        let subscription = ProfileSubscription;
        let mock = Value::Object(Object::from_iter([("name", "Mock")]));
        let props = Object::from_iter([("user", mock.clone()), ("friends", Value::Null)]);

        let resolved = resolve_props(&store(), &subscription, &props).unwrap();
        assert_eq!(resolved.props.get("user"), Some(&mock));
        assert_eq!(resolved.diagnostics.len(), 1);
        assert_eq!(resolved.diagnostics[0].kind, DiagnosticKind::MockData);
    }
}

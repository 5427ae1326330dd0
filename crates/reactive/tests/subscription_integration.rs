//! End-to-end tests for activated subscriptions.
//!
//! A recording transport stands in for the network: it keeps every request
//! so the test can push responses through the request's sink, and counts
//! how often each subscription is torn down.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tessera_core::{DiagnosticKind, Error, Object, SequentialIdSource, Value};
use tessera_query::{
    range_behavior, FieldBuilder, QueryNode, RangeOperation, SubscriptionNode, UpdateConfig,
};
use tessera_reactive::{
    Disposable, Subscription, SubscriptionActivator, SubscriptionCallbacks, SubscriptionRequest,
    Transport, TransportError,
};
use tessera_storage::{MemoryStore, RecordStore};

#[derive(Default)]
struct RecordingTransport {
    requests: RefCell<Vec<SubscriptionRequest>>,
    released: Rc<Cell<usize>>,
    refuse: Option<String>,
}

impl Transport for RecordingTransport {
    fn send_subscription(
        &self,
        request: SubscriptionRequest,
    ) -> Result<Box<dyn Disposable>, TransportError> {
        if let Some(reason) = &self.refuse {
            return Err(TransportError::new(reason.as_str()));
        }
        self.requests.borrow_mut().push(request);
        let released = self.released.clone();
        Ok(Box::new(move || released.set(released.get() + 1)))
    }
}

impl RecordingTransport {
    fn request(&self, index: usize) -> SubscriptionRequest {
        self.requests.borrow()[index].clone()
    }
}

struct AddTodoSubscription {
    configs: Vec<UpdateConfig>,
}

impl AddTodoSubscription {
    fn new() -> Self {
        Self {
            configs: vec![UpdateConfig::range_add(
                "viewer",
                "viewer:1",
                "todos",
                "todoEdge",
                range_behavior("", RangeOperation::Append),
            )],
        }
    }
}

impl Subscription for AddTodoSubscription {
    fn name(&self) -> &str {
        "AddTodoSubscription"
    }

    fn subscription(&self) -> QueryNode {
        let node = QueryNode::field(
            "node",
            "Todo",
            vec![QueryNode::field("id", "ID", vec![]), QueryNode::field("text", "String", vec![])],
        );
        SubscriptionNode::declare(
            "AddTodoSubscription",
            "addTodoSubscribe",
            "AddTodoSubscribeInput",
            vec![FieldBuilder::new("todoEdge").type_name("TodoEdge").child(node).build()],
        )
    }

    fn configs(&self) -> Vec<UpdateConfig> {
        self.configs.clone()
    }

    fn variables(&self) -> Object {
        Object::from_iter([("text", "buy milk")])
    }
}

fn todo_store() -> Rc<RefCell<MemoryStore>> {
    let mut store = MemoryStore::new();
    store.put_record(
        "viewer:1",
        Object::from_iter([("id", Value::from("viewer:1")), ("todos", Value::List(vec![]))]),
    );
    Rc::new(RefCell::new(store))
}

fn response(client_subscription_id: &str, todo_id: &str) -> Value {
    let node = Object::from_iter([
        ("__typename", "Todo"),
        ("id", todo_id),
        ("text", "buy milk"),
    ]);
    let edge = Object::from_iter([
        ("__typename", Value::from("TodoEdge")),
        ("cursor", Value::from("cursor:1")),
        ("node", Value::Object(node)),
    ]);
    let payload = Object::from_iter([
        ("clientSubscriptionId", Value::from(client_subscription_id)),
        ("todoEdge", Value::Object(edge)),
    ]);
    Value::Object(Object::from_iter([("addTodoSubscribe", Value::Object(payload))]))
}

#[test]
fn test_range_add_reaches_store_before_callback() {
    let store = todo_store();
    let activator = SubscriptionActivator::new(store.clone(), RecordingTransport::default())
        .with_id_source(SequentialIdSource::starting_at(61));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let (reader, seen_in_callback) = (store.clone(), seen.clone());
    let callbacks = SubscriptionCallbacks::new().on_next(move |_| {
        seen_in_callback
            .borrow_mut()
            .push(reader.borrow().connection_ids("viewer:1", "todos"));
        Ok(())
    });

    let handle = activator
        .activate(Rc::new(AddTodoSubscription::new()), callbacks)
        .unwrap();
    assert_eq!(handle.client_subscription_id().as_str(), "Z");
    assert_eq!(activator.transport().requests.borrow().len(), 1);

    let request = activator.transport().request(0);
    assert_eq!(
        request.variables().get("clientSubscriptionId"),
        Some(&Value::from("Z"))
    );
    assert_eq!(
        request.query_text().unwrap(),
        "subscription AddTodoSubscription($input:AddTodoSubscribeInput!)\
         {addTodoSubscribe(input:$input){todoEdge{node{id,text},__typename},clientSubscriptionId}}"
    );

    request.sink().on_next(response("Z", "todo:1")).unwrap();

    assert_eq!(*seen.borrow(), vec![vec!["todo:1".to_string()]]);
    let todo = QueryNode::fragment("Todo", "Todo", vec![QueryNode::field("text", "String", vec![])]);
    let data = store.borrow().read(todo.as_fragment().unwrap(), "todo:1").unwrap();
    assert_eq!(data.get("text"), Some(&Value::from("buy milk")));
}

#[test]
fn test_next_callback_receives_call_payload() {
    let activator = SubscriptionActivator::new(todo_store(), RecordingTransport::default());
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = received.clone();
    activator
        .activate(
            Rc::new(AddTodoSubscription::new()),
            SubscriptionCallbacks::new().on_next(move |payload| {
                sink.borrow_mut().push(payload.clone());
                Ok(())
            }),
        )
        .unwrap();

    let response = response("0", "todo:1");
    activator
        .transport()
        .request(0)
        .sink()
        .on_next(response.clone())
        .unwrap();

    let expected = response.get("addTodoSubscribe").cloned().unwrap();
    assert_eq!(*received.borrow(), vec![expected]);
}

#[test]
fn test_dispose_before_payload_drops_events() {
    let store = todo_store();
    let transport = RecordingTransport::default();
    let released = transport.released.clone();
    let activator = SubscriptionActivator::new(store.clone(), transport);

    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let callbacks = SubscriptionCallbacks::new().on_next(move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    });
    let handle = activator
        .activate(Rc::new(AddTodoSubscription::new()), callbacks)
        .unwrap();

    handle.dispose();
    let request = activator.transport().request(0);
    request
        .sink()
        .on_next(response(handle.client_subscription_id().as_str(), "todo:1"))
        .unwrap();

    assert!(handle.is_disposed());
    assert_eq!(released.get(), 1);
    assert_eq!(calls.get(), 0);
    assert!(store.borrow().connection_ids("viewer:1", "todos").is_empty());
}

#[test]
fn test_repeated_dispose_releases_once() {
    let transport = RecordingTransport::default();
    let released = transport.released.clone();
    let activator = SubscriptionActivator::new(todo_store(), transport);
    let handle = activator
        .activate(Rc::new(AddTodoSubscription::new()), SubscriptionCallbacks::new())
        .unwrap();

    for _ in 0..4 {
        handle.dispose();
    }
    activator.transport().request(0).sink().on_completed().unwrap();

    assert_eq!(released.get(), 1);
}

#[test]
fn test_completion_releases_transport() {
    let transport = RecordingTransport::default();
    let released = transport.released.clone();
    let activator = SubscriptionActivator::new(todo_store(), transport);

    let completed = Rc::new(Cell::new(false));
    let flag = completed.clone();
    let handle = activator
        .activate(
            Rc::new(AddTodoSubscription::new()),
            SubscriptionCallbacks::new().on_completed(move || {
                flag.set(true);
                Ok(())
            }),
        )
        .unwrap();

    activator.transport().request(0).sink().on_completed().unwrap();

    assert!(completed.get());
    assert!(handle.is_disposed());
    assert_eq!(released.get(), 1);
}

#[test]
fn test_refused_request_reaches_error_callback() {
    let transport = RecordingTransport {
        refuse: Some("offline".to_string()),
        ..RecordingTransport::default()
    };
    let activator = SubscriptionActivator::new(todo_store(), transport);

    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = errors.clone();
    let handle = activator
        .activate(
            Rc::new(AddTodoSubscription::new()),
            SubscriptionCallbacks::new().on_error(move |err| {
                sink.borrow_mut().push(err.message().to_string());
                Ok(())
            }),
        )
        .unwrap();

    assert_eq!(*errors.borrow(), vec!["offline"]);
    assert!(handle.is_disposed());
}

#[test]
fn test_failing_callback_disposes_subscription() {
    let transport = RecordingTransport::default();
    let released = transport.released.clone();
    let activator = SubscriptionActivator::new(todo_store(), transport);
    let handle = activator
        .activate(
            Rc::new(AddTodoSubscription::new()),
            SubscriptionCallbacks::new().on_next(|_| Err(Error::callback("render failed"))),
        )
        .unwrap();

    let err = activator
        .transport()
        .request(0)
        .sink()
        .on_next(response("0", "todo:1"))
        .unwrap_err();

    assert_eq!(err, Error::callback("render failed"));
    assert!(handle.is_disposed());
    assert_eq!(released.get(), 1);
}

#[test]
fn test_missing_edge_fails_activation() {
    let subscription = AddTodoSubscription {
        configs: vec![UpdateConfig::range_add(
            "viewer",
            "viewer:1",
            "todos",
            "userEdge",
            range_behavior("", RangeOperation::Append),
        )],
    };
    let activator = SubscriptionActivator::new(todo_store(), RecordingTransport::default());

    let err = activator
        .activate(Rc::new(subscription), SubscriptionCallbacks::new())
        .unwrap_err();

    assert_eq!(err, Error::missing_edge_field("userEdge"));
    assert!(activator.transport().requests.borrow().is_empty());
}

#[test]
fn test_ignored_configs_surface_as_diagnostics() {
    let subscription = AddTodoSubscription {
        configs: vec![UpdateConfig::RequiredChildren { children: vec![] }],
    };
    let activator = SubscriptionActivator::new(todo_store(), RecordingTransport::default());

    let handle = activator
        .activate(Rc::new(subscription), SubscriptionCallbacks::new())
        .unwrap();

    assert_eq!(handle.diagnostics().len(), 1);
    assert_eq!(handle.diagnostics()[0].kind, DiagnosticKind::ConfigIgnored);
}

//! Query tree nodes.
//!
//! Nodes are immutable and reference counted, so subtrees are shared between
//! parents. Rewriting a node means cloning it with a new child list via
//! `QueryNode::clone_with_children`; the original is never touched.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use tessera_core::{FragmentId, Object, Value};

/// The kind of a query node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Subscription,
    Field,
    Fragment,
}

impl NodeKind {
    /// Returns the kind's name, for messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Subscription => "subscription",
            NodeKind::Field => "field",
            NodeKind::Fragment => "fragment",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value passed to a call argument.
#[derive(Clone, Debug, PartialEq)]
pub enum CallValue {
    /// An inline literal.
    Literal(Value),
    /// A reference to a query variable.
    Variable(String),
}

/// A call (argument) on a field, e.g. `first: 10`.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub name: String,
    pub value: CallValue,
}

impl Call {
    /// Creates a call with a literal value.
    pub fn literal(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: CallValue::Literal(value.into()),
        }
    }

    /// Creates a call bound to a variable.
    pub fn variable(name: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: CallValue::Variable(variable.into()),
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            CallValue::Literal(value) => write!(f, "{}:{}", self.name, value),
            CallValue::Variable(variable) => write!(f, "{}:${}", self.name, variable),
        }
    }
}

/// Metadata flags carried by a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldMetadata {
    /// The field must always be fetched, even if no component asked for it.
    pub is_requisite: bool,
    /// The field returns a list.
    pub is_plural: bool,
    /// The field was inserted by the client, not declared by the user.
    pub is_generated: bool,
}

/// A field selection.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldNode {
    schema_name: String,
    alias: Option<String>,
    type_name: String,
    calls: Vec<Call>,
    metadata: FieldMetadata,
    children: Vec<QueryNode>,
}

impl FieldNode {
    /// Name of the field in the schema.
    #[inline]
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// The alias, if any.
    #[inline]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Key under which the server returns this field: the alias if present.
    pub fn serialization_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.schema_name)
    }

    /// Name of the field's type.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Call arguments.
    #[inline]
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Metadata flags.
    #[inline]
    pub fn metadata(&self) -> FieldMetadata {
        self.metadata
    }

    /// Returns true if the field is requisite.
    #[inline]
    pub fn is_requisite(&self) -> bool {
        self.metadata.is_requisite
    }

    /// Child selections.
    #[inline]
    pub fn children(&self) -> &[QueryNode] {
        &self.children
    }

    /// Stable textual form of the calls, e.g. `first(10).orderby(date)`.
    /// Empty for a field without calls. Keys range behaviors of connections.
    pub fn call_key(&self) -> String {
        self.calls
            .iter()
            .map(|call| match &call.value {
                CallValue::Literal(Value::String(s)) => format!("{}({})", call.name, s),
                CallValue::Literal(value) => format!("{}({})", call.name, value),
                CallValue::Variable(variable) => format!("{}(${})", call.name, variable),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// A fragment: a named, typed group of selections.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentNode {
    id: FragmentId,
    name: String,
    type_name: String,
    is_plural: bool,
    children: Vec<QueryNode>,
}

impl FragmentNode {
    /// Identity of this fragment invocation.
    #[inline]
    pub fn id(&self) -> &FragmentId {
        &self.id
    }

    /// Declared name of the fragment.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type the fragment applies to.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns true if the fragment reads a list of records.
    #[inline]
    pub fn is_plural(&self) -> bool {
        self.is_plural
    }

    /// Child selections.
    #[inline]
    pub fn children(&self) -> &[QueryNode] {
        &self.children
    }
}

/// A subscription operation.
///
/// A declared subscription has an empty route and no variables;
/// `SubscriptionNode::create` binds both when building the wire query.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionNode {
    name: String,
    call_name: String,
    input_type: String,
    route: String,
    variables: Object,
    children: Vec<QueryNode>,
}

impl SubscriptionNode {
    /// Declares a subscription named `name` calling `call_name` on the server
    /// with an input of type `input_type`.
    pub fn declare(
        name: impl Into<String>,
        call_name: impl Into<String>,
        input_type: impl Into<String>,
        children: Vec<QueryNode>,
    ) -> QueryNode {
        QueryNode::Subscription(Rc::new(Self {
            name: name.into(),
            call_name: call_name.into(),
            input_type: input_type.into(),
            route: String::new(),
            variables: Object::new(),
            children,
        }))
    }

    /// Binds a declared subscription to a route and its variables.
    pub fn create(declared: &SubscriptionNode, route: impl Into<String>, variables: Object) -> Self {
        Self {
            route: route.into(),
            variables,
            ..declared.clone()
        }
    }

    /// Operation name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the server call; payloads are keyed by it.
    #[inline]
    pub fn call_name(&self) -> &str {
        &self.call_name
    }

    /// Type of the `input` argument.
    #[inline]
    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    /// Route the query was built for.
    #[inline]
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Bound variables (`{input: ...}` once built).
    #[inline]
    pub fn variables(&self) -> &Object {
        &self.variables
    }

    /// Child selections of the call's payload.
    #[inline]
    pub fn children(&self) -> &[QueryNode] {
        &self.children
    }
}

/// A batch call variable: the root call's argument is only known after
/// another query ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchCall {
    pub ref_param_name: String,
    pub source_query_id: String,
    pub source_path: String,
}

/// A root query such as `node(id: "123") { ...Fragment }`.
#[derive(Clone, Debug, PartialEq)]
pub struct RootNode {
    name: String,
    field_name: String,
    identifying_arg: Option<Value>,
    batch_call: Option<BatchCall>,
    children: Vec<QueryNode>,
}

impl RootNode {
    /// Creates a root query calling `field_name`, optionally identified by an
    /// argument value (a list for plural root calls).
    pub fn new(
        name: impl Into<String>,
        field_name: impl Into<String>,
        identifying_arg: Option<Value>,
        children: Vec<QueryNode>,
    ) -> Self {
        Self {
            name: name.into(),
            field_name: field_name.into(),
            identifying_arg,
            batch_call: None,
            children,
        }
    }

    /// Marks the root call as depending on a batch call variable.
    pub fn with_batch_call(mut self, batch_call: BatchCall) -> Self {
        self.batch_call = Some(batch_call);
        self
    }

    /// Query name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root field, e.g. `node` or `viewer`.
    #[inline]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Identifying argument value, if the root call takes one.
    #[inline]
    pub fn identifying_arg(&self) -> Option<&Value> {
        self.identifying_arg.as_ref()
    }

    /// The batch call variable, if any.
    #[inline]
    pub fn batch_call(&self) -> Option<&BatchCall> {
        self.batch_call.as_ref()
    }

    /// Child selections.
    #[inline]
    pub fn children(&self) -> &[QueryNode] {
        &self.children
    }
}

impl From<RootNode> for QueryNode {
    fn from(root: RootNode) -> Self {
        QueryNode::Root(Rc::new(root))
    }
}

/// A node of a query tree.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryNode {
    Root(Rc<RootNode>),
    Subscription(Rc<SubscriptionNode>),
    Field(Rc<FieldNode>),
    Fragment(Rc<FragmentNode>),
}

impl QueryNode {
    /// Creates a plain field.
    pub fn field(
        schema_name: impl Into<String>,
        type_name: impl Into<String>,
        children: Vec<QueryNode>,
    ) -> Self {
        FieldBuilder::new(schema_name)
            .type_name(type_name)
            .children(children)
            .build()
    }

    /// Creates a singular fragment with a fresh identity.
    pub fn fragment(
        name: impl Into<String>,
        type_name: impl Into<String>,
        children: Vec<QueryNode>,
    ) -> Self {
        Self::new_fragment(name.into(), type_name.into(), false, children)
    }

    /// Creates a plural fragment with a fresh identity.
    pub fn plural_fragment(
        name: impl Into<String>,
        type_name: impl Into<String>,
        children: Vec<QueryNode>,
    ) -> Self {
        Self::new_fragment(name.into(), type_name.into(), true, children)
    }

    fn new_fragment(name: String, type_name: String, is_plural: bool, children: Vec<QueryNode>) -> Self {
        QueryNode::Fragment(Rc::new(FragmentNode {
            id: FragmentId::allocate(&name),
            name,
            type_name,
            is_plural,
            children,
        }))
    }

    /// Returns the node's kind.
    pub fn kind(&self) -> NodeKind {
        match self {
            QueryNode::Root(_) => NodeKind::Root,
            QueryNode::Subscription(_) => NodeKind::Subscription,
            QueryNode::Field(_) => NodeKind::Field,
            QueryNode::Fragment(_) => NodeKind::Fragment,
        }
    }

    /// Child selections.
    pub fn children(&self) -> &[QueryNode] {
        match self {
            QueryNode::Root(node) => node.children(),
            QueryNode::Subscription(node) => node.children(),
            QueryNode::Field(node) => node.children(),
            QueryNode::Fragment(node) => node.children(),
        }
    }

    /// Returns a copy of this node with `children` as its child list.
    /// Everything else, including a fragment's identity, is kept.
    pub fn clone_with_children(&self, children: Vec<QueryNode>) -> QueryNode {
        match self {
            QueryNode::Root(node) => QueryNode::Root(Rc::new(RootNode {
                children,
                ..RootNode::clone(node)
            })),
            QueryNode::Subscription(node) => QueryNode::Subscription(Rc::new(SubscriptionNode {
                children,
                ..SubscriptionNode::clone(node)
            })),
            QueryNode::Field(node) => QueryNode::Field(Rc::new(FieldNode {
                children,
                ..FieldNode::clone(node)
            })),
            QueryNode::Fragment(node) => QueryNode::Fragment(Rc::new(FragmentNode {
                children,
                ..FragmentNode::clone(node)
            })),
        }
    }

    /// Returns a copy of a fragment carrying `id` as its identity. Other
    /// node kinds are returned unchanged.
    pub fn with_fragment_id(&self, id: FragmentId) -> QueryNode {
        match self {
            QueryNode::Fragment(node) if node.id != id => QueryNode::Fragment(Rc::new(FragmentNode {
                id,
                ..FragmentNode::clone(node)
            })),
            _ => self.clone(),
        }
    }

    /// Schema name of a field; `None` for other kinds.
    pub fn schema_name(&self) -> Option<&str> {
        self.as_field().map(FieldNode::schema_name)
    }

    /// Server call name of a subscription; `None` for other kinds.
    pub fn call_name(&self) -> Option<&str> {
        self.as_subscription().map(SubscriptionNode::call_name)
    }

    /// Returns the field if this is a field node.
    pub fn as_field(&self) -> Option<&FieldNode> {
        match self {
            QueryNode::Field(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the fragment if this is a fragment node.
    pub fn as_fragment(&self) -> Option<&FragmentNode> {
        match self {
            QueryNode::Fragment(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the subscription if this is a subscription node.
    pub fn as_subscription(&self) -> Option<&SubscriptionNode> {
        match self {
            QueryNode::Subscription(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the root if this is a root node.
    pub fn as_root(&self) -> Option<&RootNode> {
        match self {
            QueryNode::Root(node) => Some(node),
            _ => None,
        }
    }

    /// Returns true if both handles point at the same node allocation.
    pub fn ptr_eq(&self, other: &QueryNode) -> bool {
        match (self, other) {
            (QueryNode::Root(a), QueryNode::Root(b)) => Rc::ptr_eq(a, b),
            (QueryNode::Subscription(a), QueryNode::Subscription(b)) => Rc::ptr_eq(a, b),
            (QueryNode::Field(a), QueryNode::Field(b)) => Rc::ptr_eq(a, b),
            (QueryNode::Fragment(a), QueryNode::Fragment(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Builder for field nodes.
///
/// ```rust
/// use tessera_query::FieldBuilder;
///
/// let field = FieldBuilder::new("clientSubscriptionId")
///     .type_name("String")
///     .requisite()
///     .build();
/// assert_eq!(field.schema_name(), Some("clientSubscriptionId"));
/// ```
#[derive(Clone, Debug)]
pub struct FieldBuilder {
    field: FieldNode,
}

impl FieldBuilder {
    /// Starts a field named `schema_name`.
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            field: FieldNode {
                schema_name: schema_name.into(),
                alias: None,
                type_name: String::new(),
                calls: Vec::new(),
                metadata: FieldMetadata::default(),
                children: Vec::new(),
            },
        }
    }

    /// Sets the field's type name.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.field.type_name = type_name.into();
        self
    }

    /// Sets an alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.field.alias = Some(alias.into());
        self
    }

    /// Adds a call argument.
    pub fn call(mut self, call: Call) -> Self {
        self.field.calls.push(call);
        self
    }

    /// Marks the field requisite.
    pub fn requisite(mut self) -> Self {
        self.field.metadata.is_requisite = true;
        self
    }

    /// Marks the field plural.
    pub fn plural(mut self) -> Self {
        self.field.metadata.is_plural = true;
        self
    }

    /// Marks the field as inserted by the client.
    pub fn generated(mut self) -> Self {
        self.field.metadata.is_generated = true;
        self
    }

    /// Appends a child selection.
    pub fn child(mut self, child: QueryNode) -> Self {
        self.field.children.push(child);
        self
    }

    /// Replaces the child selections.
    pub fn children(mut self, children: Vec<QueryNode>) -> Self {
        self.field.children = children;
        self
    }

    /// Finishes the field.
    pub fn build(self) -> QueryNode {
        QueryNode::Field(Rc::new(self.field))
    }
}

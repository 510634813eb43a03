use serde_json::Value;

/// Position of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKey<'a> {
    /// The node is the root of the tree.
    Root,
    /// The node is an item of an array.
    Index(usize),
    /// The node is a value of an object.
    Field(&'a str),
}

impl NodeKey<'_> {
    /// Whether the node is the value of the object field called `name`.
    pub fn is_field(self, name: &str) -> bool {
        matches!(self, NodeKey::Field(field) if field == name)
    }
}

/// A node handed to the visitor of [`walk_mut`].
///
/// Replacing the value of the node replaces it inside its parent.
#[derive(Debug)]
pub struct Node<'a> {
    key: NodeKey<'a>,
    value: &'a mut Value,
}

impl<'a> Node<'a> {
    /// Position of the node relative to its parent.
    pub fn key(&self) -> NodeKey<'a> {
        self.key
    }

    /// Current value of the node.
    pub fn value(&self) -> &Value {
        self.value
    }

    /// Replace the value of the node, returning the previous value.
    ///
    /// The walk continues into the new value.
    pub fn replace(&mut self, value: Value) -> Value {
        std::mem::replace(self.value, value)
    }
}

/// Visit every node of `root` depth-first in preorder, the root included.
pub fn walk<'a, Visitor>(root: &'a Value, mut visitor: Visitor)
where
    Visitor: FnMut(NodeKey<'a>, &'a Value),
{
    visit(NodeKey::Root, root, &mut visitor);
}

fn visit<'a, Visitor>(key: NodeKey<'a>, value: &'a Value, visitor: &mut Visitor)
where
    Visitor: FnMut(NodeKey<'a>, &'a Value),
{
    visitor(key, value);
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                visit(NodeKey::Index(index), item, visitor);
            }
        }
        Value::Object(fields) => {
            for (name, item) in fields {
                visit(NodeKey::Field(name), item, visitor);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

/// Visit every node of `root` depth-first in preorder, the root included, allowing the
/// visitor to [replace](Node::replace) any node.
pub fn walk_mut<Visitor>(root: &mut Value, mut visitor: Visitor)
where
    Visitor: FnMut(&mut Node<'_>),
{
    visit_mut(NodeKey::Root, root, &mut visitor);
}

fn visit_mut<Visitor>(key: NodeKey<'_>, value: &mut Value, visitor: &mut Visitor)
where
    Visitor: FnMut(&mut Node<'_>),
{
    visitor(&mut Node { key, value: &mut *value });
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                visit_mut(NodeKey::Index(index), item, visitor);
            }
        }
        Value::Object(fields) => {
            for (name, item) in fields.iter_mut() {
                visit_mut(NodeKey::Field(name), item, visitor);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

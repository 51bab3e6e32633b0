// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generic AST node.
//!
//! Instead of hundreds of node structs, every tree node is one [`Node`]: a
//! [`Tag`] plus an insertion-ordered map of named arguments, validated
//! against the tag's static descriptor. Builder conveniences for common
//! shapes (columns, literals, binary operators) live here as free-standing
//! constructors; nodes themselves carry no tag-specific behavior.

mod tags;

pub use tags::{Capability, Tag, TagDescriptor};

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A scalar argument value. Numbers keep their source text so no precision
/// is lost between parse and generation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Scalar {
    String(String),
    Number(String),
    Bool(bool),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) | Scalar::Number(s) => Some(s),
            Scalar::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// One argument slot's value. Absence is expressed by the key not being
/// present in the node's argument map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ArgValue {
    Scalar(Scalar),
    Child(Box<Node>),
    ChildList(Vec<Node>),
}

impl From<Scalar> for ArgValue {
    fn from(value: Scalar) -> Self {
        ArgValue::Scalar(value)
    }
}

impl From<Node> for ArgValue {
    fn from(value: Node) -> Self {
        ArgValue::Child(Box::new(value))
    }
}

impl From<Vec<Node>> for ArgValue {
    fn from(value: Vec<Node>) -> Self {
        ArgValue::ChildList(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Scalar(Scalar::Bool(value))
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Scalar(Scalar::String(String::from(value)))
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Scalar(Scalar::String(value))
    }
}

/// A tagged tree node with named arguments. Children are owned; a node is
/// never shared between two parents except through explicit `clone`.
/// Serialization is one-way: argument keys are static tag vocabulary, so
/// trees serialize for inspection but do not round-trip back in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Node {
    pub tag: Tag,
    args: Vec<(&'static str, ArgValue)>,
    pub comments: Vec<String>,
}

impl Node {
    pub fn new(tag: Tag) -> Self {
        Node {
            tag,
            args: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &'static TagDescriptor {
        self.tag.descriptor()
    }

    /// Sets an argument slot, replacing any previous value in place.
    /// Setting a key the tag does not declare is a programming error, not a
    /// user-facing parse error.
    pub fn set(&mut self, arg: &'static str, value: impl Into<ArgValue>) -> &mut Self {
        debug_assert!(
            self.descriptor().declares(arg),
            "{} does not declare argument {arg:?}",
            self.tag
        );
        let value = value.into();
        match self.args.iter_mut().find(|(name, _)| *name == arg) {
            Some(slot) => slot.1 = value,
            None => self.args.push((arg, value)),
        }
        self
    }

    /// Builder-style [`Node::set`].
    pub fn with(mut self, arg: &'static str, value: impl Into<ArgValue>) -> Self {
        self.set(arg, value);
        self
    }

    /// Appends a node to a list-valued slot, creating the list on first use.
    pub fn append(&mut self, arg: &'static str, node: Node) -> &mut Self {
        debug_assert!(
            self.descriptor().declares(arg),
            "{} does not declare argument {arg:?}",
            self.tag
        );
        match self.args.iter_mut().find(|(name, _)| *name == arg) {
            Some((_, ArgValue::ChildList(list))) => list.push(node),
            Some(slot) => slot.1 = ArgValue::ChildList(vec![node]),
            None => self.args.push((arg, ArgValue::ChildList(vec![node]))),
        }
        self
    }

    /// Removes and returns an argument slot's value.
    pub fn pop(&mut self, arg: &str) -> Option<ArgValue> {
        let index = self.args.iter().position(|(name, _)| *name == arg)?;
        Some(self.args.remove(index).1)
    }

    pub fn get(&self, arg: &str) -> Option<&ArgValue> {
        self.args
            .iter()
            .find(|(name, _)| *name == arg)
            .map(|(_, value)| value)
    }

    pub fn args(&self) -> impl Iterator<Item = (&'static str, &ArgValue)> {
        self.args.iter().map(|(name, value)| (*name, value))
    }

    /// The single child stored under `arg`, if any.
    pub fn child(&self, arg: &str) -> Option<&Node> {
        match self.get(arg) {
            Some(ArgValue::Child(node)) => Some(node),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, arg: &str) -> Option<&mut Node> {
        match self
            .args
            .iter_mut()
            .find(|(name, _)| *name == arg)
            .map(|(_, value)| value)
        {
            Some(ArgValue::Child(node)) => Some(node),
            _ => None,
        }
    }

    /// The node list stored under `arg`, or an empty slice.
    pub fn child_list(&self, arg: &str) -> &[Node] {
        match self.get(arg) {
            Some(ArgValue::ChildList(list)) => list,
            _ => &[],
        }
    }

    /// The scalar text stored under `arg`, or the empty string.
    pub fn text(&self, arg: &str) -> &str {
        match self.get(arg) {
            Some(ArgValue::Scalar(scalar)) => scalar.as_str().unwrap_or(""),
            _ => "",
        }
    }

    pub fn flag(&self, arg: &str) -> bool {
        match self.get(arg) {
            Some(ArgValue::Scalar(scalar)) => scalar.as_bool().unwrap_or(false),
            _ => false,
        }
    }

    /// The node's own name: its `this` text, descending through `this`
    /// children until a scalar is found.
    pub fn name(&self) -> &str {
        match self.get("this") {
            Some(ArgValue::Scalar(scalar)) => scalar.as_str().unwrap_or(""),
            Some(ArgValue::Child(child)) => child.name(),
            _ => "",
        }
    }

    /// Verifies every required argument of the tag's descriptor is present.
    pub fn validate(&self) -> Result<(), String> {
        for required in self.descriptor().required {
            if self.get(required).is_none() {
                return Err(format!("{} is missing required argument {required:?}", self.tag));
            }
        }
        Ok(())
    }

    /// Iterates the node's direct children in argument order, flattening
    /// list-valued slots.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.args.iter().flat_map(|(_, value)| {
            let slice: &[Node] = match value {
                ArgValue::Child(node) => std::slice::from_ref(node.as_ref()),
                ArgValue::ChildList(list) => list.as_slice(),
                ArgValue::Scalar(_) => &[],
            };
            slice.iter()
        })
    }

    /// Depth-first pre-order walk of the subtree, including `self`.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Breadth-first walk of the subtree, including `self`.
    pub fn bfs(&self) -> Bfs<'_> {
        Bfs {
            queue: std::collections::VecDeque::from([self]),
        }
    }

    /// First node in the subtree with the given tag, in DFS order.
    pub fn find(&self, tag: Tag) -> Option<&Node> {
        self.walk().find(|node| node.tag == tag)
    }

    pub fn find_all(&self, tag: Tag) -> Vec<&Node> {
        self.walk().filter(|node| node.tag == tag).collect()
    }

    /// Nearest ancestor of `target` (located by identity within this
    /// subtree) whose tag is in `tags`. Upward navigation is root-relative:
    /// children do not store parent pointers.
    pub fn find_ancestor(&self, target: &Node, tags: &[Tag]) -> Option<&Node> {
        fn search<'a>(
            current: &'a Node,
            target: *const Node,
            tags: &[Tag],
            best: Option<&'a Node>,
        ) -> Option<Option<&'a Node>> {
            if std::ptr::eq(current, target) {
                return Some(best);
            }
            let next_best = if tags.contains(&current.tag) {
                Some(current)
            } else {
                best
            };
            for child in current.children() {
                if let Some(found) = search(child, target, tags, next_best) {
                    return Some(found);
                }
            }
            None
        }
        search(self, target, tags, None).flatten()
    }

    /// Unwraps any number of `Paren` wrappers.
    pub fn unnest(&self) -> &Node {
        let mut node = self;
        while node.tag == Tag::Paren {
            match node.child("this") {
                Some(inner) => node = inner,
                None => break,
            }
        }
        node
    }

    /// Strips a single `Alias` wrapper, if present.
    pub fn unalias(&self) -> &Node {
        if self.tag == Tag::Alias {
            if let Some(inner) = self.child("this") {
                return inner;
            }
        }
        self
    }

    /// Flattens a left-deep chain of the same binary tag (e.g. nested `And`)
    /// into its operands, left to right.
    pub fn flatten(&self) -> Vec<&Node> {
        let mut operands = Vec::new();
        fn gather<'a>(node: &'a Node, tag: Tag, operands: &mut Vec<&'a Node>) {
            if node.tag == tag {
                if let Some(left) = node.child("this") {
                    gather(left, tag, operands);
                }
                if let Some(right) = node.child("expression") {
                    operands.push(right);
                }
            } else {
                operands.push(node);
            }
        }
        gather(self, self.tag, &mut operands);
        operands
    }
}

/// DFS pre-order iterator over a subtree.
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        let children: Vec<&Node> = node.children().collect();
        for child in children.into_iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}

/// BFS iterator over a subtree.
pub struct Bfs<'a> {
    queue: std::collections::VecDeque<&'a Node>,
}

impl<'a> Iterator for Bfs<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.children());
        Some(node)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.tag)?;
        let mut first = true;
        for (name, value) in &self.args {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{name}=")?;
            match value {
                ArgValue::Scalar(Scalar::String(s)) => write!(f, "{s:?}")?,
                ArgValue::Scalar(Scalar::Number(n)) => write!(f, "{n}")?,
                ArgValue::Scalar(Scalar::Bool(b)) => write!(f, "{b}")?,
                ArgValue::Child(node) => write!(f, "{node}")?,
                ArgValue::ChildList(list) => {
                    write!(f, "[")?;
                    for (i, node) in list.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{node}")?;
                    }
                    write!(f, "]")?;
                }
            }
        }
        write!(f, ")")
    }
}

// ---- builder conveniences, layered over the generic node ----

/// A quoted or unquoted identifier.
pub fn identifier(name: impl Into<String>, quoted: bool) -> Node {
    let mut node = Node::new(Tag::Identifier).with("this", name.into());
    if quoted {
        node.set("quoted", true);
    }
    node
}

/// A column reference from 1..=3 dotted parts, rightmost part innermost.
pub fn column(parts: Vec<Node>) -> Node {
    let mut parts = parts;
    let mut node = Node::new(Tag::Column);
    if let Some(name) = parts.pop() {
        node.set("this", name);
    }
    if let Some(table) = parts.pop() {
        node.set("table", table);
    }
    if let Some(db) = parts.pop() {
        node.set("db", db);
    }
    node
}

pub fn string_literal(text: impl Into<String>) -> Node {
    Node::new(Tag::Literal)
        .with("this", text.into())
        .with("is_string", true)
}

pub fn number_literal(text: impl Into<String>) -> Node {
    Node::new(Tag::Literal)
        .with("this", ArgValue::Scalar(Scalar::Number(text.into())))
        .with("is_string", false)
}

pub fn boolean(value: bool) -> Node {
    Node::new(Tag::Boolean).with("this", value)
}

pub fn null() -> Node {
    Node::new(Tag::Null)
}

pub fn var(name: impl Into<String>) -> Node {
    Node::new(Tag::Var).with("this", name.into())
}

pub fn binary(tag: Tag, left: Node, right: Node) -> Node {
    debug_assert!(tag.has_capability(Capability::Binary), "{tag} is not binary");
    Node::new(tag).with("this", left).with("expression", right)
}

pub fn unary(tag: Tag, this: Node) -> Node {
    Node::new(tag).with("this", this)
}

pub fn not(this: Node) -> Node {
    Node::new(Tag::Not).with("this", this)
}

pub fn paren(this: Node) -> Node {
    Node::new(Tag::Paren).with("this", this)
}

pub fn subquery(query: Node) -> Node {
    Node::new(Tag::Subquery).with("this", query)
}

pub fn alias(this: Node, name: Node) -> Node {
    Node::new(Tag::Alias).with("this", this).with("alias", name)
}

/// An anonymous function call.
pub fn func(name: impl Into<String>, args: Vec<Node>) -> Node {
    let mut node = Node::new(Tag::Func).with("this", name.into());
    if !args.is_empty() {
        node.set("expressions", args);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_and_overwrite() {
        let mut node = Node::new(Tag::Limit);
        node.set("expression", number_literal("10"));
        assert_eq!(node.child("expression").unwrap().text("this"), "10");
        node.set("expression", number_literal("20"));
        assert_eq!(node.child("expression").unwrap().text("this"), "20");
        assert_eq!(node.args().count(), 1);
    }

    #[test]
    #[should_panic(expected = "does not declare")]
    fn test_unknown_argument_is_a_programming_error() {
        let mut node = Node::new(Tag::Limit);
        node.set("nonsense", true);
    }

    #[test]
    fn test_required_arg_validation() {
        let mut node = Node::new(Tag::Between);
        node.set("this", column(vec![identifier("a", false)]));
        assert!(node.validate().is_err());
        node.set("low", number_literal("1"));
        node.set("high", number_literal("10"));
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_children_flattens_lists() {
        let mut select = Node::new(Tag::Select);
        select.append("expressions", number_literal("1"));
        select.append("expressions", number_literal("2"));
        select.set("where", Node::new(Tag::Where).with("this", boolean(true)));
        assert_eq!(select.children().count(), 3);
    }

    #[test]
    fn test_walk_and_find() {
        let tree = binary(
            Tag::And,
            binary(Tag::Eq, column(vec![identifier("a", false)]), number_literal("1")),
            binary(Tag::Gt, column(vec![identifier("b", false)]), number_literal("2")),
        );
        assert_eq!(tree.walk().count(), 9);
        assert_eq!(tree.find(Tag::Gt).unwrap().child("this").unwrap().name(), "b");
        assert_eq!(tree.find_all(Tag::Literal).len(), 2);
    }

    #[test]
    fn test_find_ancestor() {
        let inner = column(vec![identifier("x", false)]);
        let where_clause = Node::new(Tag::Where).with("this", inner);
        let select = Node::new(Tag::Select).with("where", where_clause);

        let target = select
            .child("where")
            .and_then(|w| w.child("this"))
            .unwrap();
        let ancestor = select.find_ancestor(target, &[Tag::Where]).unwrap();
        assert_eq!(ancestor.tag, Tag::Where);
        assert!(select.find_ancestor(target, &[Tag::Group]).is_none());
    }

    #[test]
    fn test_unnest_and_unalias() {
        let wrapped = paren(paren(number_literal("1")));
        assert_eq!(wrapped.unnest().tag, Tag::Literal);

        let aliased = alias(number_literal("1"), identifier("x", false));
        assert_eq!(aliased.unalias().tag, Tag::Literal);
    }

    #[test]
    fn test_flatten_same_tag_chain() {
        let chain = binary(
            Tag::And,
            binary(Tag::And, boolean(true), boolean(false)),
            boolean(true),
        );
        assert_eq!(chain.flatten().len(), 3);
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let original = binary(Tag::Add, number_literal("1"), number_literal("2"));
        let mut copy = original.clone();
        copy.set("expression", number_literal("3"));
        assert_eq!(original.child("expression").unwrap().text("this"), "2");
        assert_eq!(copy.child("expression").unwrap().text("this"), "3");
    }

    #[test]
    fn test_pop() {
        let mut node = Node::new(Tag::Select);
        node.append("expressions", number_literal("1"));
        assert!(node.pop("expressions").is_some());
        assert!(node.get("expressions").is_none());
        assert!(node.pop("expressions").is_none());
    }
}

//! Object graph nodes and the bounded recursive resolver
//!
//! Annotations, actions and destinations are read through [`Node`], a closed
//! view of the PDF object model. Indirect references are followed through the
//! [`ObjectGraph`] trait, which `lopdf::Document` implements.

use lopdf::{Document, Object, ObjectId};

pub use crate::config::DEFAULT_MAX_DEPTH;

/// Primitive PDF values
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(String),
    String(Vec<u8>),
    /// Stream bodies are never needed for link handling
    Stream,
}

/// One node of a document's object graph
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Indirect reference `n g R`
    Reference(ObjectId),
    /// Indirect object as returned by dereferencing a reference
    Object(ObjectId, Box<Node>),
    Array(Vec<Node>),
    /// Dictionary entries in document order
    Dictionary(Vec<(String, Node)>),
    Token(Token),
}

impl Node {
    pub fn name(name: &str) -> Self {
        Node::Token(Token::Name(name.to_string()))
    }

    pub fn integer(value: i64) -> Self {
        Node::Token(Token::Integer(value))
    }

    pub fn null() -> Self {
        Node::Token(Token::Null)
    }

    /// Look up a dictionary entry
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Dictionary(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Node::Token(Token::Name(name)) => Some(name),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Node::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Node::Token(Token::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Node::Token(Token::Integer(value)) => Some(*value as f64),
            Node::Token(Token::Real(value)) => Some(*value),
            _ => None,
        }
    }

    /// Decode a string token as text (UTF-16BE when it carries a BOM)
    pub fn as_text(&self) -> Option<String> {
        match self {
            Node::Token(Token::String(bytes)) => Some(decode_text(bytes)),
            _ => None,
        }
    }

    /// Name or string token, as used for named destinations
    pub fn as_destination_name(&self) -> Option<String> {
        match self {
            Node::Token(Token::Name(name)) => Some(name.clone()),
            Node::Token(Token::String(bytes)) => Some(decode_text(bytes)),
            _ => None,
        }
    }

    pub fn is_name(&self, expected: &str) -> bool {
        self.as_name() == Some(expected)
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self, Node::Dictionary(_))
    }
}

fn decode_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

impl From<&Object> for Node {
    fn from(object: &Object) -> Self {
        match object {
            Object::Null => Node::Token(Token::Null),
            Object::Boolean(value) => Node::Token(Token::Boolean(*value)),
            Object::Integer(value) => Node::Token(Token::Integer(*value)),
            Object::Real(value) => Node::Token(Token::Real(f64::from(*value))),
            Object::Name(name) => Node::Token(Token::Name(String::from_utf8_lossy(name).into_owned())),
            Object::String(bytes, _) => Node::Token(Token::String(bytes.clone())),
            Object::Array(items) => Node::Array(items.iter().map(Node::from).collect()),
            Object::Dictionary(dict) => Node::Dictionary(
                dict.iter()
                    .map(|(key, value)| (String::from_utf8_lossy(key).into_owned(), Node::from(value)))
                    .collect(),
            ),
            Object::Stream(_) => Node::Token(Token::Stream),
            Object::Reference(id) => Node::Reference(*id),
        }
    }
}

/// Source of indirect objects
pub trait ObjectGraph {
    /// Fetch the indirect object `id`, wrapped in [`Node::Object`]
    fn fetch(&self, id: ObjectId) -> Option<Node>;
}

impl ObjectGraph for Document {
    fn fetch(&self, id: ObjectId) -> Option<Node> {
        self.get_object(id)
            .ok()
            .map(|object| Node::Object(id, Box::new(Node::from(object))))
    }
}

/// Recursively resolve references and object wrappers
///
/// Every step down consumes one unit of `max_depth`, so following a reference
/// costs two (the reference, then the object wrapper). At zero the node is
/// returned untouched; callers must accept partially resolved values.
/// Dangling references resolve to null.
pub fn resolve<G: ObjectGraph + ?Sized>(graph: &G, node: &Node, max_depth: usize) -> Node {
    if max_depth == 0 {
        return node.clone();
    }

    match node {
        Node::Reference(id) => match graph.fetch(*id) {
            Some(object) => resolve(graph, &object, max_depth - 1),
            None => Node::null(),
        },
        Node::Object(_, inner) => resolve(graph, inner, max_depth - 1),
        Node::Array(items) => Node::Array(
            items
                .iter()
                .map(|item| resolve(graph, item, max_depth - 1))
                .collect(),
        ),
        Node::Dictionary(entries) => Node::Dictionary(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), resolve(graph, value, max_depth - 1)))
                .collect(),
        ),
        Node::Token(_) => node.clone(),
    }
}

/// Follow references and wrappers at the top level only
///
/// Children stay raw, so page references inside destination arrays keep their
/// object ids.
pub fn direct<G: ObjectGraph + ?Sized>(graph: &G, node: &Node, max_depth: usize) -> Node {
    let mut current = node.clone();
    let mut depth = max_depth;

    while depth > 0 {
        current = match current {
            Node::Reference(id) => graph.fetch(id).unwrap_or_else(Node::null),
            Node::Object(_, inner) => *inner,
            other => return other,
        };
        depth -= 1;
    }

    current
}

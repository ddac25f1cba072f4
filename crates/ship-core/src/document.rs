//! The recursive document model.
//!
//! A [`Document`] is what users store under each id: a scalar, an ordered
//! sequence, or a mapping of names to further documents. The same [`Node`]
//! shape, with sealed names and values, is what lands on disk as an
//! [`EncryptedDocument`].

use std::collections::{btree_map, BTreeMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::Sealed;
use crate::error::{Result, ShipError};

/// Deepest container nesting accepted for persistence.
///
/// Stored files wrap the document in one or two extra JSON levels and
/// serde_json refuses input nested beyond 128 levels.
pub const MAX_PERSISTED_DEPTH: usize = 100;

/// A tree of scalars, sequences and mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: Deserialize<'de> + Ord, V: Deserialize<'de>"
))]
pub enum Node<K, V> {
    Scalar(V),
    Sequence(Vec<Node<K, V>>),
    Mapping(BTreeMap<K, Node<K, V>>),
}

/// Plaintext document.
pub type Document = Node<String, Scalar>;

/// Document whose mapping names and scalar values are all sealed.
pub type EncryptedDocument = Node<Sealed, Sealed>;

/// A leaf value.
///
/// Numbers keep their kind through encryption: an integer comes back as an
/// integer, a float as a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Canonical text form.
    ///
    /// Integers print without leading zeros or a `+` sign. Floats print the
    /// shortest decimal that parses back to the same value, without an
    /// exponent and with a decimal point only when there is a fraction.
    pub fn canonical(&self) -> String {
        match self {
            Scalar::Text(text) => text.clone(),
            Scalar::Integer(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text),
            Scalar::Integer(value) => write!(f, "{}", value),
            Scalar::Float(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

macro_rules! scalar_document_from {
    ($($source:ty),*) => {
        $(
            impl From<$source> for Document {
                fn from(value: $source) -> Self {
                    Node::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

scalar_document_from!(&str, String, i64, f64);

enum Frame<'a, K, V, K2, V2> {
    Sequence {
        rest: std::slice::Iter<'a, Node<K, V>>,
        out: Vec<Node<K2, V2>>,
    },
    Mapping {
        rest: btree_map::Iter<'a, K, Node<K, V>>,
        out: BTreeMap<K2, Node<K2, V2>>,
        key: Option<K2>,
    },
}

impl<K: Ord, V> Node<K, V> {
    /// An empty mapping.
    pub fn empty_mapping() -> Self {
        Node::Mapping(BTreeMap::new())
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<K, Node<K, V>>> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut BTreeMap<K, Node<K, V>>> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Rebuild the tree with every mapping key and scalar transformed.
    ///
    /// Sequences keep their order and length, mappings keep their entry
    /// count (unless two keys map to the same output key, in which case the
    /// later one in iteration order wins). The walk uses an explicit stack,
    /// so nesting depth is limited by memory rather than the call stack.
    /// The first error from either closure aborts the walk.
    pub fn try_map<K2, V2, E, FK, FV>(
        &self,
        mut map_key: FK,
        mut map_value: FV,
    ) -> std::result::Result<Node<K2, V2>, E>
    where
        K2: Ord,
        FK: FnMut(&K) -> std::result::Result<K2, E>,
        FV: FnMut(&V) -> std::result::Result<V2, E>,
    {
        let mut stack: Vec<Frame<'_, K, V, K2, V2>> = Vec::new();
        let mut current = self;

        loop {
            // Descend along first children until a node completes.
            let mut finished = loop {
                match current {
                    Node::Scalar(value) => break Node::Scalar(map_value(value)?),
                    Node::Sequence(items) => {
                        let mut rest = items.iter();
                        match rest.next() {
                            None => break Node::Sequence(Vec::new()),
                            Some(first) => {
                                stack.push(Frame::Sequence {
                                    rest,
                                    out: Vec::with_capacity(items.len()),
                                });
                                current = first;
                            }
                        }
                    }
                    Node::Mapping(entries) => {
                        let mut rest = entries.iter();
                        match rest.next() {
                            None => break Node::Mapping(BTreeMap::new()),
                            Some((name, first)) => {
                                let key = Some(map_key(name)?);
                                stack.push(Frame::Mapping {
                                    rest,
                                    out: BTreeMap::new(),
                                    key,
                                });
                                current = first;
                            }
                        }
                    }
                }
            };

            // Ascend, attaching finished nodes, until a sibling is pending.
            loop {
                let Some(mut frame) = stack.pop() else {
                    return Ok(finished);
                };
                let next = match &mut frame {
                    Frame::Sequence { rest, out } => {
                        out.push(finished);
                        rest.next()
                    }
                    Frame::Mapping { rest, out, key } => {
                        if let Some(mapped) = key.take() {
                            out.insert(mapped, finished);
                        }
                        match rest.next() {
                            Some((name, child)) => {
                                *key = Some(map_key(name)?);
                                Some(child)
                            }
                            None => None,
                        }
                    }
                };
                match next {
                    Some(child) => {
                        stack.push(frame);
                        current = child;
                        break;
                    }
                    None => {
                        finished = match frame {
                            Frame::Sequence { out, .. } => Node::Sequence(out),
                            Frame::Mapping { out, .. } => Node::Mapping(out),
                        };
                    }
                }
            }
        }
    }

    /// Container nesting depth; a scalar is 0.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 0usize)];
        while let Some((node, level)) = pending.pop() {
            match node {
                Node::Scalar(_) => deepest = deepest.max(level),
                Node::Sequence(items) => {
                    deepest = deepest.max(level + 1);
                    pending.extend(items.iter().map(|child| (child, level + 1)));
                }
                Node::Mapping(entries) => {
                    deepest = deepest.max(level + 1);
                    pending.extend(entries.values().map(|child| (child, level + 1)));
                }
            }
        }
        deepest
    }
}

impl Document {
    /// Parse a JSON document.
    ///
    /// Booleans and `null` have no document representation and are rejected.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| {
            ShipError::InvalidInput(format!(
                "Expected a string, number, array or object (booleans and null are not supported): {}",
                e
            ))
        })
    }

    /// Check the document can be written and read back.
    pub fn ensure_persistable(&self) -> Result<()> {
        if self.depth() > MAX_PERSISTED_DEPTH {
            return Err(ShipError::InvalidInput(format!(
                "Document nesting exceeds {} levels",
                MAX_PERSISTED_DEPTH
            )));
        }
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Node::Scalar(Scalar::Float(value)) if !value.is_finite() => {
                    return Err(ShipError::InvalidInput(format!(
                        "Non-finite number {} cannot be stored",
                        value
                    )));
                }
                Node::Scalar(_) => {}
                Node::Sequence(items) => pending.extend(items.iter()),
                Node::Mapping(entries) => pending.extend(entries.values()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested(depth: usize) -> Document {
        let mut doc = Document::from("leaf");
        for level in 0..depth {
            doc = if level % 2 == 0 {
                Node::Sequence(vec![doc])
            } else {
                Node::Mapping(BTreeMap::from([("k".to_string(), doc)]))
            };
        }
        doc
    }

    #[test]
    fn test_parse_scalar_kinds() {
        let doc = Document::from_json(r#"{"a": "x", "b": 7, "c": 2.5, "d": -3}"#).unwrap();
        let map = doc.as_mapping().unwrap();
        assert_eq!(map["a"], Document::from("x"));
        assert_eq!(map["b"], Document::from(7i64));
        assert_eq!(map["c"], Document::from(2.5f64));
        assert_eq!(map["d"], Document::from(-3i64));
    }

    #[test]
    fn test_parse_rejects_bool_and_null() {
        for input in ["true", "null", r#"{"a": false}"#, r#"[1, null]"#] {
            let err = Document::from_json(input).unwrap_err();
            assert!(matches!(err, ShipError::InvalidInput(_)), "{}", input);
        }
    }

    #[test]
    fn test_json_keeps_float_kind() {
        let doc = Document::from(2.0f64);
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(Document::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_canonical_numbers() {
        assert_eq!(Scalar::Integer(-42).canonical(), "-42");
        assert_eq!(Scalar::Float(2.0).canonical(), "2");
        assert_eq!(Scalar::Float(0.1).canonical(), "0.1");
        assert_eq!(Scalar::Float(1e21).canonical(), "1000000000000000000000");
    }

    #[test]
    fn test_try_map_preserves_shape_and_order() {
        let doc = Document::from_json(r#"{"list": ["c", "a", "b"], "n": 1, "empty": {}}"#).unwrap();
        let mapped: Node<String, String> = doc
            .try_map(
                |k| Ok::<_, ()>(k.to_uppercase()),
                |v| Ok(v.canonical()),
            )
            .unwrap();

        let map = mapped.as_mapping().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(
            map["LIST"],
            Node::Sequence(vec![
                Node::Scalar("c".to_string()),
                Node::Scalar("a".to_string()),
                Node::Scalar("b".to_string()),
            ])
        );
        assert_eq!(map["N"], Node::Scalar("1".to_string()));
        assert_eq!(map["EMPTY"], Node::Mapping(BTreeMap::new()));
    }

    #[test]
    fn test_try_map_stops_at_first_error() {
        let doc = Document::from_json(r#"["ok", "bad", "never"]"#).unwrap();
        let mut seen = Vec::new();
        let result: std::result::Result<Node<String, ()>, String> = doc.try_map(
            |k| Ok(k.clone()),
            |v| {
                seen.push(v.canonical());
                if v.canonical() == "bad" {
                    Err("boom".to_string())
                } else {
                    Ok(())
                }
            },
        );
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(seen, vec!["ok", "bad"]);
    }

    #[test]
    fn test_try_map_handles_deep_nesting() {
        let doc = nested(2_048);
        let copy: Document = doc
            .try_map(|k| Ok::<_, ()>(k.clone()), |v| Ok(v.clone()))
            .unwrap();
        assert_eq!(copy.depth(), 2_048);
        assert_eq!(copy, doc);
    }

    #[test]
    fn test_ensure_persistable_limits() {
        assert!(nested(MAX_PERSISTED_DEPTH).ensure_persistable().is_ok());
        assert!(nested(MAX_PERSISTED_DEPTH + 1).ensure_persistable().is_err());

        let nan = Node::Sequence(vec![Document::from(f64::NAN)]);
        assert!(matches!(
            nan.ensure_persistable(),
            Err(ShipError::InvalidInput(_))
        ));
    }
}

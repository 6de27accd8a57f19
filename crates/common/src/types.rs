use serde::{Deserialize, Serialize};

/// Identifier for one logical collection of records (a model or table name).
///
/// Wraps a `String` to provide type safety and prevent mixing up collection
/// keys with other string-based identifiers. Used verbatim as the store key
/// and as the suffix of the derived bus topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionKey(String);

impl CollectionKey {
    /// Creates a collection key from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CollectionKey {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for CollectionKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A single record of a collection, as loaded from the system of record.
///
/// Records are schemaless JSON objects; a stored snapshot is a JSON array
/// of them, serialized as one opaque blob.
pub type Record = serde_json::Value;

/// The kind of mutation a lifecycle hook observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// In-process signal that the host application mutated a collection.
///
/// Produced by the host's lifecycle hooks and consumed synchronously by the
/// write path; never persisted or sent over the bus.
#[derive(Debug, Clone)]
pub struct MutationEvent {
    pub collection: CollectionKey,
    pub operation: Operation,
    /// The record the mutation touched, when the hook has it at hand.
    pub record: Option<Record>,
}

impl MutationEvent {
    pub fn new(
        collection: impl Into<CollectionKey>,
        operation: Operation,
        record: Option<Record>,
    ) -> Self {
        Self {
            collection: collection.into(),
            operation,
            record,
        }
    }
}

/// Bus message asking whoever owns a collection to reload and store it.
///
/// Wire form is `{"modelName": "<collection>"}`; consumers tolerate unknown
/// additional fields and there is no version field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimeRequest {
    #[serde(rename = "modelName")]
    pub collection: CollectionKey,
}

impl PrimeRequest {
    pub fn new(collection: impl Into<CollectionKey>) -> Self {
        Self {
            collection: collection.into(),
        }
    }
}

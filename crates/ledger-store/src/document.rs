//! Documents, batch operations and query descriptions.

use std::cmp::Ordering;

use serde_json::Value;

/// Largest number of operations the store applies atomically.
pub const MAX_BATCH_OPS: usize = 500;

/// A stored document.
pub type Document = Value;

/// Kind of write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteKind {
    /// Full overwrite, created when absent.
    Set(Document),
    Delete,
}

/// One write addressed to `collection/key`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOp {
    pub collection: String,
    pub key: String,
    pub kind: WriteKind,
}

impl WriteOp {
    pub fn set(collection: impl Into<String>, key: impl Into<String>, value: Document) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
            kind: WriteKind::Set(value),
        }
    }

    pub fn delete(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
            kind: WriteKind::Delete,
        }
    }
}

/// Conjunction of top-level field equalities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocFilter {
    equals: Vec<(String, Value)>,
}

impl DocFilter {
    /// Filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    #[must_use]
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.equals
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Ordering applied to query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    /// Stable-sorts `(key, document)` pairs on the ordering field.
    pub fn sort(&self, docs: &mut [(String, Document)]) {
        docs.sort_by(|(_, a), (_, b)| {
            let ordering = compare_values(a.get(&self.field), b.get(&self.field));
            match self.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }
}

/// Missing < null < bool < number < string; other kinds compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or(0.0)
                .total_cmp(&y.as_f64().unwrap_or(0.0)),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

//! Document filters and dotted-path helpers
//!
//! Paths are dot separated (`providers.github.id`, `authors.user`). When a path
//! segment lands on an array, evaluation fans out over every element, so
//! `authors.user` addresses the `user` field of each entry in `authors`. A leaf
//! that is itself an array matches if any of its elements matches, which makes
//! `Eq("emails", x)` an array-contains test.

use serde_json::{Map, Value};

/// Filter over JSON documents
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Some value at the path equals the given value
    Eq(String, Value),
    /// No value at the path equals the given value
    Ne(String, Value),
    /// Some value at the path is one of the given values
    In(String, Vec<Value>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(path.into(), value.into())
    }

    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(path.into(), value.into())
    }

    pub fn one_of<V: Into<Value>>(path: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(path.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::All => true,
            Self::Eq(path, expected) => {
                let found = resolve_path(document, path);
                if found.is_empty() {
                    expected.is_null()
                } else {
                    found.iter().any(|v| *v == expected)
                }
            }
            Self::Ne(path, expected) => !Self::Eq(path.clone(), expected.clone()).matches(document),
            Self::In(path, expected) => resolve_path(document, path)
                .iter()
                .any(|v| expected.contains(*v)),
            Self::And(filters) => filters.iter().all(|f| f.matches(document)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(document)),
        }
    }

    /// Scalar values of which at least one must appear somewhere in a matching
    /// document. Storage backends use this as a cheap prefilter; `None` means
    /// no such set can be derived and every document must be checked.
    pub fn probe_values(&self) -> Option<Vec<Value>> {
        let probes = match self {
            Self::All | Self::Ne(..) => return None,
            Self::Eq(_, value) if value.is_null() => return None,
            Self::Eq(_, value) => vec![value.clone()],
            Self::In(_, values) => values.clone(),
            Self::And(filters) => return filters.iter().find_map(Filter::probe_values),
            Self::Or(filters) => {
                let mut probes = Vec::new();
                for filter in filters {
                    probes.extend(filter.probe_values()?);
                }
                probes
            }
        };

        if probes.iter().all(|v| v.is_string() || v.is_i64()) {
            Some(probes)
        } else {
            None
        }
    }
}

/// Collect every value addressed by `path`, fanning out over arrays
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut found = Vec::new();
    collect(document, &segments, &mut found);
    found
}

fn collect<'a>(value: &'a Value, segments: &[&str], found: &mut Vec<&'a Value>) {
    match (segments.split_first(), value) {
        (None, Value::Array(items)) => found.extend(items.iter()),
        (None, value) => found.push(value),
        (Some(_), Value::Array(items)) => {
            for item in items {
                collect(item, segments, found);
            }
        }
        (Some((head, rest)), Value::Object(map)) => {
            if let Some(child) = map.get(*head) {
                collect(child, rest, found);
            }
        }
        (Some(_), _) => {}
    }
}

/// Replace every value addressed by `path` that equals `from` with `to`.
///
/// Returns the number of replacements made. Running it a second time with the
/// same arguments replaces nothing.
pub fn replace_at_path(document: &mut Value, path: &str, from: &Value, to: &Value) -> usize {
    let segments: Vec<&str> = path.split('.').collect();
    replace(document, &segments, from, to)
}

fn replace(value: &mut Value, segments: &[&str], from: &Value, to: &Value) -> usize {
    match segments.split_first() {
        None => match value {
            Value::Array(items) => items
                .iter_mut()
                .filter(|item| **item == *from)
                .map(|item| *item = to.clone())
                .count(),
            other if *other == *from => {
                *other = to.clone();
                1
            }
            _ => 0,
        },
        Some((head, rest)) => match value {
            Value::Array(items) => items
                .iter_mut()
                .map(|item| replace(item, segments, from, to))
                .sum(),
            Value::Object(map) => map
                .get_mut(*head)
                .map_or(0, |child| replace(child, rest, from, to)),
            _ => 0,
        },
    }
}

/// Set the value at an object-only path, creating intermediate objects.
/// Paths that cross arrays or scalars are rejected.
pub fn set_at_path(document: &mut Value, path: &str, new_value: Value) -> Result<(), String> {
    let mut current = document;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let map = current
            .as_object_mut()
            .ok_or_else(|| format!("Path '{path}' crosses a non-object value"))?;

        if segments.peek().is_none() {
            map.insert(segment.to_string(), new_value);
            return Ok(());
        }

        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    Err(format!("Empty path '{path}'"))
}

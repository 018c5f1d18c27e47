//! # Tuples and Query Patterns
//!
//! A tuple is a fixed number of attribute values rendered as one
//! comma-separated string; that string, NUL-terminated, is also the
//! on-disk format. Attribute values may not be empty and may not contain
//! commas (the separator), `?` (reserved for query wildcards) or NUL
//! bytes (the on-disk terminator).
//!
//! A [`Pattern`] has the same shape but allows `?` as a whole field,
//! meaning "any value". Matching compares field counts and the non-`?`
//! fields byte for byte.

use eyre::{ensure, Result};
use std::fmt;

/// A validated tuple: exactly `nattrs` non-empty attribute values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    raw: String,
}

impl Tuple {
    /// Parses and validates a comma-separated tuple with `nattrs` fields.
    pub fn parse(nattrs: u32, s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(',').collect();
        ensure!(
            fields.len() == nattrs as usize,
            "tuple '{}' has {} attributes, expected {}",
            s,
            fields.len(),
            nattrs
        );
        for field in &fields {
            validate_field(field, s)?;
        }
        Ok(Self { raw: s.to_string() })
    }

    /// Wraps a string read back from a page. Stored tuples were validated
    /// on insert, so this performs no checks.
    pub(crate) fn from_stored(s: &str) -> Self {
        Self { raw: s.to_string() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The attribute values, in schema order.
    pub fn values(&self) -> Vec<&str> {
        self.raw.split(',').collect()
    }

    /// Bytes this tuple occupies in a page body, including the NUL
    /// terminator.
    pub fn stored_len(&self) -> usize {
        self.raw.len() + 1
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A partial-match query pattern: like a tuple, but any field may be the
/// wildcard `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
}

impl Pattern {
    pub fn parse(nattrs: u32, s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(',').collect();
        ensure!(
            fields.len() == nattrs as usize,
            "pattern '{}' has {} attributes, expected {}",
            s,
            fields.len(),
            nattrs
        );
        for field in &fields {
            if *field != "?" {
                validate_field(field, s)?;
            }
        }
        Ok(Self { raw: s.to_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The pattern fields, in schema order; `None` for a wildcard.
    pub fn fields(&self) -> Vec<Option<&str>> {
        self.raw
            .split(',')
            .map(|f| if f == "?" { None } else { Some(f) })
            .collect()
    }

    /// Full tuple match: equal field count, and every non-wildcard field
    /// equal byte for byte.
    pub fn matches(&self, tuple: &str) -> bool {
        let mut pat = self.raw.split(',');
        let mut tup = tuple.split(',');
        loop {
            match (pat.next(), tup.next()) {
                (None, None) => return true,
                (Some(p), Some(t)) => {
                    if p != "?" && p != t {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn validate_field(field: &str, whole: &str) -> Result<()> {
    ensure!(!field.is_empty(), "empty attribute value in '{}'", whole);
    ensure!(
        !field.contains('?'),
        "'?' is reserved for query patterns: '{}'",
        whole
    );
    ensure!(
        !field.contains('\0'),
        "NUL byte in attribute value: '{}'",
        whole
    );
    Ok(())
}

//! `key op value` conditions for first-party caveats, e.g. `time < 2030-01-01`.

use crate::{MacaroonError, Result};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Comparison operators recognised in a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Op {
    // Two-character operators first so `<=` is never read as `<`.
    const TOKENS: [(&'static str, Op); 6] = [
        ("<=", Op::Le),
        (">=", Op::Ge),
        ("!=", Op::Ne),
        ("=", Op::Eq),
        ("<", Op::Lt),
        (">", Op::Gt),
    ];

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Lt => ordering == Ordering::Less,
            Op::Gt => ordering == Ordering::Greater,
            Op::Le => ordering != Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
        }
    }
}

/// A parsed first-party condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub key: String,
    pub op: Op,
    pub value: String,
}

impl Condition {
    /// Parses `key op value`, splitting at the leftmost operator
    pub fn parse(s: &str) -> Result<Self> {
        let (pos, token, op) = s
            .char_indices()
            .find_map(|(i, _)| {
                Op::TOKENS
                    .iter()
                    .find(|(token, _)| s[i..].starts_with(token))
                    .map(|&(token, op)| (i, token, op))
            })
            .ok_or_else(|| MacaroonError::InvalidCondition(format!("no operator in {s:?}")))?;

        let key = s[..pos].trim();
        let value = s[pos + token.len()..].trim();
        if key.is_empty() || value.is_empty() {
            return Err(MacaroonError::InvalidCondition(format!(
                "missing key or value in {s:?}"
            )));
        }

        Ok(Self {
            key: key.to_string(),
            op,
            value: value.to_string(),
        })
    }

    /// Evaluates the condition against a context
    ///
    /// Values that both parse as numbers are compared numerically, everything
    /// else lexically (so ISO-8601 timestamps compare correctly). Fails with
    /// `InvalidCondition` when the context has no value for the key or the
    /// two numbers have no ordering (`NaN`).
    pub fn evaluate(&self, context: &HashMap<String, String>) -> Result<bool> {
        let actual = context.get(&self.key).ok_or_else(|| {
            MacaroonError::InvalidCondition(format!("no value for {:?} in context", self.key))
        })?;

        let ordering = match (actual.parse::<f64>(), self.value.parse::<f64>()) {
            (Ok(a), Ok(b)) => a.partial_cmp(&b).ok_or_else(|| {
                MacaroonError::InvalidCondition(format!(
                    "incomparable values {actual:?} and {:?} for {:?}",
                    self.value, self.key
                ))
            })?,
            _ => actual.as_str().cmp(self.value.as_str()),
        };
        Ok(self.op.holds(ordering))
    }
}

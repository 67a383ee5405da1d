use crate::condition::Condition;
use crate::Result;
use std::collections::HashMap;

/// Checks first-party caveat conditions during verification
///
/// The outcome is three-way:
/// * `Ok(true)` - the condition holds
/// * `Ok(false)` - the condition does not hold
/// * `Err(_)` - the condition could not be evaluated; the answer is unknown
pub trait FirstPartyChecker {
    fn check_first_party_caveat(&self, condition: &str) -> Result<bool>;
}

impl<C: FirstPartyChecker + ?Sized> FirstPartyChecker for &C {
    fn check_first_party_caveat(&self, condition: &str) -> Result<bool> {
        (**self).check_first_party_caveat(condition)
    }
}

/// A checker that accepts every condition
///
/// Useful for testing or when you only care about signature verification
pub struct AcceptAllChecker;

impl FirstPartyChecker for AcceptAllChecker {
    fn check_first_party_caveat(&self, _condition: &str) -> Result<bool> {
        Ok(true)
    }
}

/// A checker that rejects every condition
pub struct RejectAllChecker;

impl FirstPartyChecker for RejectAllChecker {
    fn check_first_party_caveat(&self, _condition: &str) -> Result<bool> {
        Ok(false)
    }
}

/// A function-based checker for simple use cases
///
/// # Example
/// ```
/// use macaroon::checker::{FirstPartyChecker, FnChecker};
///
/// let checker = FnChecker::new(|condition| Ok(condition.starts_with("time < ")));
///
/// assert!(checker.check_first_party_caveat("time < 2030-01-01").unwrap());
/// assert!(!checker.check_first_party_caveat("account = bob").unwrap());
/// ```
pub struct FnChecker<F>
where
    F: Fn(&str) -> Result<bool>,
{
    func: F,
}

impl<F> FnChecker<F>
where
    F: Fn(&str) -> Result<bool>,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> FirstPartyChecker for FnChecker<F>
where
    F: Fn(&str) -> Result<bool>,
{
    fn check_first_party_caveat(&self, condition: &str) -> Result<bool> {
        (self.func)(condition)
    }
}

/// A checker that accepts a condition if any member checker accepts it
///
/// If no member accepts the condition and at least one could not evaluate it,
/// the first such error is returned so that "unknown" is not reported as "false".
/// An empty composite accepts nothing.
#[derive(Default)]
pub struct CompositeChecker {
    checkers: Vec<Box<dyn FirstPartyChecker + Send + Sync>>,
}

impl CompositeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a checker to the composite
    pub fn add_checker<C: FirstPartyChecker + Send + Sync + 'static>(mut self, checker: C) -> Self {
        self.checkers.push(Box::new(checker));
        self
    }
}

impl FirstPartyChecker for CompositeChecker {
    fn check_first_party_caveat(&self, condition: &str) -> Result<bool> {
        let mut first_error = None;
        for checker in &self.checkers {
            match checker.check_first_party_caveat(condition) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(false),
        }
    }
}

/// A checker that evaluates `key op value` conditions against a context map
///
/// A condition that does not parse, whose key is absent from the context, or
/// whose numeric values cannot be ordered is reported as an error: the checker
/// cannot say whether it holds.
///
/// # Example
/// ```
/// use macaroon::checker::{ContextChecker, FirstPartyChecker};
///
/// let checker = ContextChecker::empty()
///     .with("account", "alice")
///     .with("time", "2026-10-18");
///
/// assert!(checker.check_first_party_caveat("account = alice").unwrap());
/// assert!(checker.check_first_party_caveat("time < 2030-01-01").unwrap());
/// assert!(!checker.check_first_party_caveat("account = bob").unwrap());
/// assert!(checker.check_first_party_caveat("role = admin").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextChecker {
    context: HashMap<String, String>,
}

impl ContextChecker {
    pub fn new(context: HashMap<String, String>) -> Self {
        Self { context }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a key-value pair to the context
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a key-value pair in the context
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.context.insert(key.into(), value.into());
    }
}

impl FirstPartyChecker for ContextChecker {
    fn check_first_party_caveat(&self, condition: &str) -> Result<bool> {
        Condition::parse(condition)?.evaluate(&self.context)
    }
}

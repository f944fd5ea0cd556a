//! Conjunctive query predicates.
//!
//! A query is a slice of [`Predicate`]s that must all hold. Order does not
//! affect the result, only the cost: the store seeds its candidate set from
//! the first positive predicate, so callers list the most selective one first.

use std::fmt;

use crate::value::Value;

/// One clause of a conjunctive query.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<'a> {
    /// The entity carries the component.
    Has(&'a str),
    /// The entity carries the component with a value loosely equal to this.
    HasValue(&'a str, Value),
    /// The entity does not carry the component.
    Not(&'a str),
    /// The entity lacks the component or holds a different value.
    NotValue(&'a str, Value),
}

impl<'a> Predicate<'a> {
    pub fn has(component: &'a str) -> Self {
        Predicate::Has(component)
    }

    pub fn value(component: &'a str, value: impl Into<Value>) -> Self {
        Predicate::HasValue(component, value.into())
    }

    pub fn not(component: &'a str) -> Self {
        Predicate::Not(component)
    }

    pub fn not_value(component: &'a str, value: impl Into<Value>) -> Self {
        Predicate::NotValue(component, value.into())
    }

    /// The component this clause inspects.
    pub fn component(&self) -> &'a str {
        match self {
            Predicate::Has(c)
            | Predicate::HasValue(c, _)
            | Predicate::Not(c)
            | Predicate::NotValue(c, _) => c,
        }
    }

    /// Whether the clause requires the component to be present.
    pub fn is_positive(&self) -> bool {
        matches!(self, Predicate::Has(_) | Predicate::HasValue(_, _))
    }
}

impl fmt::Display for Predicate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Has(c) => write!(f, "{c}"),
            Predicate::HasValue(c, v) => write!(f, "{c}=={v}"),
            Predicate::Not(c) => write!(f, "!{c}"),
            Predicate::NotValue(c, v) => write!(f, "{c}!={v}"),
        }
    }
}

/// Render a query for log output, e.g. `IsKami & Index==3`.
pub fn describe(predicates: &[Predicate<'_>]) -> String {
    predicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" & ")
}

//! Property predicates used by `has` steps

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::data::PropertyValue;

/// Condition a property value must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Predicate {
    /// Exact equality with the stored value.
    Eq(PropertyValue),
    /// Regular expression match against the stored value's text form.
    Regex(String),
}

impl Predicate {
    pub fn eq(value: impl Into<PropertyValue>) -> Self {
        Predicate::Eq(value.into())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Predicate::Regex(pattern.into())
    }

    /// Prepares the predicate for repeated evaluation.
    pub fn compile(&self) -> Result<CompiledPredicate<'_>, regex::Error> {
        Ok(match self {
            Predicate::Eq(value) => CompiledPredicate::Eq(value),
            Predicate::Regex(pattern) => CompiledPredicate::Regex(Regex::new(pattern)?),
        })
    }
}

#[derive(Debug)]
pub enum CompiledPredicate<'a> {
    Eq(&'a PropertyValue),
    Regex(Regex),
}

impl CompiledPredicate<'_> {
    /// Missing and null properties never match.
    pub fn test(&self, value: Option<&PropertyValue>) -> bool {
        let value = match value {
            Some(value) if !value.is_null() => value,
            _ => return false,
        };
        match self {
            CompiledPredicate::Eq(expected) => *expected == value,
            CompiledPredicate::Regex(regex) => match value {
                PropertyValue::Map(_) => false,
                PropertyValue::String(s) => regex.is_match(s),
                other => regex.is_match(&other.to_string()),
            },
        }
    }
}

// =============================================================================
//  Astra HTN - Entity Requirements
//  File: entity.rs
//
//  Description:
//      Declares what kind of entity a command needs: a type plus a set of
//      capabilities. Requirements are matched against the entity-capability
//      map of a state; a command only schedules when every requirement can
//      be bound to some entity.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-11
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::error::{PlanError, Result};
use crate::state::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The capability name under which an entity records its type.
pub const TYPE_CAPABILITY: &str = "type";

/// A requirement for one entity of a given type with a set of capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRequirement {
    pub entity_type: String,
    pub capabilities: Vec<String>,
}

impl EntityRequirement {
    /// Builds a requirement. The type must be non-empty and at least one
    /// capability must be named.
    pub fn new<I, S>(entity_type: impl Into<String>, capabilities: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entity_type = entity_type.into();
        let capabilities: Vec<String> = capabilities.into_iter().map(Into::into).collect();
        if entity_type.is_empty() {
            return Err(PlanError::misconfigured("entity requirement with empty type"));
        }
        if capabilities.is_empty() || capabilities.iter().any(String::is_empty) {
            return Err(PlanError::misconfigured(format!(
                "entity requirement '{entity_type}' needs a non-empty capability set"
            )));
        }
        Ok(EntityRequirement {
            entity_type,
            capabilities,
        })
    }

    /// The deduplication key: type plus the sorted capability set.
    pub fn dedup_key(&self) -> (String, Vec<String>) {
        let mut caps = self.capabilities.clone();
        caps.sort();
        caps.dedup();
        (self.entity_type.clone(), caps)
    }

    /// True when the given capability map describes an entity of the
    /// required type possessing every required capability.
    pub fn matches(&self, capabilities: &HashMap<String, Value>) -> bool {
        let type_ok = capabilities
            .get(TYPE_CAPABILITY)
            .and_then(Value::as_str)
            .map(|t| t == self.entity_type)
            .unwrap_or(false);
        type_ok
            && self
                .capabilities
                .iter()
                .all(|cap| capabilities.get(cap).map(Value::is_truthy).unwrap_or(false))
    }
}

impl fmt::Display for EntityRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.entity_type, self.capabilities.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_rejects_empty_parts() {
        assert!(EntityRequirement::new("", ["cooking"]).is_err());
        assert!(EntityRequirement::new("agent", Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_matches_superset() {
        let req = EntityRequirement::new("agent", ["cooking"]).unwrap();
        let chef = caps(&[
            ("type", Value::Str("agent".into())),
            ("cooking", Value::Bool(true)),
            ("serving", Value::Bool(true)),
        ]);
        assert!(req.matches(&chef));

        let cleaner = caps(&[
            ("type", Value::Str("agent".into())),
            ("cleaning", Value::Bool(true)),
        ]);
        assert!(!req.matches(&cleaner));

        let wrong_type = caps(&[
            ("type", Value::Str("vehicle".into())),
            ("cooking", Value::Bool(true)),
        ]);
        assert!(!req.matches(&wrong_type));
    }

    #[test]
    fn test_false_capability_is_not_possessed() {
        let req = EntityRequirement::new("agent", ["cooking"]).unwrap();
        let lapsed = caps(&[
            ("type", Value::Str("agent".into())),
            ("cooking", Value::Bool(false)),
        ]);
        assert!(!req.matches(&lapsed));
    }

    #[test]
    fn test_dedup_key_sorts_capabilities() {
        let a = EntityRequirement::new("agent", ["b", "a"]).unwrap();
        let b = EntityRequirement::new("agent", ["a", "b"]).unwrap();
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}

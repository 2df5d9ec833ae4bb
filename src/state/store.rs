// =============================================================================
//  Astra HTN - World State
//  File: store.rs
//
//  Description:
//      The immutable world state: a two-level fact map plus entity
//      capability maps. Mutators return a fresh state; the inner maps are
//      Arc-shared so snapshots taken at choice points cost one pointer bump
//      per predicate, and backtracking restores are plain reference swaps.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-10
//  Updated:     2026-07-26
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::state::entity::EntityRequirement;
use crate::state::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// A planning state: facts and entities.
///
/// A fact is present iff its subject appears under its predicate. Entities
/// live in a parallel map from entity id to capability map; the BTreeMap
/// keeps entity iteration deterministic so requirement assignment never
/// depends on hash order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    name: String,
    facts: HashMap<String, Arc<HashMap<String, Value>>>,
    entities: BTreeMap<String, Arc<HashMap<String, Value>>>,
}

impl State {
    /// Creates an empty state with a diagnostic name.
    pub fn new(name: impl Into<String>) -> Self {
        State {
            name: name.into(),
            facts: HashMap::new(),
            entities: BTreeMap::new(),
        }
    }

    /// The diagnostic name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    // ------------------------------------------------------------------
    // Facts
    // ------------------------------------------------------------------

    /// Returns a new state with `(predicate, subject) = value` set,
    /// inserting the predicate level if absent.
    pub fn set_fact(&self, predicate: &str, subject: &str, value: impl Into<Value>) -> State {
        let mut next = self.clone();
        let level = next
            .facts
            .entry(predicate.to_string())
            .or_insert_with(|| Arc::new(HashMap::new()));
        Arc::make_mut(level).insert(subject.to_string(), value.into());
        next
    }

    /// Looks up the value of a fact.
    pub fn get_fact(&self, predicate: &str, subject: &str) -> Option<&Value> {
        self.facts.get(predicate).and_then(|level| level.get(subject))
    }

    /// True iff the fact exists and equals `expected` under value-equality.
    pub fn matches(&self, predicate: &str, subject: &str, expected: &Value) -> bool {
        self.get_fact(predicate, subject) == Some(expected)
    }

    /// Iterates over every `(predicate, subject, value)` triple. Order is
    /// unspecified.
    pub fn to_triples(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.facts.iter().flat_map(|(predicate, level)| {
            level
                .iter()
                .map(move |(subject, value)| (predicate.as_str(), subject.as_str(), value))
        })
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Returns a new state with one capability of an entity set, creating
    /// the entity if absent.
    pub fn set_entity_capability(
        &self,
        entity_id: &str,
        capability: &str,
        value: impl Into<Value>,
    ) -> State {
        let mut next = self.clone();
        let caps = next
            .entities
            .entry(entity_id.to_string())
            .or_insert_with(|| Arc::new(HashMap::new()));
        Arc::make_mut(caps).insert(capability.to_string(), value.into());
        next
    }

    /// Looks up one capability value of an entity.
    pub fn get_entity_capability(&self, entity_id: &str, capability: &str) -> Option<&Value> {
        self.entities
            .get(entity_id)
            .and_then(|caps| caps.get(capability))
    }

    /// True when the entity id is known to this state.
    pub fn has_entity(&self, entity_id: &str) -> bool {
        self.entities.contains_key(entity_id)
    }

    /// Iterates over all entity ids in lexicographic order.
    pub fn all_entities(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Finds the first entity (in id order) satisfying the requirement.
    pub fn find_entity_for(&self, requirement: &EntityRequirement) -> Option<&str> {
        self.entities
            .iter()
            .find(|(_, caps)| requirement.matches(caps))
            .map(|(id, _)| id.as_str())
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state '{}':", self.name)?;
        let mut triples: Vec<_> = self
            .to_triples()
            .map(|(p, s, v)| format!("  {p}[{s}] = {v}"))
            .collect();
        triples.sort();
        for line in triples {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

// =============================================================================
//  Astra HTN - Planner Metadata
//  File: metadata.rs
//
//  Description:
//      The temporal and resource annotations attached to refinement
//      elements: an optional duration, optional start/end instants, and an
//      ordered, deduplicated list of entity requirements. Metadata values
//      merge via their Allen relation; the merged duration comes from the
//      second operand so the more recent scope dominates.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-13
//  Updated:     2026-07-27
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::error::{PlanError, Result};
use crate::state::EntityRequirement;
use crate::temporal::allen::AllenRelation;
use crate::temporal::duration::{parse_instant, IsoDuration};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Temporal and resource annotations for one refinement element.
///
/// Invariant: when `start_time`, `end_time`, and `duration` are all set,
/// `end_time - start_time >= duration`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub duration: Option<IsoDuration>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub requires_entities: Vec<EntityRequirement>,
}

impl Metadata {
    pub fn new() -> Self {
        Metadata::default()
    }

    /// Sets the duration from its ISO-8601 wire form.
    pub fn with_duration(mut self, iso: &str) -> Result<Self> {
        self.duration = Some(IsoDuration::parse(iso)?);
        self.check_window()?;
        Ok(self)
    }

    /// Sets the start instant from its RFC 3339 wire form.
    pub fn with_start_time(mut self, iso: &str) -> Result<Self> {
        self.start_time = Some(parse_instant(iso)?);
        self.check_window()?;
        Ok(self)
    }

    /// Sets the end instant from its RFC 3339 wire form.
    pub fn with_end_time(mut self, iso: &str) -> Result<Self> {
        self.end_time = Some(parse_instant(iso)?);
        self.check_window()?;
        Ok(self)
    }

    /// Appends an entity requirement, deduplicating on
    /// `(type, sorted capabilities)`.
    pub fn with_entity_requirement(mut self, requirement: EntityRequirement) -> Self {
        self.push_requirement(requirement);
        self
    }

    fn push_requirement(&mut self, requirement: EntityRequirement) {
        let key = requirement.dedup_key();
        if !self.requires_entities.iter().any(|r| r.dedup_key() == key) {
            self.requires_entities.push(requirement);
        }
    }

    /// True when no field carries information.
    pub fn is_empty(&self) -> bool {
        self.duration.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.requires_entities.is_empty()
    }

    /// True when the metadata constrains time in any way.
    pub fn has_temporal(&self) -> bool {
        self.duration.is_some() || self.start_time.is_some() || self.end_time.is_some()
    }

    pub fn start_micros(&self) -> Option<i64> {
        self.start_time.map(|t| t.timestamp_micros())
    }

    pub fn end_micros(&self) -> Option<i64> {
        self.end_time.map(|t| t.timestamp_micros())
    }

    /// Resolves the concrete `(start, end)` interval in microseconds, if the
    /// endpoints are determined: both instants, or one instant plus the
    /// duration. A lone duration stays symbolic and yields `None`.
    pub fn interval_micros(&self) -> Option<(i64, i64)> {
        match (self.start_micros(), self.end_micros(), self.duration) {
            (Some(start), Some(end), _) => Some((start, end)),
            (Some(start), None, Some(d)) => Some((start, start + d.as_micros())),
            (None, Some(end), Some(d)) => Some((end - d.as_micros(), end)),
            _ => None,
        }
    }

    /// Enforces the window invariant (`end - start >= duration`, and
    /// `end >= start`).
    fn check_window(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_micros(), self.end_micros()) {
            let window = end - start;
            let needed = self.duration.map(|d| d.as_micros()).unwrap_or(0);
            if window < 0 || window < needed {
                return Err(PlanError::TemporalInconsistent {
                    points: vec!["start_time".to_string(), "end_time".to_string()],
                });
            }
        }
        Ok(())
    }

    /// Merges two metadata values via their Allen relation.
    ///
    /// The merged endpoints follow the relation table (union for
    /// before/after/meets/overlaps, the shared endpoint plus envelope for
    /// starts/finishes, intersection for their converses, the outer
    /// interval for contains/during). The merged duration is the second
    /// operand's, falling back to the first's; entity requirements are
    /// set-unioned with deduplication.
    pub fn merge(&self, other: &Metadata) -> Metadata {
        let i1 = self.interval_micros();
        let i2 = other.interval_micros();
        let relation = AllenRelation::classify_opt(i1, i2);

        let (start, end) = match (i1, i2) {
            (Some((s1, e1)), Some((s2, e2))) => {
                let merged = match relation {
                    AllenRelation::Before
                    | AllenRelation::After
                    | AllenRelation::Meets
                    | AllenRelation::MetBy
                    | AllenRelation::Overlaps
                    | AllenRelation::OverlappedBy => (s1.min(s2), e1.max(e2)),
                    AllenRelation::Starts => (s1, e1.max(e2)),
                    AllenRelation::StartedBy => (s1, e1.min(e2)),
                    AllenRelation::Finishes => (s1.min(s2), e1),
                    AllenRelation::FinishedBy => (s1.max(s2), e1),
                    AllenRelation::During => (s2, e2),
                    AllenRelation::Contains | AllenRelation::Equals => (s1, e1),
                };
                (Some(merged.0), Some(merged.1))
            }
            // With a symbolic side, keep the earliest known start and the
            // latest known end.
            _ => {
                let start = match (self.start_micros(), other.start_micros()) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                let end = match (self.end_micros(), other.end_micros()) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    (a, b) => a.or(b),
                };
                (start, end)
            }
        };

        let mut merged = Metadata {
            duration: other.duration.or(self.duration),
            start_time: start.and_then(micros_to_instant),
            end_time: end.and_then(micros_to_instant),
            requires_entities: self.requires_entities.clone(),
        };
        for requirement in &other.requires_entities {
            merged.push_requirement(requirement.clone());
        }
        merged
    }
}

fn micros_to_instant(micros: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_micros(micros).map(|utc| utc.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::duration::MICROS_PER_MINUTE;

    #[test]
    fn test_window_invariant() {
        let ok = Metadata::new()
            .with_start_time("2026-02-01T10:00:00Z")
            .unwrap()
            .with_end_time("2026-02-01T10:10:00Z")
            .unwrap()
            .with_duration("PT5M");
        assert!(ok.is_ok());

        let too_tight = Metadata::new()
            .with_start_time("2026-02-01T10:00:00Z")
            .unwrap()
            .with_end_time("2026-02-01T10:03:00Z")
            .unwrap()
            .with_duration("PT5M");
        assert!(matches!(
            too_tight,
            Err(PlanError::TemporalInconsistent { .. })
        ));

        let reversed = Metadata::new()
            .with_start_time("2026-02-01T10:00:00Z")
            .unwrap()
            .with_end_time("2026-02-01T09:00:00Z");
        assert!(reversed.is_err());
    }

    #[test]
    fn test_interval_resolution() {
        let symbolic = Metadata::new().with_duration("PT5M").unwrap();
        assert_eq!(symbolic.interval_micros(), None);

        let anchored = Metadata::new()
            .with_duration("PT5M")
            .unwrap()
            .with_start_time("2026-02-01T10:00:00Z")
            .unwrap();
        let (start, end) = anchored.interval_micros().unwrap();
        assert_eq!(end - start, 5 * MICROS_PER_MINUTE);
    }

    #[test]
    fn test_requirement_dedup() {
        let req_a = EntityRequirement::new("agent", ["b", "a"]).unwrap();
        let req_b = EntityRequirement::new("agent", ["a", "b"]).unwrap();
        let meta = Metadata::new()
            .with_entity_requirement(req_a)
            .with_entity_requirement(req_b);
        assert_eq!(meta.requires_entities.len(), 1);
    }

    #[test]
    fn test_merge_overlapping_instants() {
        let m1 = Metadata::new()
            .with_duration("PT5M")
            .unwrap()
            .with_start_time("2026-02-01T10:00:00Z")
            .unwrap();
        let m2 = Metadata::new()
            .with_duration("PT5M")
            .unwrap()
            .with_start_time("2026-02-01T10:03:00Z")
            .unwrap();

        let relation = AllenRelation::classify_opt(m1.interval_micros(), m2.interval_micros());
        assert_eq!(relation, AllenRelation::Overlaps);

        let merged = m1.merge(&m2);
        let (start, end) = merged.interval_micros().unwrap();
        assert_eq!(end - start, 8 * MICROS_PER_MINUTE);
        assert_eq!(merged.duration.unwrap().to_iso_string(), "PT5M");
        assert_eq!(
            merged.start_time.unwrap().timestamp_micros(),
            m1.start_time.unwrap().timestamp_micros()
        );
    }

    #[test]
    fn test_merge_with_self_is_stable() {
        let meta = Metadata::new()
            .with_duration("PT5M")
            .unwrap()
            .with_start_time("2026-02-01T10:00:00Z")
            .unwrap()
            .with_entity_requirement(EntityRequirement::new("agent", ["cooking"]).unwrap());
        let merged = meta.merge(&meta);
        assert_eq!(merged.duration, meta.duration);
        assert_eq!(merged.interval_micros(), meta.interval_micros());
        assert_eq!(merged.requires_entities, meta.requires_entities);
    }

    #[test]
    fn test_merge_second_duration_wins() {
        let m1 = Metadata::new().with_duration("PT10M").unwrap();
        let m2 = Metadata::new().with_duration("PT2M").unwrap();
        assert_eq!(m1.merge(&m2).duration.unwrap().to_iso_string(), "PT2M");
        // Falls back to the first operand's when the second has none.
        let bare = Metadata::new();
        assert_eq!(m1.merge(&bare).duration.unwrap().to_iso_string(), "PT10M");
    }
}

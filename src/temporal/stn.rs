// =============================================================================
//  Astra HTN - Simple Temporal Network
//  File: stn.rs
//
//  Description:
//      Time-points and pairwise interval constraints "v - u in [lo, hi]"
//      over integer ticks. Every stored constraint keeps its reverse in
//      sync; adds tighten by intersection and fail on an empty result.
//      Consistency is decided by Floyd-Warshall propagation over the
//      distance graph (no negative cycle), run lazily behind a dirty flag.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-14
//  Updated:     2026-07-28
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sentinel for an unbounded lower end.
pub const NEG_INF: i64 = i64::MIN;
/// Sentinel for an unbounded upper end.
pub const POS_INF: i64 = i64::MAX;

fn neg(bound: i64) -> i64 {
    match bound {
        POS_INF => NEG_INF,
        NEG_INF => POS_INF,
        v => -v,
    }
}

fn bound_add(a: i64, b: i64) -> i64 {
    if a == POS_INF || b == POS_INF {
        POS_INF
    } else {
        a.saturating_add(b)
    }
}

/// A closed interval `[lo, hi]` over ticks, with infinity sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: i64,
    pub hi: i64,
}

impl Interval {
    pub fn new(lo: i64, hi: i64) -> Self {
        Interval { lo, hi }
    }

    /// The degenerate interval `[v, v]`.
    pub fn exact(v: i64) -> Self {
        Interval { lo: v, hi: v }
    }

    /// The half-bounded interval `[v, +inf]`.
    pub fn at_least(v: i64) -> Self {
        Interval { lo: v, hi: POS_INF }
    }

    /// The unconstrained interval `[-inf, +inf]`.
    pub fn full() -> Self {
        Interval {
            lo: NEG_INF,
            hi: POS_INF,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// The reverse-direction interval `[-hi, -lo]`.
    pub fn invert(&self) -> Interval {
        Interval {
            lo: neg(self.hi),
            hi: neg(self.lo),
        }
    }

    /// Pure intersection `[max(lo), min(hi)]`, `None` when empty.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let tightened = Interval {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        };
        if tightened.is_empty() {
            None
        } else {
            Some(tightened)
        }
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lo {
            NEG_INF => write!(f, "[-inf, ")?,
            v => write!(f, "[{v}, ")?,
        }
        match self.hi {
            POS_INF => write!(f, "+inf]"),
            v => write!(f, "{v}]"),
        }
    }
}

/// Handle to a time-point inside one `Stn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimePoint(pub usize);

/// The tick size of the network: how many base microseconds one tick spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl Resolution {
    pub fn micros_per_tick(&self) -> i64 {
        match self {
            Resolution::Microsecond => 1,
            Resolution::Millisecond => 1_000,
            Resolution::Second => 1_000_000,
            Resolution::Minute => 60 * 1_000_000,
            Resolution::Hour => 3_600 * 1_000_000,
            Resolution::Day => 86_400 * 1_000_000,
        }
    }
}

/// A simple temporal network over integer ticks.
#[derive(Debug, Clone)]
pub struct Stn {
    labels: Vec<String>,
    constraints: HashMap<(usize, usize), Interval>,
    resolution: Resolution,
    dirty: bool,
    consistent: bool,
    distances: Vec<i64>,
}

impl Stn {
    pub fn new(resolution: Resolution) -> Self {
        Stn {
            labels: Vec::new(),
            constraints: HashMap::new(),
            resolution,
            dirty: false,
            consistent: true,
            distances: Vec::new(),
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, point: TimePoint) -> &str {
        &self.labels[point.0]
    }

    /// Registers a new time-point and returns its handle.
    pub fn add_time_point(&mut self, label: impl Into<String>) -> TimePoint {
        self.labels.push(label.into());
        self.dirty = true;
        TimePoint(self.labels.len() - 1)
    }

    /// Installs `v - u in [lo, hi]`, tightening an existing constraint by
    /// intersection. The reverse constraint is kept in sync. Fails when the
    /// intersection is empty.
    pub fn add_constraint(&mut self, u: TimePoint, v: TimePoint, interval: Interval) -> Result<()> {
        if interval.is_empty() {
            return Err(self.inconsistency(u, v));
        }
        let tightened = match self.constraints.get(&(u.0, v.0)) {
            Some(existing) => existing
                .intersect(&interval)
                .ok_or_else(|| self.inconsistency(u, v))?,
            None => interval,
        };
        self.constraints.insert((u.0, v.0), tightened);
        self.constraints.insert((v.0, u.0), tightened.invert());
        self.dirty = true;
        Ok(())
    }

    /// The tightest known interval for `v - u` after propagation, `None`
    /// when the pair is completely unconstrained.
    pub fn get_constraint(&mut self, u: TimePoint, v: TimePoint) -> Option<Interval> {
        self.propagate();
        let n = self.labels.len();
        if u.0 >= n || v.0 >= n {
            return None;
        }
        let interval = Interval {
            lo: neg(self.distances[v.0 * n + u.0]),
            hi: self.distances[u.0 * n + v.0],
        };
        if interval == Interval::full() {
            None
        } else {
            Some(interval)
        }
    }

    /// True when the distance graph has no negative cycle.
    pub fn is_consistent(&mut self) -> bool {
        self.propagate();
        self.consistent
    }

    /// All-pairs shortest-path propagation; idempotent until the network
    /// changes again.
    pub fn propagate(&mut self) {
        if !self.dirty {
            return;
        }
        let n = self.labels.len();
        let mut d = vec![POS_INF; n * n];
        for i in 0..n {
            d[i * n + i] = 0;
        }
        for (&(u, v), interval) in &self.constraints {
            let cell = &mut d[u * n + v];
            *cell = (*cell).min(interval.hi);
        }
        for k in 0..n {
            for i in 0..n {
                let dik = d[i * n + k];
                if dik == POS_INF {
                    continue;
                }
                for j in 0..n {
                    let through = bound_add(dik, d[k * n + j]);
                    if through < d[i * n + j] {
                        d[i * n + j] = through;
                    }
                }
            }
        }
        self.consistent = (0..n).all(|i| d[i * n + i] >= 0);
        self.distances = d;
        self.dirty = false;
    }

    /// Rescales every stored interval to a new resolution. Lower bounds
    /// round down, upper bounds round up, so every rescaled interval
    /// contains the original and reverse constraints stay the exact
    /// inversion of their forward twin.
    pub fn rescale(&mut self, resolution: Resolution) {
        if resolution == self.resolution {
            return;
        }
        let from = self.resolution.micros_per_tick();
        let to = resolution.micros_per_tick();
        for interval in self.constraints.values_mut() {
            *interval = Interval {
                lo: scale_floor(interval.lo, from, to),
                hi: scale_ceil(interval.hi, from, to),
            };
        }
        self.resolution = resolution;
        self.dirty = true;
    }

    fn inconsistency(&self, u: TimePoint, v: TimePoint) -> PlanError {
        PlanError::TemporalInconsistent {
            points: vec![self.labels[u.0].clone(), self.labels[v.0].clone()],
        }
    }
}

fn scale_floor(bound: i64, from: i64, to: i64) -> i64 {
    if bound == NEG_INF || bound == POS_INF {
        return bound;
    }
    let exact = bound as i128 * from as i128;
    let to = to as i128;
    let quotient = exact / to;
    if exact % to != 0 && exact < 0 {
        (quotient - 1) as i64
    } else {
        quotient as i64
    }
}

fn scale_ceil(bound: i64, from: i64, to: i64) -> i64 {
    if bound == NEG_INF || bound == POS_INF {
        return bound;
    }
    let exact = bound as i128 * from as i128;
    let to = to as i128;
    let quotient = exact / to;
    if exact % to != 0 && exact > 0 {
        (quotient + 1) as i64
    } else {
        quotient as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_tightens_and_detects_empty() {
        let a = Interval::new(0, 10);
        let b = Interval::new(5, 20);
        assert_eq!(a.intersect(&b), Some(Interval::new(5, 10)));
        let c = Interval::new(11, 12);
        assert_eq!(a.intersect(&c), None);
        let open = Interval::at_least(3);
        assert_eq!(a.intersect(&open), Some(Interval::new(3, 10)));
    }

    #[test]
    fn test_invert_handles_infinities() {
        assert_eq!(Interval::at_least(5).invert(), Interval::new(NEG_INF, -5));
        assert_eq!(Interval::full().invert(), Interval::full());
        assert_eq!(Interval::new(-3, 7).invert(), Interval::new(-7, 3));
    }

    #[test]
    fn test_constraint_roundtrip() {
        let mut stn = Stn::new(Resolution::Second);
        let a = stn.add_time_point("a");
        let b = stn.add_time_point("b");
        stn.add_constraint(a, b, Interval::new(3, 8)).unwrap();

        let forward = stn.get_constraint(a, b).unwrap();
        assert!(Interval::new(3, 8).contains(&forward));
        let backward = stn.get_constraint(b, a).unwrap();
        assert_eq!(backward, forward.invert());
    }

    #[test]
    fn test_propagation_tightens_through_chains() {
        let mut stn = Stn::new(Resolution::Second);
        let a = stn.add_time_point("a");
        let b = stn.add_time_point("b");
        let c = stn.add_time_point("c");
        stn.add_constraint(a, b, Interval::new(1, 5)).unwrap();
        stn.add_constraint(b, c, Interval::new(2, 4)).unwrap();
        stn.add_constraint(a, c, Interval::new(0, 20)).unwrap();

        // a -> c must be within [3, 9] once the chain is propagated.
        assert_eq!(stn.get_constraint(a, c), Some(Interval::new(3, 9)));
        assert!(stn.is_consistent());
    }

    #[test]
    fn test_inconsistency_detected() {
        let mut stn = Stn::new(Resolution::Second);
        let a = stn.add_time_point("a");
        let b = stn.add_time_point("b");
        let c = stn.add_time_point("c");
        stn.add_constraint(a, b, Interval::exact(5)).unwrap();
        stn.add_constraint(b, c, Interval::exact(5)).unwrap();
        // a -> c = 10 through the chain; forcing [0, 3] is a negative cycle.
        stn.add_constraint(a, c, Interval::new(0, 3)).unwrap();
        assert!(!stn.is_consistent());
    }

    #[test]
    fn test_empty_intersection_fails_fast() {
        let mut stn = Stn::new(Resolution::Second);
        let a = stn.add_time_point("a");
        let b = stn.add_time_point("b");
        stn.add_constraint(a, b, Interval::new(0, 5)).unwrap();
        let err = stn.add_constraint(a, b, Interval::new(6, 9));
        assert!(matches!(err, Err(PlanError::TemporalInconsistent { .. })));
    }

    #[test]
    fn test_unconstrained_pair_is_none() {
        let mut stn = Stn::new(Resolution::Second);
        let a = stn.add_time_point("a");
        let b = stn.add_time_point("b");
        let c = stn.add_time_point("c");
        stn.add_constraint(a, b, Interval::new(0, 5)).unwrap();
        assert_eq!(stn.get_constraint(a, c), None);
        assert!(stn.get_constraint(a, b).is_some());
    }

    #[test]
    fn test_rescale_preserves_direction_of_rounding() {
        let mut stn = Stn::new(Resolution::Second);
        let a = stn.add_time_point("a");
        let b = stn.add_time_point("b");
        // 90 seconds -> minutes: the lower bound rounds down, the upper
        // bound rounds up, so the scaled interval contains the original.
        stn.add_constraint(a, b, Interval::new(90, 90)).unwrap();
        stn.rescale(Resolution::Minute);
        let scaled = stn.get_constraint(a, b).unwrap();
        assert_eq!(scaled, Interval::new(1, 2));
        let reverse = stn.get_constraint(b, a).unwrap();
        assert_eq!(reverse, Interval::new(-2, -1));
        assert_eq!(stn.resolution(), Resolution::Minute);
    }

    #[test]
    fn test_rescale_to_finer_resolution_is_exact() {
        let mut stn = Stn::new(Resolution::Minute);
        let a = stn.add_time_point("a");
        let b = stn.add_time_point("b");
        stn.add_constraint(a, b, Interval::new(2, 3)).unwrap();
        stn.rescale(Resolution::Second);
        assert_eq!(stn.get_constraint(a, b), Some(Interval::new(120, 180)));
    }
}

// =============================================================================
//  Astra HTN - Allen Interval Relations
//  File: allen.rs
//
//  Description:
//      The thirteen qualitative relations between two closed intervals,
//      classified from endpoint comparisons. When an endpoint is only known
//      symbolically (a duration without an anchoring instant) the classifier
//      falls back to Overlaps, the weakest non-trivial relation; precise
//      relations emerge once both intervals have concrete instants.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-13
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of Allen's thirteen interval relations, read as "I1 <relation> I2".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllenRelation {
    Before,
    After,
    Meets,
    MetBy,
    Overlaps,
    OverlappedBy,
    Starts,
    StartedBy,
    During,
    Contains,
    Finishes,
    FinishedBy,
    Equals,
}

impl AllenRelation {
    /// Classifies two concrete intervals given as `(start, end)` pairs in
    /// microseconds. The endpoints are assumed ordered (`start <= end`).
    pub fn classify(i1: (i64, i64), i2: (i64, i64)) -> AllenRelation {
        let (s1, e1) = i1;
        let (s2, e2) = i2;
        if s1 == s2 && e1 == e2 {
            AllenRelation::Equals
        } else if e1 < s2 {
            AllenRelation::Before
        } else if e1 == s2 {
            AllenRelation::Meets
        } else if s1 > e2 {
            AllenRelation::After
        } else if s1 == e2 {
            AllenRelation::MetBy
        } else if s1 == s2 {
            if e1 < e2 {
                AllenRelation::Starts
            } else {
                AllenRelation::StartedBy
            }
        } else if e1 == e2 {
            if s1 > s2 {
                AllenRelation::Finishes
            } else {
                AllenRelation::FinishedBy
            }
        } else if s1 > s2 && e1 < e2 {
            AllenRelation::During
        } else if s1 < s2 && e1 > e2 {
            AllenRelation::Contains
        } else if s1 < s2 {
            AllenRelation::Overlaps
        } else {
            AllenRelation::OverlappedBy
        }
    }

    /// Classifies two possibly-symbolic intervals. An interval without
    /// concrete endpoints defaults the pair to `Overlaps`.
    pub fn classify_opt(i1: Option<(i64, i64)>, i2: Option<(i64, i64)>) -> AllenRelation {
        match (i1, i2) {
            (Some(a), Some(b)) => AllenRelation::classify(a, b),
            _ => AllenRelation::Overlaps,
        }
    }

    /// The converse relation, i.e. `classify(b, a)` for `classify(a, b)`.
    pub fn inverse(&self) -> AllenRelation {
        match self {
            AllenRelation::Before => AllenRelation::After,
            AllenRelation::After => AllenRelation::Before,
            AllenRelation::Meets => AllenRelation::MetBy,
            AllenRelation::MetBy => AllenRelation::Meets,
            AllenRelation::Overlaps => AllenRelation::OverlappedBy,
            AllenRelation::OverlappedBy => AllenRelation::Overlaps,
            AllenRelation::Starts => AllenRelation::StartedBy,
            AllenRelation::StartedBy => AllenRelation::Starts,
            AllenRelation::During => AllenRelation::Contains,
            AllenRelation::Contains => AllenRelation::During,
            AllenRelation::Finishes => AllenRelation::FinishedBy,
            AllenRelation::FinishedBy => AllenRelation::Finishes,
            AllenRelation::Equals => AllenRelation::Equals,
        }
    }
}

impl fmt::Display for AllenRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AllenRelation::Before => "before",
            AllenRelation::After => "after",
            AllenRelation::Meets => "meets",
            AllenRelation::MetBy => "met-by",
            AllenRelation::Overlaps => "overlaps",
            AllenRelation::OverlappedBy => "overlapped-by",
            AllenRelation::Starts => "starts",
            AllenRelation::StartedBy => "started-by",
            AllenRelation::During => "during",
            AllenRelation::Contains => "contains",
            AllenRelation::Finishes => "finishes",
            AllenRelation::FinishedBy => "finished-by",
            AllenRelation::Equals => "equals",
        };
        write!(f, "{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AllenRelation::*;

    #[test]
    fn test_all_thirteen_relations() {
        let cases = [
            ((0, 2), (5, 9), Before),
            ((5, 9), (0, 2), After),
            ((0, 5), (5, 9), Meets),
            ((5, 9), (0, 5), MetBy),
            ((0, 6), (5, 9), Overlaps),
            ((5, 9), (0, 6), OverlappedBy),
            ((5, 7), (5, 9), Starts),
            ((5, 9), (5, 7), StartedBy),
            ((6, 8), (5, 9), During),
            ((5, 9), (6, 8), Contains),
            ((7, 9), (5, 9), Finishes),
            ((5, 9), (7, 9), FinishedBy),
            ((5, 9), (5, 9), Equals),
        ];
        for (a, b, expected) in cases {
            assert_eq!(
                AllenRelation::classify(a, b),
                expected,
                "classify({a:?}, {b:?})"
            );
        }
    }

    #[test]
    fn test_inverse_matches_swapped_classification() {
        let intervals = [(0, 2), (0, 5), (0, 6), (5, 7), (6, 8), (5, 9), (7, 9)];
        for &a in &intervals {
            for &b in &intervals {
                let forward = AllenRelation::classify(a, b);
                let backward = AllenRelation::classify(b, a);
                assert_eq!(forward.inverse(), backward, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_symbolic_defaults_to_overlaps() {
        assert_eq!(AllenRelation::classify_opt(None, Some((0, 5))), Overlaps);
        assert_eq!(AllenRelation::classify_opt(Some((0, 5)), None), Overlaps);
        assert_eq!(AllenRelation::classify_opt(None, None), Overlaps);
    }
}

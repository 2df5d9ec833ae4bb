// =============================================================================
//  Astra HTN - Temporal Merge Integration Tests
//  File: temporal_merge.rs
//
//  Description:
//      End-to-end checks of the temporal metadata surface: wire-form
//      parsing, Allen classification of anchored metadata, the merge table,
//      and the network round-trip guarantees.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-25
//
//  This file is dual licensed under the MIT and Apache 2.0 licenses.
// =============================================================================

use astra_htn::temporal::duration::MICROS_PER_MINUTE;
use astra_htn::{AllenRelation, Interval, IsoDuration, Metadata, PlanError, Resolution, Stn};

#[test]
fn test_overlapping_metadata_merges_to_the_envelope() {
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

    assert_eq!(
        AllenRelation::classify_opt(m1.interval_micros(), m2.interval_micros()),
        AllenRelation::Overlaps
    );

    let merged = m1.merge(&m2);
    let (start, end) = merged.interval_micros().unwrap();
    assert_eq!(start, m1.start_micros().unwrap());
    assert_eq!(end - start, 8 * MICROS_PER_MINUTE);
    // The second operand's duration is the merged duration.
    assert_eq!(merged.duration.unwrap().to_iso_string(), "PT5M");
}

#[test]
fn test_merge_with_itself_is_idempotent() {
    let meta = Metadata::new()
        .with_duration("PT15M")
        .unwrap()
        .with_start_time("2026-02-01T09:00:00Z")
        .unwrap()
        .with_end_time("2026-02-01T09:30:00Z")
        .unwrap();
    let merged = meta.merge(&meta);
    assert_eq!(merged.interval_micros(), meta.interval_micros());
    assert_eq!(merged.duration, meta.duration);
}

#[test]
fn test_duration_only_metadata_classifies_as_overlaps() {
    let symbolic = Metadata::new().with_duration("PT5M").unwrap();
    let anchored = Metadata::new()
        .with_start_time("2026-02-01T10:00:00Z")
        .unwrap()
        .with_end_time("2026-02-01T10:05:00Z")
        .unwrap();
    assert_eq!(
        AllenRelation::classify_opt(symbolic.interval_micros(), anchored.interval_micros()),
        AllenRelation::Overlaps
    );
    // Merging keeps the known anchor and the symbolic duration.
    let merged = symbolic.merge(&anchored);
    assert_eq!(merged.start_micros(), anchored.start_micros());
    assert_eq!(merged.duration, symbolic.duration);
}

#[test]
fn test_contains_and_during_pick_the_outer_interval() {
    let outer = Metadata::new()
        .with_start_time("2026-02-01T10:00:00Z")
        .unwrap()
        .with_end_time("2026-02-01T11:00:00Z")
        .unwrap();
    let inner = Metadata::new()
        .with_start_time("2026-02-01T10:15:00Z")
        .unwrap()
        .with_end_time("2026-02-01T10:30:00Z")
        .unwrap();

    let merged = outer.merge(&inner);
    assert_eq!(merged.interval_micros(), outer.interval_micros());
    let merged = inner.merge(&outer);
    assert_eq!(merged.interval_micros(), outer.interval_micros());
}

#[test]
fn test_wire_validation_rejects_bad_forms() {
    assert!(matches!(
        Metadata::new().with_duration("five minutes"),
        Err(PlanError::InvalidDuration(_))
    ));
    assert!(matches!(
        Metadata::new().with_start_time("2026-02-01 10:00"),
        Err(PlanError::InvalidInstant(_))
    ));
    assert!(IsoDuration::parse("P1D").is_err());
    assert!(IsoDuration::parse("PT1H2M3S").is_ok());
}

#[test]
fn test_stn_roundtrip_within_requested_bounds() {
    let mut stn = Stn::new(Resolution::Second);
    let u = stn.add_time_point("u");
    let v = stn.add_time_point("v");
    let w = stn.add_time_point("w");
    stn.add_constraint(u, v, Interval::new(10, 20)).unwrap();
    stn.add_constraint(v, w, Interval::new(0, 5)).unwrap();
    stn.add_constraint(u, w, Interval::new(0, 22)).unwrap();

    let uv = stn.get_constraint(u, v).unwrap();
    assert!(Interval::new(10, 20).contains(&uv));
    let vu = stn.get_constraint(v, u).unwrap();
    assert_eq!(vu, uv.invert());
    assert!(stn.is_consistent());
}

#[test]
fn test_lod_rescale_keeps_containment() {
    let mut stn = Stn::new(Resolution::Second);
    let u = stn.add_time_point("u");
    let v = stn.add_time_point("v");
    stn.add_constraint(u, v, Interval::new(61, 119)).unwrap();

    stn.rescale(Resolution::Minute);
    let scaled = stn.get_constraint(u, v).unwrap();
    // [61s, 119s] becomes [1min, 2min]: wider, never narrower.
    assert_eq!(scaled, Interval::new(1, 2));

    stn.rescale(Resolution::Second);
    let back = stn.get_constraint(u, v).unwrap();
    assert!(back.contains(&Interval::new(61, 119)));
}

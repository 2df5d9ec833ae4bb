// ============================================================================
//                       ASTRA HTN • TEMPORAL LAYER
//        ISO-8601 Metadata, Allen Relations & Simple Temporal Network
// ----------------------------------------------------------------------------
//   Architectural Role:
//       Everything time-related in the planner lives here: validated
//       ISO-8601 durations and instants, the planner metadata attached to
//       refinement elements, the thirteen Allen interval relations with
//       their merge table, and the simple temporal network that keeps a
//       plan's schedule consistent under constraint propagation.
//
//   Core Functions:
//       • Parse and format the ISO-8601 duration/instant wire subset
//       • Carry durations, instants, and entity requirements as Metadata
//       • Classify and merge intervals via Allen relations
//       • Maintain and propagate the simple temporal network
//
//   File:        /src/temporal/mod.rs
//   Author:      Alex Roussinov
//   Created:     2026-07-12
//   Updated:     2026-07-29
//
//   License:
//       Dual-licensed under the MIT and Apache 2.0 licenses.
//       See LICENSE-MIT and LICENSE-APACHE in the repository root for details.
// ============================================================================

pub mod allen;
pub mod duration;
pub mod metadata;
pub mod stn;

pub use allen::AllenRelation;
pub use duration::{format_instant, parse_instant, IsoDuration};
pub use metadata::Metadata;
pub use stn::{Interval, Resolution, Stn, TimePoint};

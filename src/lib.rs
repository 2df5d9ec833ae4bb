// =============================================================================
//  Astra HTN
//  File: lib.rs
//
//  Description: Main library entry point
//
//  Author:      Alex Roussinov
//  Created:     2026-07-10
//  Updated:     2026-07-29
//
//  This file is dual licensed under the MIT and Apache 2.0 licenses.
//  Please see the root level LICENSE-MIT and LICENSE-APACHE files for details.
// =============================================================================

pub mod domain;
pub mod error;
pub mod planner;
pub mod solution;
pub mod state;
pub mod temporal;

pub use domain::{Domain, DomainBuilder, Multigoal, Todo, Unigoal};
pub use error::{PlanError, Result};
pub use planner::{PlanOptions, PlanOutcome, PlanStep, Planner, PlannerBuilder, StepKind};
pub use solution::{NodeKind, NodeStatus, SolutionGraph, SolutionNode};
pub use state::{EntityRequirement, State, Value};
pub use temporal::{AllenRelation, Interval, IsoDuration, Metadata, Resolution, Stn, TimePoint};

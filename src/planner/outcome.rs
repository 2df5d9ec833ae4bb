// =============================================================================
//  Astra HTN - Plan Outcome
//  File: outcome.rs
//
//  Description:
//      What a successful planning run hands back: the ordered command
//      sequence with temporal and entity annotations, the final state, the
//      final temporal network, and the full solution graph.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-18
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::domain::Todo;
use crate::solution::{SolutionGraph, SolutionNode};
use crate::state::{State, Value};
use crate::temporal::{IsoDuration, Stn};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a plan step came from an action or a command registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    Action,
    Command,
}

/// One primitive step of the emitted plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanStep {
    pub name: String,
    pub args: Vec<Value>,
    pub kind: StepKind,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub duration: Option<IsoDuration>,
    pub assigned_entities: Vec<String>,
}

impl PlanStep {
    pub(crate) fn from_node(node: &SolutionNode) -> PlanStep {
        let (name, args, kind) = match &node.info {
            Todo::Action { name, args, .. } => (name.clone(), args.clone(), StepKind::Action),
            Todo::Command { name, args, .. } => (name.clone(), args.clone(), StepKind::Command),
            other => (other.label(), Vec::new(), StepKind::Action),
        };
        PlanStep {
            name,
            args,
            kind,
            start_time: node.start_time,
            end_time: node.end_time,
            duration: node.duration,
            assigned_entities: node.assigned_entities.clone(),
        }
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.args.iter().map(Value::to_string).collect();
        if rendered.is_empty() {
            write!(f, "({})", self.name)?;
        } else {
            write!(f, "({} {})", self.name, rendered.join(" "))?;
        }
        if let Some(duration) = &self.duration {
            write!(f, " [{duration}]")?;
        }
        Ok(())
    }
}

/// The bundle returned by a successful `Planner::plan` call.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Closed action and command leaves, in close order.
    pub steps: Vec<PlanStep>,
    /// The state after the last step.
    pub final_state: State,
    /// The propagated temporal network of the plan.
    pub stn: Stn,
    /// The complete refinement record.
    pub graph: SolutionGraph,
}

impl PlanOutcome {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

// =============================================================================
//  Astra HTN - Error Taxonomy
//  File: error.rs
//
//  Description:
//      Defines the typed error surface of the planning engine. Every failure
//      the planner can report is a variant here; callbacks and validators
//      return these values instead of panicking, and the search loop decides
//      which ones are recoverable (blacklist + backtrack) and which abort the
//      run outright.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-10
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Every failure the planning engine can surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// An action or command callback rejected the current state.
    #[error("precondition failed for '{name}': {reason}")]
    PreconditionFailed { name: String, reason: String },

    /// Every method registered for a task, unigoal, or multigoal was tried
    /// and exhausted. `trace` is the chain of refinements from the root to
    /// the deepest node that failed.
    #[error("no applicable method for {node}")]
    NoApplicableMethod { node: String, trace: Vec<String> },

    /// A command required an entity the state cannot provide.
    #[error("entity requirement unmet: {requirement}")]
    EntityRequirementUnmet { requirement: String },

    /// A constraint add left the temporal network without a solution.
    #[error("temporal network inconsistent at {points:?}")]
    TemporalInconsistent { points: Vec<String> },

    /// A duration string failed ISO-8601 validation.
    #[error("invalid ISO-8601 duration '{0}'")]
    InvalidDuration(String),

    /// An instant string failed ISO-8601 validation.
    #[error("invalid ISO-8601 instant '{0}'")]
    InvalidInstant(String),

    /// The search reached the configured depth bound on every open branch.
    #[error("search depth bound of {max_depth} reached")]
    DepthExhausted { max_depth: usize },

    /// The domain or the inputs were rejected before (or while) searching,
    /// e.g. duplicate action names or a todo naming an unregistered method.
    #[error("domain misconfigured: {detail}")]
    DomainMisconfigured { detail: String },
}

impl PlanError {
    /// Shorthand for the error an action callback returns when its
    /// precondition does not hold.
    pub fn precondition(name: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::PreconditionFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for configuration-level failures.
    pub fn misconfigured(detail: impl Into<String>) -> Self {
        PlanError::DomainMisconfigured {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = PlanError::precondition("pickup", "hand is not empty");
        assert_eq!(
            err.to_string(),
            "precondition failed for 'pickup': hand is not empty"
        );

        let err = PlanError::InvalidDuration("P5M".to_string());
        assert!(err.to_string().contains("P5M"));
    }
}

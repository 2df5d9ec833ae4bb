// ============================================================================
//                        ASTRA HTN • PLANNER FACADE
//        Configuration, Search Entry Point & Plan Assembly
// ----------------------------------------------------------------------------
//   Architectural Role:
//       The public surface of the planning engine. A Planner owns one
//       validated domain plus the run options (depth bound, verbosity,
//       expansion budget, caller-imposed metadata) and turns a state and a
//       todo list into a PlanOutcome, or a typed failure. All search state
//       is local to a call; two planners, or two calls on one planner,
//       never share anything mutable.
//
//   Core Functions:
//       • Build planners fluently via PlannerBuilder
//       • Run the refinement engine over (state, todos)
//       • Assemble the ordered step sequence from the solution graph
//
//   File:        /src/planner/mod.rs
//   Author:      Alex Roussinov
//   Created:     2026-07-18
//   Updated:     2026-07-30
//
//   License:
//       Dual-licensed under the MIT and Apache 2.0 licenses.
//       See LICENSE-MIT and LICENSE-APACHE in the repository root for details.
// ============================================================================

pub mod blacklist;
mod engine;
pub mod outcome;

pub use blacklist::Blacklist;
pub use outcome::{PlanOutcome, PlanStep, StepKind};

use crate::domain::{Domain, Todo};
use crate::error::{PlanError, Result};
use crate::state::State;
use crate::temporal::{Metadata, Resolution};
use engine::Engine;
use log::info;
use std::sync::Arc;

/// Options governing one planning run.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Maximum refinement nesting depth before a branch is cut off.
    pub max_depth: usize,
    /// Verbosity level, 0 (silent) to 3 (per-refinement detail). Output
    /// goes through the `log` facade.
    pub verbose: u8,
    /// Optional budget on todo dispatches; exceeding it cancels the run.
    pub max_expansions: Option<usize>,
    /// Caller-imposed metadata for the whole plan (e.g. entity
    /// requirements validated before the search starts).
    pub metadata: Option<Metadata>,
    /// Tick size of the temporal network.
    pub resolution: Resolution,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            max_depth: 512,
            verbose: 0,
            max_expansions: None,
            metadata: None,
            resolution: Resolution::Microsecond,
        }
    }
}

/// An immutable planner: one domain plus run options.
///
/// Cloning is cheap; the domain is shared. Planning runs on independent
/// inputs may proceed concurrently without coordination.
#[derive(Debug, Clone)]
pub struct Planner {
    domain: Arc<Domain>,
    options: PlanOptions,
}

impl Planner {
    /// Creates a planner with default options.
    pub fn new(domain: Domain) -> Self {
        Planner {
            domain: Arc::new(domain),
            options: PlanOptions::default(),
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    /// Searches for a plan achieving `todos` from `initial_state`.
    ///
    /// Returns the ordered command sequence with temporal annotations, the
    /// final state, the propagated temporal network, and the solution
    /// graph; or the deepest failure when the root exhausts its
    /// alternatives. An empty todo list yields an empty plan.
    pub fn plan(&self, initial_state: State, todos: Vec<Todo>) -> Result<PlanOutcome> {
        if self.options.verbose >= 1 {
            info!(
                "planning in domain '{}' with {} top-level todos",
                self.domain.name(),
                todos.len()
            );
        }
        let engine = Engine::new(&self.domain, &self.options);
        let search = engine.run(initial_state, todos)?;
        let steps: Vec<PlanStep> = search
            .graph
            .closed_actions()
            .map(PlanStep::from_node)
            .collect();
        if self.options.verbose >= 1 {
            info!("found plan with {} steps", steps.len());
        }
        Ok(PlanOutcome {
            steps,
            final_state: search.final_state,
            stn: search.stn,
            graph: search.graph,
        })
    }
}

/// Fluent configuration for `Planner` instances.
#[derive(Debug, Default)]
pub struct PlannerBuilder {
    domain: Option<Domain>,
    options: PlanOptions,
}

impl PlannerBuilder {
    pub fn new() -> Self {
        PlannerBuilder {
            domain: None,
            options: PlanOptions::default(),
        }
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Sets the verbosity level (0 to 3).
    pub fn with_verbose_level(mut self, level: u8) -> Result<Self> {
        if level > 3 {
            return Err(PlanError::misconfigured(format!(
                "verbose level {level} out of range 0..=3"
            )));
        }
        self.options.verbose = level;
        Ok(self)
    }

    pub fn with_max_expansions(mut self, limit: usize) -> Self {
        self.options.max_expansions = Some(limit);
        self
    }

    /// Imposes metadata (e.g. entity requirements) on the whole plan.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.options.metadata = Some(metadata);
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.options.resolution = resolution;
        self
    }

    pub fn build(self) -> Result<Planner> {
        let domain = self
            .domain
            .ok_or_else(|| PlanError::misconfigured("a domain is required to build a planner"))?;
        Ok(Planner {
            domain: Arc::new(domain),
            options: self.options,
        })
    }
}

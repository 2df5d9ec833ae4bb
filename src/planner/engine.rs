// =============================================================================
//  Astra HTN - Search Engine
//  File: engine.rs
//
//  Description:
//      The depth-first refinement loop. Each pending todo is dispatched by
//      kind: primitives invoke their callback and close an action leaf,
//      tasks and goals try their registered methods in order. Every method
//      selection is a choice point that snapshots the temporal network,
//      the blacklist, and a graph mark; a failed subtree restores all three
//      and moves on to the next alternative. The deepest failure seen is
//      kept for the error surfaced when the root exhausts its options.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-18
//  Updated:     2026-07-30
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::domain::registry::ActionFn;
use crate::domain::{Domain, Multigoal, Todo, Unigoal};
use crate::error::{PlanError, Result};
use crate::planner::blacklist::Blacklist;
use crate::planner::PlanOptions;
use crate::solution::{NodeId, NodeKind, NodeStatus, SolutionGraph};
use crate::state::{EntityRequirement, State, Value};
use crate::temporal::{Interval, Metadata, Stn, TimePoint};
use log::debug;
use std::sync::Arc;

/// What a successful search hands back to the planner facade.
pub(crate) struct SearchOutcome {
    pub final_state: State,
    pub graph: SolutionGraph,
    pub stn: Stn,
}

/// Result of refining one branch: a finished plan or a backtrack signal.
enum Seek {
    Done(State),
    Backtrack,
}

/// A todo waiting to be refined, with its graph parent and nesting depth.
#[derive(Debug, Clone)]
struct Pending {
    todo: Todo,
    parent: Option<NodeId>,
    depth: usize,
}

/// Snapshot of the mutable search context at a choice point. Because the
/// state, the network, and the blacklist share structure, capture and
/// restore are cheap. Every method attempt starts from this snapshot, so a
/// failed alternative can never leak effects into its siblings.
struct Checkpoint {
    mark: crate::solution::GraphMark,
    stn: Stn,
    blacklist: Blacklist,
}

impl Checkpoint {
    fn capture(engine: &Engine<'_>) -> Checkpoint {
        Checkpoint {
            mark: engine.graph.mark(),
            stn: engine.stn.clone(),
            blacklist: engine.blacklist.clone(),
        }
    }

    fn restore(&self, engine: &mut Engine<'_>, node: NodeId) {
        engine.graph.truncate(self.mark);
        engine.graph.clear_selected_method(node);
        engine.stn = self.stn.clone();
        engine.blacklist = self.blacklist.clone();
    }
}

/// The deepest failure observed so far, kept for diagnostics.
#[derive(Debug, Clone)]
struct FailureRecord {
    depth: usize,
    node_label: String,
    error: PlanError,
    trace: Vec<String>,
}

pub(crate) struct Engine<'d> {
    domain: &'d Domain,
    options: &'d PlanOptions,
    graph: SolutionGraph,
    stn: Stn,
    origin: TimePoint,
    blacklist: Blacklist,
    command_count: usize,
    expansions: usize,
    hit_depth_bound: bool,
    deepest_failure: Option<FailureRecord>,
}

impl<'d> Engine<'d> {
    pub(crate) fn new(domain: &'d Domain, options: &'d PlanOptions) -> Engine<'d> {
        let mut stn = Stn::new(options.resolution);
        let origin = stn.add_time_point("origin");
        Engine {
            domain,
            options,
            graph: SolutionGraph::new(),
            stn,
            origin,
            blacklist: Blacklist::new(),
            command_count: 0,
            expansions: 0,
            hit_depth_bound: false,
            deepest_failure: None,
        }
    }

    pub(crate) fn run(mut self, state: State, todos: Vec<Todo>) -> Result<SearchOutcome> {
        // Caller-imposed requirements on the whole plan are validated before
        // any search starts.
        if let Some(metadata) = &self.options.metadata {
            self.bind_entities(&state, &metadata.requires_entities)?;
        }
        let pending = todos
            .into_iter()
            .map(|todo| Pending {
                todo,
                parent: None,
                depth: 0,
            })
            .collect();
        match self.seek(state, pending)? {
            Seek::Done(final_state) => {
                self.stn.propagate();
                Ok(SearchOutcome {
                    final_state,
                    graph: self.graph,
                    stn: self.stn,
                })
            }
            Seek::Backtrack => Err(self.failure_error()),
        }
    }

    /// The error surfaced when the root runs out of alternatives.
    fn failure_error(&self) -> PlanError {
        if self.hit_depth_bound {
            return PlanError::DepthExhausted {
                max_depth: self.options.max_depth,
            };
        }
        match &self.deepest_failure {
            Some(record) => match &record.error {
                PlanError::NoApplicableMethod { .. } => PlanError::NoApplicableMethod {
                    node: record.node_label.clone(),
                    trace: record.trace.clone(),
                },
                other => other.clone(),
            },
            None => PlanError::NoApplicableMethod {
                node: "<root>".to_string(),
                trace: Vec::new(),
            },
        }
    }

    /// Remembers a failure if it is deeper than anything seen so far.
    fn note_failure(&mut self, node: Option<NodeId>, error: PlanError) {
        let (node_label, trace) = match node {
            Some(id) => (self.graph.node(id).info.label(), self.graph.trace_to(id)),
            None => ("<temporal check>".to_string(), Vec::new()),
        };
        let depth = trace.len();
        let deeper = self
            .deepest_failure
            .as_ref()
            .map(|record| depth > record.depth)
            .unwrap_or(true);
        if deeper {
            self.deepest_failure = Some(FailureRecord {
                depth,
                node_label,
                error,
                trace,
            });
        }
    }

    fn seek(&mut self, state: State, mut pending: Vec<Pending>) -> Result<Seek> {
        if pending.is_empty() {
            if !self.stn.is_consistent() {
                self.note_failure(
                    None,
                    PlanError::TemporalInconsistent { points: Vec::new() },
                );
                return Ok(Seek::Backtrack);
            }
            return Ok(Seek::Done(state));
        }

        self.expansions += 1;
        if let Some(limit) = self.options.max_expansions {
            if self.expansions > limit {
                self.hit_depth_bound = true;
                return Ok(Seek::Backtrack);
            }
        }

        let Pending {
            todo,
            parent,
            depth,
        } = pending.remove(0);
        let rest = pending;

        let kind = match &todo {
            Todo::Action { .. } | Todo::Command { .. } => NodeKind::Action,
            Todo::Task { .. } => NodeKind::Task,
            Todo::Unigoal { .. } => NodeKind::Goal,
            Todo::Multigoal { .. } => NodeKind::Multigoal,
        };
        let node = self.graph.new_node(kind, todo.clone());
        match parent {
            Some(parent) => self.graph.link(parent, node),
            None => self.graph.add_root(node),
        }

        if self.options.verbose >= 2 {
            debug!("depth {depth} refining {}", todo.label());
        }

        if depth > self.options.max_depth {
            self.hit_depth_bound = true;
            self.graph.set_status(node, NodeStatus::Failed);
            self.note_failure(
                Some(node),
                PlanError::DepthExhausted {
                    max_depth: self.options.max_depth,
                },
            );
            return Ok(Seek::Backtrack);
        }

        match todo {
            Todo::Action {
                name,
                args,
                metadata,
            } => self.apply_primitive(node, state, &name, &args, metadata, false, depth, rest),
            Todo::Command {
                name,
                args,
                metadata,
            } => self.apply_primitive(node, state, &name, &args, metadata, true, depth, rest),
            Todo::Task { name, args, .. } => {
                self.refine_task(node, state, &name, &args, depth, rest)
            }
            Todo::Unigoal { goal, .. } => self.refine_unigoal(node, state, &goal, depth, rest),
            Todo::Multigoal { goal, .. } => {
                self.refine_multigoal(node, state, &goal, depth, rest)
            }
        }
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn apply_primitive(
        &mut self,
        node: NodeId,
        state: State,
        name: &str,
        args: &[Value],
        attached: Option<Metadata>,
        is_command: bool,
        depth: usize,
        rest: Vec<Pending>,
    ) -> Result<Seek> {
        let domain: &'d Domain = self.domain;
        let func: ActionFn = match if is_command {
            domain.get_command(name)
        } else {
            domain.get_action(name)
        } {
            Some(func) => Arc::clone(func),
            None => {
                let kind = if is_command { "command" } else { "action" };
                return Err(PlanError::misconfigured(format!("unknown {kind} '{name}'")));
            }
        };
        self.graph.set_status(node, NodeStatus::InProgress);

        if self.blacklist.is_command_blacklisted(name, args) {
            self.graph.set_status(node, NodeStatus::Failed);
            self.note_failure(
                Some(node),
                PlanError::precondition(name, "blacklisted in this subtree"),
            );
            return Ok(Seek::Backtrack);
        }

        let (next_state, returned) = match (*func)(&state, args) {
            Ok(result) => result,
            Err(error) => {
                if self.options.verbose >= 3 {
                    debug!("depth {depth} {name} not applicable: {error}");
                }
                self.blacklist.blacklist_command(name, args);
                self.graph.set_status(node, NodeStatus::Failed);
                self.note_failure(Some(node), error);
                return Ok(Seek::Backtrack);
            }
        };

        // Attached metadata composes with the callback's effect metadata;
        // the callback's scope is the more recent one.
        let effective = match attached {
            Some(meta) if !returned.is_empty() => meta.merge(&returned),
            Some(meta) => meta,
            None => returned,
        };

        // Requirements are matched against the state the primitive executes
        // in, not the state it produces.
        let assigned = match self.bind_entities(&state, &effective.requires_entities) {
            Ok(assigned) => assigned,
            Err(error) => {
                self.blacklist.blacklist_command(name, args);
                self.graph.set_status(node, NodeStatus::Failed);
                self.note_failure(Some(node), error);
                return Ok(Seek::Backtrack);
            }
        };

        if let Err(error) = self.extend_stn(name, &effective) {
            self.blacklist.blacklist_command(name, args);
            self.graph.set_status(node, NodeStatus::Failed);
            self.note_failure(Some(node), error);
            return Ok(Seek::Backtrack);
        }

        if self.options.verbose >= 3 {
            debug!("depth {depth} applied {name}");
        }
        self.graph.attach_metadata(node, &effective);
        self.graph.set_assigned_entities(node, assigned);
        self.graph.snapshot(node, next_state.clone());
        self.graph.set_status(node, NodeStatus::Closed);
        self.seek(next_state, rest)
    }

    /// Binds each requirement to the first matching entity, in order.
    fn bind_entities(
        &self,
        state: &State,
        requirements: &[EntityRequirement],
    ) -> Result<Vec<String>> {
        let mut assigned = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            match state.find_entity_for(requirement) {
                Some(id) => assigned.push(id.to_string()),
                None => {
                    return Err(PlanError::EntityRequirementUnmet {
                        requirement: requirement.to_string(),
                    })
                }
            }
        }
        Ok(assigned)
    }

    /// Adds the start/end pair of one primitive to the temporal network.
    fn extend_stn(&mut self, name: &str, metadata: &Metadata) -> Result<()> {
        if !metadata.has_temporal() {
            return Ok(());
        }
        self.command_count += 1;
        let index = self.command_count;
        let start = self.stn.add_time_point(format!("{name}.{index}.start"));
        let end = self.stn.add_time_point(format!("{name}.{index}.end"));
        let per_tick = self.stn.resolution().micros_per_tick();
        let ticks = |micros: i64| micros / per_tick;

        let start_at = metadata.start_micros();
        let end_at = metadata.end_micros();
        match (start_at, end_at, metadata.duration) {
            // Both instants given: their derived interval wins.
            (Some(s), Some(e), _) => {
                self.stn.add_constraint(start, end, Interval::exact(ticks(e - s)))?;
            }
            (_, _, Some(duration)) => {
                self.stn
                    .add_constraint(start, end, Interval::exact(ticks(duration.as_micros())))?;
            }
            (_, _, None) => {
                self.stn.add_constraint(start, end, Interval::at_least(0))?;
            }
        }
        if let Some(s) = start_at {
            self.stn
                .add_constraint(self.origin, start, Interval::exact(ticks(s)))?;
        }
        if let Some(e) = end_at {
            self.stn
                .add_constraint(self.origin, end, Interval::exact(ticks(e)))?;
        }

        if !self.stn.is_consistent() {
            return Err(PlanError::TemporalInconsistent {
                points: vec![
                    self.stn.label(start).to_string(),
                    self.stn.label(end).to_string(),
                ],
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Compound refinements
    // ------------------------------------------------------------------

    fn refine_task(
        &mut self,
        node: NodeId,
        state: State,
        name: &str,
        args: &[Value],
        depth: usize,
        rest: Vec<Pending>,
    ) -> Result<Seek> {
        let domain: &'d Domain = self.domain;
        let methods = match domain.task_methods(name) {
            Some(methods) => methods,
            None => return Err(PlanError::misconfigured(format!("unknown task '{name}'"))),
        };
        self.graph
            .set_available_methods(node, methods.iter().map(|m| m.name.clone()).collect());
        self.graph.set_status(node, NodeStatus::InProgress);

        let checkpoint = Checkpoint::capture(self);

        for method in methods {
            if self.blacklist.is_method_blacklisted(&method.name) {
                continue;
            }
            checkpoint.restore(self, node);
            let subtodos = match (*method.func)(&state, args) {
                Ok(subtodos) => subtodos,
                Err(error) => {
                    if self.options.verbose >= 3 {
                        debug!("depth {depth} method {} not applicable: {error}", method.name);
                    }
                    self.blacklist.blacklist_method(&method.name);
                    continue;
                }
            };
            if self.options.verbose >= 3 {
                debug!(
                    "depth {depth} task {name} via {}: {} subtodos",
                    method.name,
                    subtodos.len()
                );
            }
            self.graph.set_selected_method(node, &method.name);
            let mut next = Vec::with_capacity(subtodos.len() + rest.len());
            next.extend(subtodos.into_iter().map(|todo| Pending {
                todo,
                parent: Some(node),
                depth: depth + 1,
            }));
            next.extend(rest.iter().cloned());

            if let Seek::Done(final_state) = self.seek(state.clone(), next)? {
                self.graph.set_status(node, NodeStatus::Closed);
                return Ok(Seek::Done(final_state));
            }
        }

        self.graph.set_status(node, NodeStatus::Failed);
        let label = self.graph.node(node).info.label();
        self.note_failure(
            Some(node),
            PlanError::NoApplicableMethod {
                node: label,
                trace: Vec::new(),
            },
        );
        Ok(Seek::Backtrack)
    }

    fn refine_unigoal(
        &mut self,
        node: NodeId,
        state: State,
        goal: &Unigoal,
        depth: usize,
        rest: Vec<Pending>,
    ) -> Result<Seek> {
        // An already-satisfied goal closes with no successors.
        if goal.is_satisfied(&state) {
            if self.options.verbose >= 3 {
                debug!("depth {depth} goal {goal} already satisfied");
            }
            self.graph.set_status(node, NodeStatus::Closed);
            return self.seek(state, rest);
        }

        let domain: &'d Domain = self.domain;
        let methods = match domain.unigoal_methods(&goal.predicate) {
            Some(methods) => methods,
            None => {
                return Err(PlanError::misconfigured(format!(
                    "no unigoal methods for predicate '{}'",
                    goal.predicate
                )))
            }
        };
        self.graph
            .set_available_methods(node, methods.iter().map(|m| m.name.clone()).collect());
        self.graph.set_status(node, NodeStatus::InProgress);

        let checkpoint = Checkpoint::capture(self);

        for method in methods {
            if self.blacklist.is_method_blacklisted(&method.name) {
                continue;
            }
            checkpoint.restore(self, node);
            let subtodos = match (*method.func)(&state, &goal.subject, &goal.value) {
                Ok(subtodos) => subtodos,
                Err(error) => {
                    if self.options.verbose >= 3 {
                        debug!("depth {depth} method {} not applicable: {error}", method.name);
                    }
                    self.blacklist.blacklist_method(&method.name);
                    continue;
                }
            };
            self.graph.set_selected_method(node, &method.name);
            let mut next = Vec::with_capacity(subtodos.len() + rest.len());
            next.extend(subtodos.into_iter().map(|todo| Pending {
                todo,
                parent: Some(node),
                depth: depth + 1,
            }));
            next.extend(rest.iter().cloned());

            if let Seek::Done(final_state) = self.seek(state.clone(), next)? {
                self.graph.set_status(node, NodeStatus::Closed);
                return Ok(Seek::Done(final_state));
            }
        }

        self.graph.set_status(node, NodeStatus::Failed);
        let label = self.graph.node(node).info.label();
        self.note_failure(
            Some(node),
            PlanError::NoApplicableMethod {
                node: label,
                trace: Vec::new(),
            },
        );
        Ok(Seek::Backtrack)
    }

    fn refine_multigoal(
        &mut self,
        node: NodeId,
        state: State,
        goal: &Multigoal,
        depth: usize,
        rest: Vec<Pending>,
    ) -> Result<Seek> {
        let domain: &'d Domain = self.domain;
        let methods = domain.multigoal_methods();
        self.graph
            .set_available_methods(node, methods.iter().map(|m| m.name.clone()).collect());
        self.graph.set_status(node, NodeStatus::InProgress);

        let checkpoint = Checkpoint::capture(self);

        for method in methods {
            if self.blacklist.is_method_blacklisted(&method.name) {
                continue;
            }
            checkpoint.restore(self, node);
            let subtodos = match (*method.func)(&state, goal) {
                Ok(subtodos) => subtodos,
                Err(error) => {
                    if self.options.verbose >= 3 {
                        debug!("depth {depth} method {} not applicable: {error}", method.name);
                    }
                    self.blacklist.blacklist_method(&method.name);
                    continue;
                }
            };
            if self.options.verbose >= 3 && subtodos.is_empty() {
                debug!("depth {depth} {goal} satisfied by {}", method.name);
            }
            self.graph.set_selected_method(node, &method.name);
            let mut next = Vec::with_capacity(subtodos.len() + rest.len());
            next.extend(subtodos.into_iter().map(|todo| Pending {
                todo,
                parent: Some(node),
                depth: depth + 1,
            }));
            next.extend(rest.iter().cloned());

            if let Seek::Done(final_state) = self.seek(state.clone(), next)? {
                self.graph.set_status(node, NodeStatus::Closed);
                return Ok(Seek::Done(final_state));
            }
        }

        self.graph.set_status(node, NodeStatus::Failed);
        let label = self.graph.node(node).info.label();
        self.note_failure(
            Some(node),
            PlanError::NoApplicableMethod {
                node: label,
                trace: Vec::new(),
            },
        );
        Ok(Seek::Backtrack)
    }
}

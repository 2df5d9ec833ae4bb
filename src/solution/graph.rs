// =============================================================================
//  Astra HTN - Solution Graph
//  File: graph.rs
//
//  Description:
//      An arena of refinement nodes. Nodes are appended in refinement order
//      and linked parent-to-child, so the graph is acyclic by construction.
//      Closed action leaves, in the order they were closed, are the plan.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-16
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::domain::Todo;
use crate::state::State;
use crate::temporal::{IsoDuration, Metadata};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Index of a node inside its graph.
pub type NodeId = usize;

/// What kind of todo produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Action,
    Task,
    Goal,
    Multigoal,
}

/// Lifecycle of a node during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Open,
    InProgress,
    Closed,
    Failed,
}

/// One refinement record.
#[derive(Debug, Clone)]
pub struct SolutionNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub status: NodeStatus,
    /// The todo that produced this node.
    pub info: Todo,
    /// The parent refinement, `None` for top-level todos.
    pub parent: Option<NodeId>,
    /// Which method realised this node, if any.
    pub selected_method: Option<String>,
    /// Alternatives not yet tried, in registration order.
    pub available_methods: Vec<String>,
    /// Child nodes, in creation order.
    pub successors: Vec<NodeId>,
    /// State immediately after this node's effect (action leaves only).
    pub state_snapshot: Option<State>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub duration: Option<IsoDuration>,
    /// Entity ids bound to this node's requirements, in requirement order.
    pub assigned_entities: Vec<String>,
}

impl SolutionNode {
    pub fn has_temporal(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some() || self.duration.is_some()
    }
}

/// A rollback point for backtracking.
#[derive(Debug, Clone, Copy)]
pub struct GraphMark {
    nodes: usize,
    roots: usize,
    close_order: usize,
}

/// The ordered DAG of refinements behind one planning run.
#[derive(Debug, Clone, Default)]
pub struct SolutionGraph {
    nodes: Vec<SolutionNode>,
    roots: Vec<NodeId>,
    close_order: Vec<NodeId>,
}

impl SolutionGraph {
    pub fn new() -> Self {
        SolutionGraph::default()
    }

    /// Appends a new open node and returns its id.
    pub fn new_node(&mut self, kind: NodeKind, info: Todo) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SolutionNode {
            id,
            kind,
            status: NodeStatus::Open,
            info,
            parent: None,
            selected_method: None,
            available_methods: Vec::new(),
            successors: Vec::new(),
            state_snapshot: None,
            start_time: None,
            end_time: None,
            duration: None,
            assigned_entities: Vec::new(),
        });
        id
    }

    /// Links an existing parent to a newly created child. Children are
    /// always younger than their parents, which keeps the graph acyclic.
    pub fn link(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(child > parent, "successor links must point forward");
        self.nodes[parent].successors.push(child);
        self.nodes[child].parent = Some(parent);
    }

    /// Marks a node as a top-level root.
    pub fn add_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    /// Updates a node's status. Closing an action leaf records it in the
    /// plan close order.
    pub fn set_status(&mut self, id: NodeId, status: NodeStatus) {
        let node = &mut self.nodes[id];
        if status == NodeStatus::Closed
            && node.kind == NodeKind::Action
            && node.status != NodeStatus::Closed
        {
            self.close_order.push(id);
        }
        self.nodes[id].status = status;
    }

    /// Copies the temporal fields of a metadata value onto a node.
    pub fn attach_metadata(&mut self, id: NodeId, metadata: &Metadata) {
        let node = &mut self.nodes[id];
        node.start_time = metadata.start_time;
        node.end_time = metadata.end_time;
        node.duration = metadata.duration;
    }

    /// Records the state after a node's effect.
    pub fn snapshot(&mut self, id: NodeId, state: State) {
        self.nodes[id].state_snapshot = Some(state);
    }

    pub fn set_selected_method(&mut self, id: NodeId, method: &str) {
        self.nodes[id].selected_method = Some(method.to_string());
        self.nodes[id]
            .available_methods
            .retain(|name| name != method);
    }

    pub fn clear_selected_method(&mut self, id: NodeId) {
        self.nodes[id].selected_method = None;
    }

    pub fn set_available_methods(&mut self, id: NodeId, methods: Vec<String>) {
        self.nodes[id].available_methods = methods;
    }

    pub fn set_assigned_entities(&mut self, id: NodeId, entities: Vec<String>) {
        self.nodes[id].assigned_entities = entities;
    }

    pub fn node(&self, id: NodeId) -> &SolutionNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[SolutionNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes carrying any temporal annotation.
    pub fn nodes_with_temporal(&self) -> impl Iterator<Item = &SolutionNode> {
        self.nodes.iter().filter(|node| node.has_temporal())
    }

    /// The closed action leaves in the order they were closed; this order
    /// is the emitted plan.
    pub fn closed_actions(&self) -> impl Iterator<Item = &SolutionNode> {
        self.close_order.iter().map(move |&id| &self.nodes[id])
    }

    /// The refinement chain from the root down to a node, as labels.
    pub fn trace_to(&self, id: NodeId) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            chain.push(self.nodes[current].info.label());
            cursor = self.nodes[current].parent;
        }
        chain.reverse();
        chain
    }

    /// Captures a rollback point.
    pub fn mark(&self) -> GraphMark {
        GraphMark {
            nodes: self.nodes.len(),
            roots: self.roots.len(),
            close_order: self.close_order.len(),
        }
    }

    /// Rolls the graph back to a mark, dropping every node created since
    /// and any dangling successor links.
    pub fn truncate(&mut self, mark: GraphMark) {
        self.nodes.truncate(mark.nodes);
        self.roots.truncate(mark.roots);
        self.close_order.truncate(mark.close_order);
        let limit = mark.nodes;
        for node in &mut self.nodes {
            node.successors.retain(|&child| child < limit);
        }
    }
}

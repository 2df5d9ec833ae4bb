// =============================================================================
//  Astra HTN - Todos, Unigoals & Multigoals
//  File: todo.rs
//
//  Description:
//      The vocabulary of work items the planner refines: primitive actions
//      and commands, compound tasks, single goal assertions, and joint
//      multigoals. Every item can carry attached planner metadata.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-15
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::state::{State, Value};
use crate::temporal::Metadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A target assertion `(predicate, subject, value)` to make hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unigoal {
    pub predicate: String,
    pub subject: String,
    pub value: Value,
}

impl Unigoal {
    pub fn new(predicate: impl Into<String>, subject: impl Into<String>, value: impl Into<Value>) -> Self {
        Unigoal {
            predicate: predicate.into(),
            subject: subject.into(),
            value: value.into(),
        }
    }

    pub fn is_satisfied(&self, state: &State) -> bool {
        state.matches(&self.predicate, &self.subject, &self.value)
    }
}

impl fmt::Display for Unigoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]={}", self.predicate, self.subject, self.value)
    }
}

/// A collection of unigoals to satisfy jointly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Multigoal {
    pub goals: Vec<Unigoal>,
    pub tag: Option<String>,
}

impl Multigoal {
    pub fn new(goals: Vec<Unigoal>) -> Self {
        Multigoal { goals, tag: None }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// True when every unigoal holds in the state.
    pub fn is_satisfied(&self, state: &State) -> bool {
        self.goals.iter().all(|goal| goal.is_satisfied(state))
    }

    /// The unigoals that do not yet hold, in declaration order.
    pub fn unachieved(&self, state: &State) -> Vec<Unigoal> {
        self.goals
            .iter()
            .filter(|goal| !goal.is_satisfied(state))
            .cloned()
            .collect()
    }
}

impl fmt::Display for Multigoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "multigoal")?;
        if let Some(tag) = &self.tag {
            write!(f, " '{tag}'")?;
        }
        write!(f, " {{")?;
        for (i, goal) in self.goals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{goal}")?;
        }
        write!(f, "}}")
    }
}

/// One item of pending work for the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Todo {
    /// A primitive action invocation.
    Action {
        name: String,
        args: Vec<Value>,
        metadata: Option<Metadata>,
    },
    /// A primitive command invocation; commands are the units appearing in
    /// the final plan.
    Command {
        name: String,
        args: Vec<Value>,
        metadata: Option<Metadata>,
    },
    /// A compound task decomposed by task methods.
    Task {
        name: String,
        args: Vec<Value>,
        metadata: Option<Metadata>,
    },
    /// A single goal assertion.
    Unigoal {
        goal: Unigoal,
        metadata: Option<Metadata>,
    },
    /// A joint goal collection.
    Multigoal {
        goal: Multigoal,
        metadata: Option<Metadata>,
    },
}

impl Todo {
    pub fn action(name: impl Into<String>, args: Vec<Value>) -> Self {
        Todo::Action {
            name: name.into(),
            args,
            metadata: None,
        }
    }

    pub fn command(name: impl Into<String>, args: Vec<Value>) -> Self {
        Todo::Command {
            name: name.into(),
            args,
            metadata: None,
        }
    }

    pub fn task(name: impl Into<String>, args: Vec<Value>) -> Self {
        Todo::Task {
            name: name.into(),
            args,
            metadata: None,
        }
    }

    pub fn unigoal(
        predicate: impl Into<String>,
        subject: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Todo::Unigoal {
            goal: Unigoal::new(predicate, subject, value),
            metadata: None,
        }
    }

    pub fn multigoal(goal: Multigoal) -> Self {
        Todo::Multigoal {
            goal,
            metadata: None,
        }
    }

    /// Attaches planner metadata to this todo.
    pub fn with_metadata(mut self, meta: Metadata) -> Self {
        match &mut self {
            Todo::Action { metadata, .. }
            | Todo::Command { metadata, .. }
            | Todo::Task { metadata, .. }
            | Todo::Unigoal { metadata, .. }
            | Todo::Multigoal { metadata, .. } => *metadata = Some(meta),
        }
        self
    }

    /// The attached metadata, if any.
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Todo::Action { metadata, .. }
            | Todo::Command { metadata, .. }
            | Todo::Task { metadata, .. }
            | Todo::Unigoal { metadata, .. }
            | Todo::Multigoal { metadata, .. } => metadata.as_ref(),
        }
    }

    /// A compact rendering used in traces and failure reports.
    pub fn label(&self) -> String {
        match self {
            Todo::Action { name, args, .. }
            | Todo::Command { name, args, .. }
            | Todo::Task { name, args, .. } => {
                let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
                if rendered.is_empty() {
                    format!("({name})")
                } else {
                    format!("({name} {})", rendered.join(" "))
                }
            }
            Todo::Unigoal { goal, .. } => format!("({goal})"),
            Todo::Multigoal { goal, .. } => format!("({goal})"),
        }
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unigoal_satisfaction() {
        let state = State::new("s").set_fact("pos", "a", "table");
        let hold = Unigoal::new("pos", "a", "table");
        let miss = Unigoal::new("pos", "a", "b");
        assert!(hold.is_satisfied(&state));
        assert!(!miss.is_satisfied(&state));
    }

    #[test]
    fn test_multigoal_unachieved_keeps_order() {
        let state = State::new("s").set_fact("pos", "b", "table");
        let mg = Multigoal::new(vec![
            Unigoal::new("pos", "a", "b"),
            Unigoal::new("pos", "b", "table"),
            Unigoal::new("pos", "c", "a"),
        ]);
        let open = mg.unachieved(&state);
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].subject, "a");
        assert_eq!(open[1].subject, "c");
        assert!(!mg.is_satisfied(&state));
    }

    #[test]
    fn test_labels() {
        let todo = Todo::task("transport", vec!["fox".into(), "east".into()]);
        assert_eq!(todo.label(), "(transport fox east)");
        let todo = Todo::action("noop", vec![]);
        assert_eq!(todo.label(), "(noop)");
        let todo = Todo::unigoal("pos", "a", "table");
        assert_eq!(todo.label(), "(pos[a]=table)");
    }
}

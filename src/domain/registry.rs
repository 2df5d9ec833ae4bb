// =============================================================================
//  Astra HTN - Domain Registry
//  File: registry.rs
//
//  Description:
//      The domain a planner searches over: actions and commands as pure
//      state transformers, plus the method tables for tasks, unigoal
//      predicates, and multigoals. Registration order is preserved and is
//      the try-order during decomposition. The builder validates name
//      uniqueness so a broken registry never reaches the search loop.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-15
//  Updated:     2026-07-28
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::domain::todo::{Multigoal, Todo};
use crate::error::{PlanError, Result};
use crate::state::{State, Value};
use crate::temporal::Metadata;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// An action or command callback: consumes a state and arguments, returns
/// the transformed state plus effect metadata, or an error describing why
/// the precondition failed.
pub type ActionFn =
    Arc<dyn Fn(&State, &[Value]) -> Result<(State, Metadata)> + Send + Sync + 'static>;

/// A named method; `F` is the unsized callback type.
pub struct Method<F: ?Sized> {
    pub name: String,
    pub func: Arc<F>,
}

impl<F: ?Sized> Clone for Method<F> {
    fn clone(&self) -> Self {
        Method {
            name: self.name.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Method<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({})", self.name)
    }
}

/// Decomposes a task into sub-todos.
pub type TaskMethod = Method<dyn Fn(&State, &[Value]) -> Result<Vec<Todo>> + Send + Sync>;
/// Decomposes a unigoal `(subject, value)` of its predicate into sub-todos.
pub type UnigoalMethod = Method<dyn Fn(&State, &str, &Value) -> Result<Vec<Todo>> + Send + Sync>;
/// Decomposes a multigoal into sub-todos.
pub type MultigoalMethod = Method<dyn Fn(&State, &Multigoal) -> Result<Vec<Todo>> + Send + Sync>;

/// Name of the always-registered multigoal method.
pub const SPLIT_UNACHIEVED: &str = "split_unachieved";

/// A validated, immutable planning domain.
pub struct Domain {
    name: String,
    actions: IndexMap<String, ActionFn>,
    commands: IndexMap<String, ActionFn>,
    task_methods: IndexMap<String, Vec<TaskMethod>>,
    unigoal_methods: IndexMap<String, Vec<UnigoalMethod>>,
    multigoal_methods: Vec<MultigoalMethod>,
}

impl Domain {
    pub fn builder(name: impl Into<String>) -> DomainBuilder {
        DomainBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_action(&self, name: &str) -> Option<&ActionFn> {
        self.actions.get(name)
    }

    pub fn get_command(&self, name: &str) -> Option<&ActionFn> {
        self.commands.get(name)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Task methods registered for a task name, in registration order.
    pub fn task_methods(&self, task: &str) -> Option<&[TaskMethod]> {
        self.task_methods.get(task).map(Vec::as_slice)
    }

    /// Unigoal methods registered for a predicate, in registration order.
    pub fn unigoal_methods(&self, predicate: &str) -> Option<&[UnigoalMethod]> {
        self.unigoal_methods.get(predicate).map(Vec::as_slice)
    }

    /// All multigoal methods; the default split method is always first.
    pub fn multigoal_methods(&self) -> &[MultigoalMethod] {
        &self.multigoal_methods
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("name", &self.name)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("tasks", &self.task_methods.keys().collect::<Vec<_>>())
            .field(
                "unigoal_predicates",
                &self.unigoal_methods.keys().collect::<Vec<_>>(),
            )
            .field("multigoal_methods", &self.multigoal_methods.len())
            .finish()
    }
}

/// Fluent builder for `Domain`; `build()` validates the registry.
pub struct DomainBuilder {
    name: String,
    actions: IndexMap<String, ActionFn>,
    commands: IndexMap<String, ActionFn>,
    task_methods: IndexMap<String, Vec<TaskMethod>>,
    unigoal_methods: IndexMap<String, Vec<UnigoalMethod>>,
    multigoal_methods: Vec<MultigoalMethod>,
    problems: Vec<String>,
}

impl DomainBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let default_split: MultigoalMethod = Method {
            name: SPLIT_UNACHIEVED.to_string(),
            func: Arc::new(|state: &State, multigoal: &Multigoal| {
                let unachieved = multigoal.unachieved(state);
                if unachieved.is_empty() {
                    return Ok(Vec::new());
                }
                // Re-append the multigoal so progress is re-checked until
                // every subgoal holds.
                let mut todos: Vec<Todo> = unachieved
                    .into_iter()
                    .map(|goal| Todo::Unigoal {
                        goal,
                        metadata: None,
                    })
                    .collect();
                todos.push(Todo::multigoal(multigoal.clone()));
                Ok(todos)
            }),
        };
        DomainBuilder {
            name: name.into(),
            actions: IndexMap::new(),
            commands: IndexMap::new(),
            task_methods: IndexMap::new(),
            unigoal_methods: IndexMap::new(),
            multigoal_methods: vec![default_split],
            problems: Vec::new(),
        }
    }

    fn check_primitive_name(&mut self, name: &str) {
        if name.is_empty() {
            self.problems.push("empty action/command name".to_string());
        } else if self.actions.contains_key(name) || self.commands.contains_key(name) {
            self.problems
                .push(format!("duplicate action/command name '{name}'"));
        }
    }

    /// Registers a primitive action.
    pub fn action<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&State, &[Value]) -> Result<(State, Metadata)> + Send + Sync + 'static,
    {
        self.check_primitive_name(name);
        self.actions.insert(name.to_string(), Arc::new(func));
        self
    }

    /// Registers a primitive command. Commands share the action signature;
    /// the distinction is semantic and both participate identically in
    /// search.
    pub fn command<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&State, &[Value]) -> Result<(State, Metadata)> + Send + Sync + 'static,
    {
        self.check_primitive_name(name);
        self.commands.insert(name.to_string(), Arc::new(func));
        self
    }

    /// Registers a task method under a task name. The per-task order of
    /// registration is the try-order during decomposition.
    pub fn task_method<F>(mut self, task: &str, method_name: &str, func: F) -> Self
    where
        F: Fn(&State, &[Value]) -> Result<Vec<Todo>> + Send + Sync + 'static,
    {
        if task.is_empty() || method_name.is_empty() {
            self.problems.push("empty task or method name".to_string());
        }
        self.task_methods
            .entry(task.to_string())
            .or_insert_with(Vec::new)
            .push(Method {
                name: method_name.to_string(),
                func: Arc::new(func),
            });
        self
    }

    /// Registers a unigoal method for a predicate.
    pub fn unigoal_method<F>(mut self, predicate: &str, method_name: &str, func: F) -> Self
    where
        F: Fn(&State, &str, &Value) -> Result<Vec<Todo>> + Send + Sync + 'static,
    {
        if predicate.is_empty() || method_name.is_empty() {
            self.problems
                .push("empty predicate or method name".to_string());
        }
        self.unigoal_methods
            .entry(predicate.to_string())
            .or_insert_with(Vec::new)
            .push(Method {
                name: method_name.to_string(),
                func: Arc::new(func),
            });
        self
    }

    /// Registers a multigoal method; it is tried after the default split
    /// method and any earlier registrations.
    pub fn multigoal_method<F>(mut self, method_name: &str, func: F) -> Self
    where
        F: Fn(&State, &Multigoal) -> Result<Vec<Todo>> + Send + Sync + 'static,
    {
        if method_name.is_empty() {
            self.problems.push("empty multigoal method name".to_string());
        }
        self.multigoal_methods.push(Method {
            name: method_name.to_string(),
            func: Arc::new(func),
        });
        self
    }

    /// Validates and freezes the domain.
    pub fn build(mut self) -> Result<Domain> {
        let mut task_names = HashSet::new();
        for methods in self.task_methods.values() {
            for method in methods {
                if !task_names.insert(method.name.clone()) {
                    self.problems
                        .push(format!("duplicate task method name '{}'", method.name));
                }
            }
        }
        let mut unigoal_names = HashSet::new();
        for methods in self.unigoal_methods.values() {
            for method in methods {
                if !unigoal_names.insert(method.name.clone()) {
                    self.problems
                        .push(format!("duplicate unigoal method name '{}'", method.name));
                }
            }
        }
        let mut multigoal_names = HashSet::new();
        for method in &self.multigoal_methods {
            if !multigoal_names.insert(method.name.clone()) {
                self.problems
                    .push(format!("duplicate multigoal method name '{}'", method.name));
            }
        }

        if let Some(problem) = self.problems.first() {
            return Err(PlanError::misconfigured(format!(
                "domain '{}': {}",
                self.name, problem
            )));
        }
        Ok(Domain {
            name: self.name,
            actions: self.actions,
            commands: self.commands,
            task_methods: self.task_methods,
            unigoal_methods: self.unigoal_methods,
            multigoal_methods: self.multigoal_methods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(state: &State, _args: &[Value]) -> Result<(State, Metadata)> {
        Ok((state.clone(), Metadata::new()))
    }

    #[test]
    fn test_build_accepts_distinct_names() {
        let domain = Domain::builder("test")
            .action("pickup", noop)
            .command("deliver", noop)
            .task_method("travel", "walk", |_, _| Ok(vec![]))
            .task_method("travel", "taxi", |_, _| Ok(vec![]))
            .build()
            .expect("domain should build");
        assert!(domain.has_action("pickup"));
        assert!(domain.has_command("deliver"));
        assert_eq!(domain.task_methods("travel").unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_primitive_names_rejected() {
        let err = Domain::builder("test")
            .action("go", noop)
            .command("go", noop)
            .build();
        assert!(matches!(err, Err(PlanError::DomainMisconfigured { .. })));
    }

    #[test]
    fn test_duplicate_method_names_rejected() {
        let err = Domain::builder("test")
            .task_method("travel", "walk", |_, _| Ok(vec![]))
            .task_method("haul", "walk", |_, _| Ok(vec![]))
            .build();
        assert!(matches!(err, Err(PlanError::DomainMisconfigured { .. })));
    }

    #[test]
    fn test_default_multigoal_split() {
        let domain = Domain::builder("test").build().unwrap();
        let methods = domain.multigoal_methods();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, SPLIT_UNACHIEVED);

        let state = State::new("s").set_fact("pos", "a", "table");
        let mg = Multigoal::new(vec![
            crate::domain::Unigoal::new("pos", "a", "table"),
            crate::domain::Unigoal::new("pos", "b", "a"),
        ]);
        let todos = (*methods[0].func)(&state, &mg).unwrap();
        // One open subgoal plus the re-appended multigoal.
        assert_eq!(todos.len(), 2);
        assert!(matches!(&todos[0], Todo::Unigoal { goal, .. } if goal.subject == "b"));
        assert!(matches!(&todos[1], Todo::Multigoal { .. }));

        let done = state.set_fact("pos", "b", "a");
        assert!((*methods[0].func)(&done, &mg).unwrap().is_empty());
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let domain = Domain::builder("test")
            .unigoal_method("loc", "by_foot", |_, _, _| Ok(vec![]))
            .unigoal_method("loc", "by_taxi", |_, _, _| Ok(vec![]))
            .build()
            .unwrap();
        let methods = domain.unigoal_methods("loc").unwrap();
        assert_eq!(methods[0].name, "by_foot");
        assert_eq!(methods[1].name, "by_taxi");
    }
}

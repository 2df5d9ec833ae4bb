// ============================================================================
//                        ASTRA HTN • DOMAIN MODEL
//        Actions, Commands, Methods & The Todo Vocabulary
// ----------------------------------------------------------------------------
//   Architectural Role:
//       Defines what a planning domain is: primitive actions and commands as
//       pure state transformers, task methods that decompose compound work,
//       unigoal and multigoal methods that decompose goals, and the todo
//       vocabulary the search engine dispatches on. Names are resolved to
//       typed function values when the domain is built, so a missing or
//       duplicate registration fails before any search starts.
//
//   Core Functions:
//       • Define the Todo, Unigoal, and Multigoal vocabulary
//       • Register actions, commands, and methods under unique names
//       • Validate the registry at build time
//
//   File:        /src/domain/mod.rs
//   Author:      Alex Roussinov
//   Created:     2026-07-15
//   Updated:     2026-07-28
//
//   License:
//       Dual-licensed under the MIT and Apache 2.0 licenses.
//       See LICENSE-MIT and LICENSE-APACHE in the repository root for details.
// ============================================================================

pub mod registry;
pub mod todo;

pub use registry::{Domain, DomainBuilder};
pub use todo::{Multigoal, Todo, Unigoal};

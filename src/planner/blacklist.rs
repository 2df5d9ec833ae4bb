// =============================================================================
//  Astra HTN - Blacklist
//  File: blacklist.rs
//
//  Description:
//      Per-run memo of failed command instances and failed method names.
//      The search consults it before retrying anything inside the current
//      subtree; choice points snapshot it and restore on backtrack, so the
//      memo never leaks across sibling branches or across planning calls.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-17
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::state::Value;
use std::collections::HashSet;

/// Failed `(command, args)` pairs and failed method names.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    commands: HashSet<(String, String)>,
    methods: HashSet<String>,
}

impl Blacklist {
    pub fn new() -> Self {
        Blacklist::default()
    }

    fn command_key(name: &str, args: &[Value]) -> (String, String) {
        // Canonical JSON keeps equal argument lists equal regardless of how
        // they were constructed.
        let rendered = serde_json::to_string(args).unwrap_or_default();
        (name.to_string(), rendered)
    }

    pub fn blacklist_command(&mut self, name: &str, args: &[Value]) {
        self.commands.insert(Self::command_key(name, args));
    }

    pub fn is_command_blacklisted(&self, name: &str, args: &[Value]) -> bool {
        self.commands.contains(&Self::command_key(name, args))
    }

    pub fn blacklist_method(&mut self, name: &str) {
        self.methods.insert(name.to_string());
    }

    pub fn is_method_blacklisted(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.methods.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_keyed_by_name_and_args() {
        let mut blacklist = Blacklist::new();
        blacklist.blacklist_command("cross", &[Value::Str("fox".into())]);
        assert!(blacklist.is_command_blacklisted("cross", &[Value::Str("fox".into())]));
        assert!(!blacklist.is_command_blacklisted("cross", &[Value::Str("corn".into())]));
        assert!(!blacklist.is_command_blacklisted("ferry", &[Value::Str("fox".into())]));
    }

    #[test]
    fn test_methods_and_clear() {
        let mut blacklist = Blacklist::new();
        blacklist.blacklist_method("by_taxi");
        assert!(blacklist.is_method_blacklisted("by_taxi"));

        let snapshot = blacklist.clone();
        blacklist.blacklist_method("by_foot");
        assert!(!snapshot.is_method_blacklisted("by_foot"));

        blacklist.clear();
        assert!(!blacklist.is_method_blacklisted("by_taxi"));
    }
}

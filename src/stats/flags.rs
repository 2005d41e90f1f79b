//! One-shot story flags.
use std::collections::BTreeSet;

use bevy::prelude::*;

/// Set of raised flag names. Interactions raise or lower flags through their
/// effect template; gate rules read them.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFlags {
    raised: BTreeSet<String>,
}

impl GameFlags {
    pub fn is_set(&self, flag: &str) -> bool {
        self.raised.contains(flag)
    }

    /// Raises `flag`; returns `false` if it was already raised.
    pub fn set(&mut self, flag: impl Into<String>) -> bool {
        self.raised.insert(flag.into())
    }

    /// Lowers `flag`; returns `false` if it was not raised.
    pub fn clear(&mut self, flag: &str) -> bool {
        self.raised.remove(flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.raised.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.raised.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raised.is_empty()
    }

    pub fn restore(&mut self, flags: impl IntoIterator<Item = String>) {
        self.raised = flags.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_report_changes() {
        let mut flags = GameFlags::default();
        assert!(flags.set("met_boss"));
        assert!(!flags.set("met_boss"));
        assert!(flags.is_set("met_boss"));

        assert!(flags.clear("met_boss"));
        assert!(!flags.clear("met_boss"));
        assert!(flags.is_empty());
    }

    #[test]
    fn restore_replaces_contents() {
        let mut flags = GameFlags::default();
        flags.set("stale");
        flags.restore(vec!["fed_cat".to_string(), "paid_rent".to_string()]);

        assert!(!flags.is_set("stale"));
        assert_eq!(flags.iter().collect::<Vec<_>>(), vec!["fed_cat", "paid_rent"]);
    }
}

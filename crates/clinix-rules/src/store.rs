//! Rule store: snapshot atômico das tabelas para leitura concorrente.
//!
//! Reads take a whole-table snapshot; administrative writes (the enabled
//! flags) replace the whole snapshot, never mutate entries in place.

use crate::tables::RuleTables;
use arc_swap::ArcSwap;
use std::sync::Arc;

pub struct RuleStore {
    inner: ArcSwap<RuleTables>,
}

impl RuleStore {
    pub fn new(tables: RuleTables) -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(tables)),
        }
    }

    /// Current snapshot. Calls running concurrently with a toggle keep the
    /// snapshot they loaded.
    pub fn snapshot(&self) -> Arc<RuleTables> {
        self.inner.load_full()
    }

    /// Swap in a complete new table set (hot reload).
    pub fn replace(&self, tables: RuleTables) {
        self.inner.store(Arc::new(tables));
    }

    /// Administrative toggle for one processor's enabled flag. Returns
    /// false when the processor is not in the registry.
    pub fn set_enabled(&self, processor: &str, enabled: bool) -> bool {
        let current = self.inner.load_full();
        if !current.processors.contains_key(processor) {
            return false;
        }
        let mut next = (*current).clone();
        if let Some(config) = next.processors.get_mut(processor) {
            config.enabled = enabled;
        }
        self.inner.store(Arc::new(next));
        tracing::info!(processor, enabled, "processor flag toggled");
        true
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new(RuleTables::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_replaces_the_snapshot() {
        let store = RuleStore::default();
        let before = store.snapshot();
        assert!(before.processor("summary_agent").unwrap().enabled);

        assert!(store.set_enabled("summary_agent", false));

        // old snapshot is untouched, new one carries the flag
        assert!(before.processor("summary_agent").unwrap().enabled);
        assert!(!store.snapshot().processor("summary_agent").unwrap().enabled);
    }

    #[test]
    fn test_toggle_unknown_processor_is_a_noop() {
        let store = RuleStore::default();
        assert!(!store.set_enabled("ghost_agent", false));
    }

    #[test]
    fn test_replace_swaps_everything() {
        let store = RuleStore::default();
        let mut tables = RuleTables::builtin();
        tables.simple_functions.insert("merge_duplicates".to_string());
        store.replace(tables);
        assert!(store.snapshot().is_simple("merge_duplicates"));
    }
}

//! Client-side presence bookkeeping.
//!
//! The service sends one full `presence_state` snapshot at join time and
//! `presence_diff` messages afterwards. This module applies both so the
//! transport can hand consumers a full authoritative snapshot after every
//! change — consumers never see diffs.
//!
//! Meta entries are identified by the provider-assigned `phx_ref`; a key
//! disappears when its last meta leaves.

use std::collections::HashMap;

use crate::transport::PresenceState;

#[derive(Debug, Default, Clone)]
pub struct PresenceMap {
    entries: PresenceState,
}

fn meta_ref(meta: &serde_json::Value) -> Option<&str> {
    meta.get("phx_ref").and_then(|r| r.as_str())
}

impl PresenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole map with a fresh snapshot.
    pub fn apply_state(&mut self, state: PresenceState) {
        self.entries = state;
    }

    /// Merge joined metas into their keys, deduplicating by `phx_ref`.
    pub fn apply_joins(&mut self, joins: &HashMap<String, Vec<serde_json::Value>>) {
        for (key, metas) in joins {
            let existing = self.entries.entry(key.clone()).or_default();
            for meta in metas {
                let duplicate = match meta_ref(meta) {
                    Some(new_ref) => existing
                        .iter()
                        .any(|m| meta_ref(m) == Some(new_ref)),
                    // Without a ref there is nothing to match on; keep it.
                    None => false,
                };
                if !duplicate {
                    existing.push(meta.clone());
                }
            }
        }
    }

    /// Remove left metas from their keys, dropping keys that empty out.
    pub fn apply_leaves(&mut self, leaves: &HashMap<String, Vec<serde_json::Value>>) {
        for (key, metas) in leaves {
            let Some(existing) = self.entries.get_mut(key) else {
                continue;
            };
            let left_refs: Vec<&str> = metas.iter().filter_map(meta_ref).collect();
            existing.retain(|m| match meta_ref(m) {
                Some(r) => !left_refs.contains(&r),
                None => false,
            });
            if existing.is_empty() {
                self.entries.remove(key);
            }
        }
    }

    /// Clone of the current full state.
    pub fn snapshot(&self) -> PresenceState {
        self.entries.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }
}

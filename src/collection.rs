//! The in-memory playlist: ordered entries plus user-created empty groups
//!
//! Every mutation runs to completion against `&mut self`, validates its input
//! before touching any entry, and leaves untouched entries where they were.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Category, Entry, EntryId, StreamStatus};

#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: Vec<Entry>,
    custom_groups: Vec<String>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            custom_groups: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn custom_groups(&self) -> &[String] {
        &self.custom_groups
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Entries whose id is in `ids`, in collection order
    pub fn select(&self, ids: &HashSet<EntryId>) -> Vec<&Entry> {
        self.entries.iter().filter(|e| ids.contains(&e.id())).collect()
    }

    /// Replace everything with a freshly imported entry set
    pub fn add_all(&mut self, entries: Vec<Entry>) {
        info!("Loaded {} entries (replacing {})", entries.len(), self.entries.len());
        self.entries = entries;
        self.custom_groups.clear();
    }

    /// Remove the given entries. Returns how many were removed.
    pub fn delete(&mut self, ids: &HashSet<EntryId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !ids.contains(&e.id()));
        let removed = before - self.entries.len();
        debug!("Deleted {} entries", removed);
        removed
    }

    /// Reassign the given entries to `group`. Returns how many moved.
    pub fn move_to_group(&mut self, ids: &HashSet<EntryId>, group: &str) -> Result<usize> {
        let group = require_name(group)?;
        let mut moved = 0;
        for entry in self.entries.iter_mut().filter(|e| ids.contains(&e.id())) {
            entry.set_group(group);
            moved += 1;
        }
        debug!("Moved {} entries to '{}'", moved, group);
        Ok(moved)
    }

    /// Append a copy of each given entry, assigned to `group`.
    /// Returns how many copies were made.
    pub fn copy_to_group(&mut self, ids: &HashSet<EntryId>, group: &str) -> Result<usize> {
        let group = require_name(group)?;
        let copies: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| ids.contains(&e.id()))
            .map(|e| e.copy_into(group))
            .collect();
        let copied = copies.len();
        self.entries.extend(copies);
        debug!("Copied {} entries to '{}'", copied, group);
        Ok(copied)
    }

    /// Relabel every entry in `old` (and the tracked custom name).
    /// No-op when the names are equal or `new` is blank. Returns entries relabelled.
    pub fn rename_group(&mut self, old: &str, new: &str) -> usize {
        if new.trim().is_empty() || old == new {
            return 0;
        }

        let mut renamed = 0;
        for entry in self.entries.iter_mut().filter(|e| e.group() == old) {
            entry.set_group(new);
            renamed += 1;
        }

        for name in self.custom_groups.iter_mut().filter(|g| g.as_str() == old) {
            *name = new.to_string();
        }
        let mut seen = HashSet::new();
        self.custom_groups.retain(|g| seen.insert(g.clone()));

        info!("Renamed group '{}' to '{}' ({} entries)", old, new, renamed);
        renamed
    }

    /// Remove the group and every entry carrying it. Destructive: the caller
    /// is expected to have confirmed. Returns entries removed.
    pub fn delete_group(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.group() != name);
        self.custom_groups.retain(|g| g != name);
        let removed = before - self.entries.len();
        info!("Deleted group '{}' with {} entries", name, removed);
        removed
    }

    /// Track a new, empty group so it can be offered before anything is in it
    pub fn create_empty_group(&mut self, name: &str) -> Result<()> {
        let name = require_name(name)?;
        if self.has_group(name) {
            return Err(Error::DuplicateGroup(name.to_string()));
        }
        self.custom_groups.push(name.to_string());
        debug!("Created empty group '{}'", name);
        Ok(())
    }

    /// Assign groups from an id → group map (AI categorization).
    /// Unknown ids and blank groups are skipped. Returns entries changed.
    pub fn bulk_assign_category(&mut self, assignments: &HashMap<EntryId, String>) -> usize {
        let mut changed = 0;
        for entry in self.entries.iter_mut() {
            if let Some(group) = assignments.get(&entry.id()) {
                let group = group.trim();
                if !group.is_empty() {
                    entry.set_group(group);
                    changed += 1;
                }
            }
        }
        debug!("Assigned groups to {} entries", changed);
        changed
    }

    /// Rename entries from an id → name map. Unknown ids and blank names are
    /// skipped. Returns entries renamed.
    pub fn bulk_rename(&mut self, names: &HashMap<EntryId, String>) -> usize {
        let mut changed = 0;
        for entry in self.entries.iter_mut() {
            if let Some(name) = names.get(&entry.id()) {
                let name = name.trim();
                if !name.is_empty() {
                    entry.name = name.to_string();
                    changed += 1;
                }
            }
        }
        debug!("Renamed {} entries", changed);
        changed
    }

    /// Manual re-categorization
    pub fn set_category(&mut self, ids: &HashSet<EntryId>, category: Category) -> usize {
        let mut changed = 0;
        for entry in self.entries.iter_mut().filter(|e| ids.contains(&e.id())) {
            entry.category = category;
            changed += 1;
        }
        changed
    }

    /// Flag entries as being probed
    pub fn mark_checking(&mut self, ids: &HashSet<EntryId>) {
        for entry in self.entries.iter_mut().filter(|e| ids.contains(&e.id())) {
            entry.status = StreamStatus::Checking;
        }
    }

    /// Write prober results back. Entries deleted meanwhile are ignored.
    pub fn apply_statuses(&mut self, statuses: &HashMap<EntryId, StreamStatus>) -> usize {
        let mut applied = 0;
        for entry in self.entries.iter_mut() {
            if let Some(status) = statuses.get(&entry.id()) {
                entry.status = *status;
                applied += 1;
            }
        }
        applied
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.group() == name) || self.custom_groups.iter().any(|g| g == name)
    }

    /// Every known group name, sorted
    pub fn all_groups(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .entries
            .iter()
            .map(|e| e.group())
            .chain(self.custom_groups.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Entries per group, with empty custom groups at zero
    pub fn group_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.group().to_string()).or_insert(0) += 1;
        }
        for group in &self.custom_groups {
            counts.entry(group.clone()).or_insert(0);
        }
        counts
    }
}

fn require_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Group name cannot be empty.".to_string()));
    }
    Ok(name)
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;

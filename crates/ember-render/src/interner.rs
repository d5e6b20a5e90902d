// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Capped string-intern tables for render layers and shader defines.

use std::sync::RwLock;

/// A small find-or-insert table mapping names to stable byte indices.
///
/// Indices are dense and never reused, so they can index bitmasks and
/// per-layer arrays. The table is capped; registration past the cap fails
/// (the index is not handed out) and is reported. Registration is expected
/// at initialization time, though the interior lock makes concurrent use
/// safe.
pub struct InternTable {
    names: RwLock<Vec<String>>,
    capacity: usize,
    kind: &'static str,
}

impl InternTable {
    pub(crate) fn new(kind: &'static str, capacity: usize) -> Self {
        debug_assert!(capacity <= u8::MAX as usize + 1);
        Self {
            names: RwLock::new(Vec::new()),
            capacity,
            kind,
        }
    }

    /// Returns the index of `name`, interning it if unseen.
    ///
    /// Returns `None` when the table is full and `name` is new.
    pub fn index_of(&self, name: &str) -> Option<u8> {
        {
            let names = self.names.read().unwrap();
            if let Some(idx) = names.iter().position(|n| n == name) {
                return Some(idx as u8);
            }
        }

        let mut names = self.names.write().unwrap();
        // Another writer may have interned the name between the two locks.
        if let Some(idx) = names.iter().position(|n| n == name) {
            return Some(idx as u8);
        }
        if names.len() >= self.capacity {
            log::error!("Too many {}: '{name}' not registered.", self.kind);
            debug_assert!(false, "intern table overflow");
            return None;
        }
        names.push(name.to_string());
        Some((names.len() - 1) as u8)
    }

    /// Returns the name registered at `idx`.
    pub fn name_at(&self, idx: u8) -> Option<String> {
        self.names.read().unwrap().get(idx as usize).cloned()
    }

    /// The number of registered names.
    pub fn len(&self) -> usize {
        self.names.read().unwrap().len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for InternTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternTable")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let table = InternTable::new("layers", 8);
        let a = table.index_of("default").unwrap();
        let b = table.index_of("transparent").unwrap();
        assert_eq!(table.index_of("default"), Some(a));
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn names_read_back() {
        let table = InternTable::new("defines", 8);
        let idx = table.index_of("SKINNED").unwrap();
        assert_eq!(table.name_at(idx).as_deref(), Some("SKINNED"));
        assert_eq!(table.name_at(7), None);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn a_full_table_rejects_new_names() {
        let table = InternTable::new("defines", 2);
        assert!(table.index_of("A").is_some());
        assert!(table.index_of("B").is_some());
        assert_eq!(table.index_of("C"), None);
        // Existing names still resolve.
        assert_eq!(table.index_of("A"), Some(0));
        assert_eq!(table.len(), 2);
    }
}

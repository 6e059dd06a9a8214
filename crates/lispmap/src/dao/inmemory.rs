// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory reference implementation of the mapping store.

use super::{DaoRow, LispDao, MappingEntry, MappingKey};
use parking_lot::RwLock;
use std::collections::HashMap;

/// `HashMap`-backed mapping store for single-process hosts and tests.
///
/// Each trait call takes the lock once, which gives the per-call atomicity
/// the store contract asks for and nothing more.
#[derive(Debug, Default)]
pub struct InMemoryDao {
    rows: RwLock<HashMap<MappingKey, DaoRow>>,
}

impl InMemoryDao {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// True when no key is stored.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl LispDao for InMemoryDao {
    fn get(&self, key: &MappingKey) -> Option<DaoRow> {
        self.rows.read().get(key).cloned()
    }

    fn put(&self, key: MappingKey, entry: MappingEntry) {
        let mut rows = self.rows.write();
        rows.entry(key).or_default().insert(entry.subkey, entry.value);
    }

    fn remove(&self, key: &MappingKey) {
        self.rows.write().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{MappingValue, SUBKEY_RECORD};
    use crate::protocol::LispPrefix;

    fn key(s: &str, mask: u8) -> MappingKey {
        let prefix = LispPrefix::new(s.parse().unwrap(), mask).unwrap();
        MappingKey::for_prefix(&prefix, mask)
    }

    #[test]
    fn test_put_get_remove() {
        let dao = InMemoryDao::new();
        let k = key("10.0.0.0", 24);
        assert!(dao.get(&k).is_none());

        let value = MappingValue {
            auth_key: Some("secret".into()),
            rlocs: Vec::new(),
        };
        dao.put(k, MappingEntry::record(value.clone()));

        let row = dao.get(&k).unwrap();
        assert_eq!(row.get(SUBKEY_RECORD), Some(&value));
        assert_eq!(dao.len(), 1);

        dao.remove(&k);
        assert!(dao.get(&k).is_none());
        assert!(dao.is_empty());
    }

    #[test]
    fn test_put_overwrites_subkey() {
        let dao = InMemoryDao::new();
        let k = key("10.0.0.0", 24);
        dao.put(k, MappingEntry::record(MappingValue::default()));
        let updated = MappingValue {
            auth_key: Some("s2".into()),
            rlocs: Vec::new(),
        };
        dao.put(k, MappingEntry::record(updated.clone()));
        assert_eq!(dao.get(&k).unwrap().get(SUBKEY_RECORD), Some(&updated));
        assert_eq!(dao.len(), 1);
    }
}

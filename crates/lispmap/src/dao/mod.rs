// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapping store contract and the value types stored per mapping key.
//!
//! The store is a pluggable key-value collaborator: `get`/`put`/`remove`,
//! each individually atomic. A row is a map of string subkeys; this core
//! only ever uses [`SUBKEY_RECORD`], the fixed subkey both sides of the
//! contract agree on. The server's fetch-merge-put sequence is NOT atomic
//! across store calls: concurrent registers racing on one key are
//! last-write-wins at entry granularity, which is acceptable under LISP's
//! soft-state model (the next periodic register repairs a lost update).

use crate::protocol::{LispPrefix, LocatorRecord, MapReplyAction};
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::SystemTime;

mod inmemory;

pub use inmemory::InMemoryDao;

/// Subkey under which the mapping record is stored in a row.
pub const SUBKEY_RECORD: &str = "value";

/// Canonical lookup key derived from an EID prefix and a mask length.
///
/// Deterministic: the address is re-normalized to the requested mask, so
/// every textual variant of a prefix derives the same key. The mask is part
/// of the key; the same address at /24 and /32 keys two distinct rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappingKey {
    eid: IpAddr,
    mask: u8,
}

impl MappingKey {
    /// Derive the key for `prefix` truncated to `mask`.
    ///
    /// `mask` never exceeds the prefix's own mask: the server only walks
    /// toward shorter masks during secret resolution.
    pub fn for_prefix(prefix: &LispPrefix, mask: u8) -> Self {
        debug_assert!(mask <= prefix.mask());
        Self {
            eid: crate::protocol::normalize(prefix.eid(), mask),
            mask,
        }
    }

    /// The normalized EID this key covers.
    pub fn eid(&self) -> IpAddr {
        self.eid
    }

    /// The mask length baked into this key.
    pub fn mask(&self) -> u8 {
        self.mask
    }
}

/// A stored locator: the wire record plus per-registration metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRloc {
    /// Underlying wire record; its structural identity keys the merge.
    pub record: LocatorRecord,
    /// Record TTL in minutes, refreshed on every register.
    pub ttl: u32,
    /// Negative-mapping action from the last register.
    pub action: MapReplyAction,
    /// A-bit from the last register.
    pub authoritative: bool,
    /// Wall-clock time of the last register that touched this locator.
    pub registered_at: SystemTime,
}

impl MappingRloc {
    /// Create a locator entry from a freshly registered wire record.
    pub fn new(record: LocatorRecord, ttl: u32, action: MapReplyAction, authoritative: bool) -> Self {
        Self {
            record,
            ttl,
            action,
            authoritative,
            registered_at: SystemTime::now(),
        }
    }

    /// Refresh the mutable fields in place and stamp the registration time.
    pub fn refresh(&mut self, ttl: u32, action: MapReplyAction, authoritative: bool) {
        self.ttl = ttl;
        self.action = action;
        self.authoritative = authoritative;
        self.registered_at = SystemTime::now();
    }
}

/// The value stored per mapping key: an optional per-prefix authentication
/// secret plus the registered locator set.
///
/// Invariant: no two locators share the same underlying wire record;
/// re-registering a known record refreshes it rather than duplicating it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingValue {
    /// Authentication secret configured at this exact mask length.
    /// `None` means no secret here; resolution may fall back to a shorter
    /// mask depending on server policy.
    pub auth_key: Option<String>,
    /// Registered locators, identity-unique.
    pub rlocs: Vec<MappingRloc>,
}

impl MappingValue {
    /// True when the value holds neither a secret nor any locator, in
    /// which case the row is removed from the store instead of kept empty.
    pub fn is_empty(&self) -> bool {
        self.auth_key.is_none() && self.rlocs.is_empty()
    }
}

/// A row as returned by the store: subkey to value.
pub type DaoRow = HashMap<String, MappingValue>;

/// A (subkey, value) pair to persist under a mapping key.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub subkey: String,
    pub value: MappingValue,
}

impl MappingEntry {
    /// An entry under the fixed mapping-record subkey.
    pub fn record(value: MappingValue) -> Self {
        Self {
            subkey: SUBKEY_RECORD.to_string(),
            value,
        }
    }
}

/// The mapping store collaborator.
///
/// Implementations provide per-call atomicity only; see the module docs
/// for the documented read-modify-write race.
pub trait LispDao: Send + Sync {
    /// Fetch the row stored under `key`, if any.
    fn get(&self, key: &MappingKey) -> Option<DaoRow>;

    /// Store `entry` under `key`, creating the row if absent.
    fn put(&self, key: MappingKey, entry: MappingEntry);

    /// Drop the whole row under `key`.
    fn remove(&self, key: &MappingKey);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(s: &str, mask: u8) -> LispPrefix {
        LispPrefix::new(s.parse().unwrap(), mask).unwrap()
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let p = prefix("10.1.2.0", 24);
        assert_eq!(MappingKey::for_prefix(&p, 24), MappingKey::for_prefix(&p, 24));
    }

    #[test]
    fn test_key_distinct_per_mask() {
        let p = prefix("10.1.2.3", 32);
        assert_ne!(MappingKey::for_prefix(&p, 32), MappingKey::for_prefix(&p, 24));
    }

    #[test]
    fn test_key_renormalizes_for_shorter_mask() {
        // Walking a /32 down to /24 must land on the /24 row registered
        // under the network address.
        let host = prefix("10.1.2.3", 32);
        let net = prefix("10.1.2.0", 24);
        assert_eq!(MappingKey::for_prefix(&host, 24), MappingKey::for_prefix(&net, 24));
    }

    #[test]
    fn test_value_emptiness() {
        let mut value = MappingValue::default();
        assert!(value.is_empty());
        value.auth_key = Some("s".into());
        assert!(!value.is_empty());
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Map Server registration core.
//!
//! [`MapServer`] drives one Map-Register end to end: per-record secret
//! resolution and authentication, locator merge against the stored mapping,
//! persistence, and the optional Map-Notify acknowledgement. Protocol-level
//! failures never propagate as errors out of these operations - they are
//! logged or returned as booleans, because the transport layer is not
//! expected to catch anything per register (the xTR retries on its own
//! timer).
//!
//! Registration is at-least-once, not atomic: when authentication fails
//! midway through a batch, records already merged stay merged and the rest
//! of the batch is skipped.

use crate::auth::{LispAuthentication, LispMacAuthentication, LispNoAuthentication};
use crate::config::MapServerConfig;
use crate::dao::{LispDao, MappingEntry, MappingKey, MappingRloc, MappingValue, SUBKEY_RECORD};
use crate::protocol::{EidRecord, LispPrefix, LocatorRecord, MapNotify, MapRegister};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receiver for Map-Notify acknowledgements.
///
/// Fire-and-forget from the server's perspective; delivery, retransmission
/// and backpressure belong to the implementor.
pub trait MapNotifyHandler: Send + Sync {
    fn handle_map_notify(&self, notify: MapNotify);
}

/// The Map Server registration core.
///
/// Stateless between calls apart from two policy flags, both mutable from
/// an administrative path while registers are being processed:
///
/// - `authenticate`: validate registers and MAC outbound notifies.
/// - `iterate_mask`: during secret resolution, fall back past an entry
///   that exists but carries no secret. A missing entry is always walked
///   past regardless of this flag; only a present-but-keyless entry is
///   policy-gated. That asymmetry lets a short prefix's secret govern all
///   of its sub-prefixes while a specific sub-prefix can still be pinned
///   to "expect no authentication" by storing it keyless and disabling
///   iteration.
///
/// The server holds no locks and caches nothing: every register round-trips
/// through the mapping store.
pub struct MapServer {
    dao: Option<Arc<dyn LispDao>>,
    auth: Box<dyn LispAuthentication>,
    authenticate: AtomicBool,
    iterate_mask: AtomicBool,
}

impl MapServer {
    /// Server with authentication and mask iteration enabled.
    pub fn new(dao: Arc<dyn LispDao>) -> Self {
        Self::with_flags(dao, true, true)
    }

    /// Server with explicit policy flags. The authentication strategy is
    /// chosen once here: keyed MAC when `authenticate` is set, otherwise
    /// the accept-everything strategy.
    pub fn with_flags(dao: Arc<dyn LispDao>, authenticate: bool, iterate_mask: bool) -> Self {
        let auth: Box<dyn LispAuthentication> = if authenticate {
            Box::new(LispMacAuthentication)
        } else {
            Box::new(LispNoAuthentication)
        };
        Self::with_authentication(dao, auth, authenticate, iterate_mask)
    }

    /// Server with a caller-supplied authentication strategy.
    pub fn with_authentication(
        dao: Arc<dyn LispDao>,
        auth: Box<dyn LispAuthentication>,
        authenticate: bool,
        iterate_mask: bool,
    ) -> Self {
        Self {
            dao: Some(dao),
            auth,
            authenticate: AtomicBool::new(authenticate),
            iterate_mask: AtomicBool::new(iterate_mask),
        }
    }

    /// Server from a [`MapServerConfig`].
    pub fn from_config(dao: Arc<dyn LispDao>, config: &MapServerConfig) -> Self {
        Self::with_flags(dao, config.authenticate, config.iterate_mask)
    }

    /// Server with no mapping store bound yet. Registers are dropped with
    /// a warning until [`MapServer::bind_store`] is called.
    pub fn unbound() -> Self {
        Self {
            dao: None,
            auth: Box::new(LispMacAuthentication),
            authenticate: AtomicBool::new(true),
            iterate_mask: AtomicBool::new(true),
        }
    }

    /// Bind the mapping store.
    pub fn bind_store(&mut self, dao: Arc<dyn LispDao>) {
        self.dao = Some(dao);
    }

    pub fn should_authenticate(&self) -> bool {
        self.authenticate.load(Ordering::SeqCst)
    }

    pub fn set_should_authenticate(&self, authenticate: bool) {
        self.authenticate.store(authenticate, Ordering::SeqCst);
    }

    pub fn should_iterate_mask(&self) -> bool {
        self.iterate_mask.load(Ordering::SeqCst)
    }

    pub fn set_should_iterate_mask(&self, iterate_mask: bool) {
        self.iterate_mask.store(iterate_mask, Ordering::SeqCst);
    }

    /// Process one Map-Register.
    ///
    /// Records are handled in request order: authenticate (when enabled),
    /// merge locators into the stored mapping, persist. On authentication
    /// failure the remainder of the batch is skipped and no notify is sent;
    /// earlier records stay persisted. When the register asks for a notify
    /// and nothing failed, the notify echoes the register and - when
    /// authenticating - carries a MAC computed with the secret resolved
    /// most recently in the loop (deliberately the last one, matching the
    /// common single-record register).
    pub fn handle_map_register(&self, register: &MapRegister, callback: &dyn MapNotifyHandler) {
        let Some(dao) = self.dao.as_ref() else {
            log::warn!("[mapserver] register dropped: no mapping store bound");
            return;
        };

        let mut failed = false;
        let mut password: Option<String> = None;
        for eid_record in &register.records {
            if self.should_authenticate() {
                password = self.resolve_secret(dao.as_ref(), &eid_record.prefix);
                if !self.auth.validate(register, password.as_deref()) {
                    log::warn!(
                        "[mapserver] authentication failed for {}, dropping rest of register",
                        eid_record.prefix
                    );
                    failed = true;
                    break;
                }
            }

            let key = MappingKey::for_prefix(&eid_record.prefix, eid_record.prefix.mask());
            let mut value = dao
                .get(&key)
                .and_then(|mut row| row.remove(SUBKEY_RECORD))
                .unwrap_or_default();

            if let Some(locators) = &eid_record.locators {
                merge_locators(&mut value, eid_record, locators);
            }
            dao.put(key, MappingEntry::record(value));
        }

        if !failed && register.want_map_notify {
            log::trace!("[mapserver] register wants map-notify");
            let mut notify = MapNotify::from_register(register);
            if self.should_authenticate() {
                notify.authentication_data =
                    self.auth.authentication_data(&notify, password.as_deref());
            }
            callback.handle_map_notify(notify);
        }
    }

    /// Secret governing `prefix`, found by the mask-fallback search.
    pub fn get_authentication_key(&self, prefix: &LispPrefix) -> Option<String> {
        let dao = self.dao.as_ref()?;
        self.resolve_secret(dao.as_ref(), prefix)
    }

    /// Set the secret at exactly `prefix` (no fallback). Idempotent upsert.
    pub fn add_authentication_key(&self, prefix: &LispPrefix, key: &str) -> bool {
        let Some(dao) = self.dao.as_ref() else {
            log::warn!("[mapserver] add_authentication_key: no mapping store bound");
            return false;
        };
        let mapping_key = MappingKey::for_prefix(prefix, prefix.mask());
        let mut value = dao
            .get(&mapping_key)
            .and_then(|mut row| row.remove(SUBKEY_RECORD))
            .unwrap_or_default();
        value.auth_key = Some(key.to_string());
        dao.put(mapping_key, MappingEntry::record(value));
        true
    }

    /// Clear the secret at exactly `prefix`. Returns false when no entry
    /// exists there. An entry left with no secret and no locators is
    /// removed from the store entirely rather than kept empty.
    pub fn remove_authentication_key(&self, prefix: &LispPrefix) -> bool {
        let Some(dao) = self.dao.as_ref() else {
            log::warn!("[mapserver] remove_authentication_key: no mapping store bound");
            return false;
        };
        let mapping_key = MappingKey::for_prefix(prefix, prefix.mask());
        match dao
            .get(&mapping_key)
            .and_then(|mut row| row.remove(SUBKEY_RECORD))
        {
            Some(mut value) => {
                value.auth_key = None;
                if value.is_empty() {
                    dao.remove(&mapping_key);
                } else {
                    dao.put(mapping_key, MappingEntry::record(value));
                }
                true
            }
            None => false,
        }
    }

    /// Mask-fallback search for the secret governing `prefix`.
    ///
    /// Walks from the prefix's own mask toward /0. A present entry with a
    /// secret is the match. A present entry without one stops the search
    /// when mask iteration is disabled. A missing entry never stops it.
    fn resolve_secret(&self, dao: &dyn LispDao, prefix: &LispPrefix) -> Option<String> {
        let mut mask = i16::from(prefix.mask());
        while mask >= 0 {
            let key = MappingKey::for_prefix(prefix, mask as u8);
            match dao.get(&key) {
                Some(row) => match row.get(SUBKEY_RECORD) {
                    Some(value) if value.auth_key.is_some() => return value.auth_key.clone(),
                    _ => {
                        if self.should_iterate_mask() {
                            mask -= 1;
                        } else {
                            return None;
                        }
                    }
                },
                None => mask -= 1,
            }
        }
        None
    }
}

/// Merge incoming wire locators into a mapping value.
///
/// Identity is the structural equality of the wire record. A known record
/// is refreshed in place; an unknown one is appended. Stored records the
/// register does not mention are left alone - registration refreshes and
/// adds, it never implicitly deletes.
fn merge_locators(value: &mut MappingValue, eid_record: &EidRecord, incoming: &[LocatorRecord]) {
    let mut index: HashMap<LocatorRecord, usize> = value
        .rlocs
        .iter()
        .enumerate()
        .map(|(slot, rloc)| (rloc.record.clone(), slot))
        .collect();

    for locator in incoming {
        if let Some(&slot) = index.get(locator) {
            value.rlocs[slot].refresh(
                eid_record.record_ttl,
                eid_record.action,
                eid_record.authoritative,
            );
        } else {
            index.insert(locator.clone(), value.rlocs.len());
            value.rlocs.push(MappingRloc::new(
                locator.clone(),
                eid_record.record_ttl,
                eid_record.action,
                eid_record.authoritative,
            ));
        }
    }
}

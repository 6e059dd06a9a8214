// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Map-Register authentication strategies.
//!
//! Two strategies, selected once at server construction: no authentication
//! (`LispNoAuthentication`, every register accepted, empty notify MAC) and
//! keyed-MAC authentication (`LispMacAuthentication`, HMAC per RFC 6833:
//! key-id 1 = HMAC-SHA1-96, key-id 2 = HMAC-SHA256-128).
//!
//! The MAC covers the message image with the authentication field zeroed.
//! The real wire codec lives outside this crate, so the image here is the
//! canonical JSON encoding of the structured message; both validation and
//! notify signing use the same image, which keeps the two sides of this
//! core consistent.
//!
//! The keyed strategy fails closed: an absent secret or an unknown key-id
//! never validates.

use crate::protocol::{MapNotify, MapRegister};
use ring::hmac;

/// Key-id for HMAC-SHA1 truncated to 96 bits (RFC 6833 Sec. 6.1).
pub const AUTH_HMAC_SHA1_96: u16 = 1;
/// Key-id for HMAC-SHA256 truncated to 128 bits.
pub const AUTH_HMAC_SHA256_128: u16 = 2;

const SHA1_96_LEN: usize = 12;
const SHA256_128_LEN: usize = 16;

/// Authentication strategy over inbound registers and outbound notifies.
pub trait LispAuthentication: Send + Sync {
    /// Length in bytes of the authentication field this strategy produces
    /// for the given key-id.
    fn authentication_length(&self, key_id: u16) -> usize;

    /// Validate an inbound register against the resolved secret.
    fn validate(&self, register: &MapRegister, key: Option<&str>) -> bool;

    /// Compute the authentication data to embed in an outbound notify.
    fn authentication_data(&self, notify: &MapNotify, key: Option<&str>) -> Vec<u8>;
}

/// No authentication: every register validates, notifies carry no MAC.
#[derive(Debug, Default, Clone, Copy)]
pub struct LispNoAuthentication;

impl LispAuthentication for LispNoAuthentication {
    fn authentication_length(&self, _key_id: u16) -> usize {
        0
    }

    fn validate(&self, _register: &MapRegister, _key: Option<&str>) -> bool {
        true
    }

    fn authentication_data(&self, _notify: &MapNotify, _key: Option<&str>) -> Vec<u8> {
        Vec::new()
    }
}

/// Keyed-MAC authentication, dispatching on the message's key-id.
#[derive(Debug, Default, Clone, Copy)]
pub struct LispMacAuthentication;

impl LispMacAuthentication {
    fn algorithm(key_id: u16) -> Option<(hmac::Algorithm, usize)> {
        match key_id {
            AUTH_HMAC_SHA1_96 => Some((hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, SHA1_96_LEN)),
            AUTH_HMAC_SHA256_128 => Some((hmac::HMAC_SHA256, SHA256_128_LEN)),
            _ => None,
        }
    }

    fn mac(key_id: u16, key: &str, image: &[u8]) -> Option<Vec<u8>> {
        let (algorithm, len) = Self::algorithm(key_id)?;
        let key = hmac::Key::new(algorithm, key.as_bytes());
        let tag = hmac::sign(&key, image);
        Some(tag.as_ref()[..len].to_vec())
    }

    /// Compute the authentication data a sender would carry in a register.
    ///
    /// The server only validates registers; this is the sender-side half,
    /// used by clients and tests to produce an acceptable message.
    pub fn sign_register(&self, register: &MapRegister, key: &str) -> Vec<u8> {
        Self::mac(register.key_id, key, &register_image(register)).unwrap_or_default()
    }
}

impl LispAuthentication for LispMacAuthentication {
    fn authentication_length(&self, key_id: u16) -> usize {
        Self::algorithm(key_id).map_or(0, |(_, len)| len)
    }

    fn validate(&self, register: &MapRegister, key: Option<&str>) -> bool {
        // Fail closed: no secret resolved means no register is acceptable.
        let Some(key) = key else {
            return false;
        };
        let Some(expected) = Self::mac(register.key_id, key, &register_image(register)) else {
            log::warn!("[auth] unknown key-id {} on register", register.key_id);
            return false;
        };
        // Tag lengths are fixed per algorithm, so comparing lengths first
        // leaks nothing; the tag bytes are compared in constant time.
        register.authentication_data.len() == expected.len()
            && ring::constant_time::verify_slices_are_equal(
                &register.authentication_data,
                &expected,
            )
            .is_ok()
    }

    fn authentication_data(&self, notify: &MapNotify, key: Option<&str>) -> Vec<u8> {
        let Some(key) = key else {
            log::warn!("[auth] no secret for outbound notify, sending without MAC");
            return Vec::new();
        };
        Self::mac(notify.key_id, key, &notify_image(notify)).unwrap_or_default()
    }
}

/// Canonical byte image of a register with the authentication field zeroed.
fn register_image(register: &MapRegister) -> Vec<u8> {
    let mut blank = register.clone();
    blank.authentication_data = Vec::new();
    serde_json::to_vec(&blank).expect("register image serialization is infallible")
}

/// Canonical byte image of a notify with the authentication field zeroed.
fn notify_image(notify: &MapNotify) -> Vec<u8> {
    let mut blank = notify.clone();
    blank.authentication_data = Vec::new();
    serde_json::to_vec(&blank).expect("notify image serialization is infallible")
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structured forms of the LISP control messages this core processes.
//!
//! The wire codec (RFC 6830 bit layout) lives in the transport layer; this
//! module only defines the decoded shapes a Map-Register arrives in and a
//! Map-Notify leaves in. Locator records derive structural equality and
//! hashing - the registration merge is keyed on record identity, never on
//! object identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Errors constructing protocol values from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    /// Mask length exceeds the address family width.
    MaskTooLong { mask: u8, max: u8 },
}

impl fmt::Display for PrefixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaskTooLong { mask, max } => {
                write!(f, "mask length /{} exceeds family width /{}", mask, max)
            }
        }
    }
}

impl std::error::Error for PrefixError {}

/// Zero out host bits beyond `mask`. Callers guarantee `mask` fits the family.
pub(crate) fn normalize(eid: IpAddr, mask: u8) -> IpAddr {
    match eid {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let masked = if mask == 0 {
                0
            } else {
                bits & (u32::MAX << (32 - u32::from(mask)))
            };
            IpAddr::V4(Ipv4Addr::from(masked))
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let masked = if mask == 0 {
                0
            } else {
                bits & (u128::MAX << (128 - u32::from(mask)))
            };
            IpAddr::V6(Ipv6Addr::from(masked))
        }
    }
}

fn family_width(eid: IpAddr) -> u8 {
    match eid {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// An EID prefix: address plus mask length, normalized at construction.
///
/// Normalization zeroes host bits, so `10.0.0.1/24` and `10.0.0.0/24` are
/// the same prefix. Mask length is part of the identity: `10.0.0.0/24` and
/// `10.0.0.0/32` are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LispPrefix {
    eid: IpAddr,
    mask: u8,
}

impl LispPrefix {
    /// Create a prefix, rejecting masks wider than the address family.
    pub fn new(eid: IpAddr, mask: u8) -> Result<Self, PrefixError> {
        let max = family_width(eid);
        if mask > max {
            return Err(PrefixError::MaskTooLong { mask, max });
        }
        Ok(Self {
            eid: normalize(eid, mask),
            mask,
        })
    }

    /// The normalized EID address.
    pub fn eid(&self) -> IpAddr {
        self.eid
    }

    /// The mask length.
    pub fn mask(&self) -> u8 {
        self.mask
    }
}

impl fmt::Display for LispPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.eid, self.mask)
    }
}

/// Action an ITR should take for a negative mapping, echoed per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapReplyAction {
    #[default]
    NoAction,
    NativelyForward,
    SendMapRequest,
    Drop,
}

/// A single RLOC as carried on the wire.
///
/// Derives `Eq` + `Hash` over every field: two records are the same locator
/// exactly when all routing attributes match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocatorRecord {
    /// RLOC address.
    pub locator: IpAddr,
    /// Unicast priority (255 = not usable for unicast).
    pub priority: u8,
    /// Unicast weight.
    pub weight: u8,
    /// Multicast priority.
    pub multicast_priority: u8,
    /// Multicast weight.
    pub multicast_weight: u8,
    /// Set when the RLOC is local to the sender.
    pub local_locator: bool,
    /// Set when the locator was RLOC-probed.
    pub rloc_probed: bool,
    /// R-bit: the locator is reachable from the sender's view.
    pub routed: bool,
}

/// One EID-to-RLOC record inside a Map-Register (or echoed in a Map-Notify).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EidRecord {
    /// Registered EID prefix.
    pub prefix: LispPrefix,
    /// Record TTL in minutes.
    pub record_ttl: u32,
    /// Negative-mapping action.
    pub action: MapReplyAction,
    /// A-bit: the sender is authoritative for this mapping.
    pub authoritative: bool,
    /// Candidate locators. `None` means the record carried no locator list
    /// at all, which leaves the stored set untouched.
    pub locators: Option<Vec<LocatorRecord>>,
}

/// A decoded Map-Register, as handed over by the wire codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRegister {
    /// Echo nonce.
    pub nonce: u64,
    /// Authentication algorithm identifier (0 = none, 1 = HMAC-SHA1-96,
    /// 2 = HMAC-SHA256-128).
    pub key_id: u16,
    /// MAC carried by the sender, computed over the message with this
    /// field zeroed.
    pub authentication_data: Vec<u8>,
    /// M-bit: the sender wants a Map-Notify acknowledgement.
    pub want_map_notify: bool,
    /// Registered records, processed in order.
    pub records: Vec<EidRecord>,
}

/// A Map-Notify acknowledgement, ready for the wire codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapNotify {
    /// Nonce echoed from the register.
    pub nonce: u64,
    /// Authentication algorithm identifier echoed from the register.
    pub key_id: u16,
    /// MAC over the notify, filled in by the authentication strategy.
    pub authentication_data: Vec<u8>,
    /// Records echoed from the register.
    pub records: Vec<EidRecord>,
}

impl MapNotify {
    /// Build a notify echoing the register's identifying fields.
    ///
    /// Authentication data starts empty; the server attaches a MAC after
    /// the whole register has been accepted.
    pub fn from_register(register: &MapRegister) -> Self {
        Self {
            nonce: register.nonce,
            key_id: register.key_id,
            authentication_data: Vec::new(),
            records: register.records.clone(),
        }
    }
}

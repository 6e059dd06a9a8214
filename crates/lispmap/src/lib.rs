// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # lispmap - LISP Map Server registration core
//!
//! The control-plane core of a LISP (Locator/ID Separation Protocol) Map
//! Server: accepts EID-to-RLOC registrations from edge routers, authenticates
//! them against per-prefix secrets, merges the registered locators into an
//! authoritative mapping store, and acknowledges with a Map-Notify when the
//! sender asks for one.
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                     Transport / Wire Codec                   |
//! |        (external: UDP sockets, RFC 6830 bit layout)          |
//! +--------------------------------------------------------------+
//! |                       MapServer (server)                     |
//! |   per-record: resolve secret -> authenticate -> merge -> put |
//! |   batch: optional authenticated Map-Notify callback          |
//! +--------------------------------------------------------------+
//! |    auth (no-auth / keyed MAC)   |   dao (key, value, store)  |
//! +--------------------------------------------------------------+
//! ```
//!
//! The mapping store, notify delivery, and the wire codec are collaborator
//! contracts ([`LispDao`], [`MapNotifyHandler`], the `protocol` structs);
//! hosts wire in their own. [`InMemoryDao`] is the bundled single-process
//! store.
//!
//! ## Example
//!
//! ```no_run
//! use lispmap::{InMemoryDao, MapNotify, MapNotifyHandler, MapServer};
//! use std::sync::Arc;
//!
//! struct Southbound;
//!
//! impl MapNotifyHandler for Southbound {
//!     fn handle_map_notify(&self, notify: MapNotify) {
//!         println!("ack nonce {:#x}", notify.nonce);
//!     }
//! }
//!
//! let dao = Arc::new(InMemoryDao::new());
//! let server = MapServer::new(dao);
//! let net = lispmap::LispPrefix::new("10.0.0.0".parse().unwrap(), 8).unwrap();
//! server.add_authentication_key(&net, "site-secret");
//! // for each register decoded off the wire:
//! //   server.handle_map_register(&register, &Southbound);
//! ```

pub mod auth;
pub mod config;
pub mod dao;
pub mod protocol;
pub mod server;

pub use auth::{LispAuthentication, LispMacAuthentication, LispNoAuthentication};
pub use config::{ConfigError, MapServerConfig};
pub use dao::{
    DaoRow, InMemoryDao, LispDao, MappingEntry, MappingKey, MappingRloc, MappingValue,
    SUBKEY_RECORD,
};
pub use protocol::{
    EidRecord, LispPrefix, LocatorRecord, MapNotify, MapRegister, MapReplyAction, PrefixError,
};
pub use server::{MapNotifyHandler, MapServer};

//! Guest provisioning and session lifecycle engine.
//!
//! The engine converts a one-time identity assertion from the captive portal
//! into RADIUS authorization rows an external AAA daemon consumes, and it
//! tracks the resulting network session until accounting or an administrator
//! closes it.
//!
//! ## Invariants
//!
//! - Exactly one guest profile per canonical hardware address; repeat visits
//!   merge fields and bump the visit counter through a single conditional
//!   write.
//! - At most one complete authorization set per address. Replacement is
//!   delete-then-insert across all three attribute collections inside one
//!   transaction, so the AAA consumer never reads a half-old mixture.
//! - Sessions only move `active -> disconnected` (admin) or
//!   `active -> expired` (accounting stop); terminal states are never left.

pub mod credential;
pub mod mac;
pub mod models;
pub mod policy;
pub(crate) mod repo;
pub mod service;

pub use mac::canonical_mac;
pub use models::{
    AccountingEvent, AuthMethod, AuthorizationStatus, GuestAuthRequest, GuestAuthResponse,
    ProvisionError, SessionStatus,
};
pub use policy::AccessPolicy;

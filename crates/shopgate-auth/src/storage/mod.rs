//! Storage traits and in-memory backends for authentication data.
//!
//! This module defines storage interfaces for:
//!
//! - The versioned credential record (current + pending versions)
//! - Single-use authorization codes with absolute expiry
//!
//! The in-memory implementations provided here are the default backends;
//! the traits are the seam for swapping in a durable store.

pub mod code;
pub mod credential;

pub use code::{AuthorizationCode, AuthorizationCodeStore, MemoryAuthorizationCodeStore};
pub use credential::{
    CredentialRecord, CredentialStore, CredentialValidationError, MemoryCredentialStore,
};

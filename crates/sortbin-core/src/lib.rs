//! Core types, capability traits and services for sortbin.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::DirectoryStore`]; identity-provider adapters implement
//! [`identity::IdentityProvider`]. Everything else in here is policy and
//! record lifecycle built on top of those two seams.

// Native `async fn` in traits; the store and provider traits spell out their
// `Send` bounds explicitly.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod category;
pub mod config;
pub mod error;
pub mod identity;
pub mod policy;
pub mod record;
pub mod repository;
pub mod session;
pub mod store;
pub mod users;
pub mod whitelist;

#[cfg(test)]
mod testing;

pub use error::{Error, ErrorKind, Result, ValidationError};

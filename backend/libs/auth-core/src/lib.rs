//! Shared authentication primitives for the Scribe platform.
//!
//! Every service that accepts bearer tokens validates them through this crate
//! so there is exactly one place where algorithm and key policy live.

pub mod jwt;

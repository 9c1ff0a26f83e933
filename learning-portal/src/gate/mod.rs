//! Access gates.
//!
//! Both gates are pure: the caller fetches identity, entitlement and guardian
//! rows first and hands them in. Every ambiguity resolves to a denial.

mod access;
mod guardian;

pub use access::{AccessGate, ProtectedPaths};
pub use guardian::{GuardianAccess, GuardianAccessGate};

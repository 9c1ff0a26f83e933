//! Domain models for learning-portal.

mod decision;
mod guardian;
mod identity;
mod profile;

pub use decision::{AccessDecision, AllowReason, DenyReason};
pub use guardian::{GuardianContext, GuardianLink, GuardianSession};
pub use identity::Identity;
pub use profile::{Entitlement, ProfileRow, Role};

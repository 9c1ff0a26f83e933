//! Services module for learning-portal.

pub mod access;
pub mod database;
pub mod identity;
pub mod metrics;
pub mod store;

pub use access::{AccessControl, Authorization};
pub use database::PgEntitlementStore;
pub use identity::{IdentityError, IdentityResolver, JwtIdentityResolver, SessionClaims};
pub use metrics::{get_metrics, init_metrics};
pub use store::EntitlementStore;

//! Database Models

pub mod admin;
pub mod role;
pub mod serde_helpers;

use surrealdb::RecordId;

/// Admin account ID type
pub type AdminId = RecordId;

/// Role ID type
pub type RoleId = RecordId;

pub use admin::{Admin, AdminCreate, AdminUpdate};
pub use role::{DEFAULT_ROLE_SLUG, PROTECTED_ROLE_SLUG, Role, RoleCreate, RoleUpdate};

//! `yachtops-core`: identifiers and error primitives shared by every crate.
//!
//! Pure domain types, no infrastructure concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CustomRoleId, TenantId, UserId};

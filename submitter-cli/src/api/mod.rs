//! Metadata portal API module
//!
//! Profiles (object schemas), the REST operations issued per row, and the
//! reqwest client implementing them. The sync engine only depends on the
//! [`Portal`] and [`ProfileSource`] traits so it can run against a mock.

pub mod auth;
pub mod client;
pub mod constants;
pub mod operations;
pub mod profile;

pub use auth::Credentials;
pub use client::{Portal, PortalClient, ProfileSource};
pub use operations::{Operation, PortalResponse};
pub use profile::{Profile, PropertyType};

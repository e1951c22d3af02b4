//! Portal operations module
//!
//! One [`Operation`] is issued per data row; the portal answers with a
//! [`PortalResponse`] that the sync layer classifies as success, not found,
//! or generic failure.

pub mod operation;

pub use operation::{Operation, PortalResponse};

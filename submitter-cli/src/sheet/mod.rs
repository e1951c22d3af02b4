//! Sheet grid adapter
//!
//! A sheet is a header row of property names over data rows of text cells.
//! Control columns (`#skip`, `#response`, `#response_time`) live alongside
//! the property columns and are never sent to the portal.

pub mod columns;
pub mod csv_io;
pub mod excel;
pub mod grid;
pub mod template;
pub mod workbook;

pub use columns::{HEADER_COMMENTED_PROP_RESPONSE, HEADER_COMMENTED_PROP_RESPONSE_TIME, is_commented};
pub use grid::{HEADER_ROW, Sheet};
pub use template::{PropertyRole, apply_profile, make_template};
pub use workbook::{Workbook, load_workbook, save_workbook};

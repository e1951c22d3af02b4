//! Profile-driven synchronization engine
//!
//! Converts sheet rows to portal objects and back, validates them locally and
//! drives per-row GET/PUT/POST/PATCH batches against a [`Portal`](crate::api::Portal).

pub mod error;
pub mod mapper;
pub mod orchestrator;
pub mod outcome;
pub mod selector;
pub mod validate;
pub mod values;

pub use error::SyncError;
pub use mapper::{EXPORTED_JSON_INDENT, MapperOptions, export_sheet_to_json, row_to_object, to_json_pretty};
pub use orchestrator::{
    BatchOptions, SubmitMethod, rebuild_sheet_from_portal, submit_sheet_to_portal,
    update_sheet_from_portal,
};
pub use outcome::BatchReport;
pub use selector::{ColumnSelection, get_selected_columns};
pub use validate::validate_sheet;

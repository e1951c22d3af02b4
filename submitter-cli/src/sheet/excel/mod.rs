//! Excel workbook I/O
//!
//! calamine reads cell text and the package XML supplies hidden rows;
//! rust_xlsxwriter writes the whole workbook back, re-rendering the header
//! legend each time.

mod reader;
mod visibility;
mod writer;

pub use reader::read_workbook_xlsx;
pub use writer::write_workbook_xlsx;

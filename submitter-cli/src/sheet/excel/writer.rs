//! Write sheets to an xlsx file

use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use rust_xlsxwriter::{
    Color, DataValidation, Format, FormatAlign, FormatUnderline, Note, Workbook as XlsxWorkbook,
    Worksheet,
};

use crate::sheet::grid::HEADER_ROW;
use crate::sheet::template::{HeaderStyle, PropertyRole};
use crate::sheet::{Sheet, Workbook};

/// Rows below the header that receive enum dropdowns
const DROPDOWN_ROWS: usize = 1000;

/// Excel limit on the joined length of an inline dropdown list
const DROPDOWN_MAX_CHARS: usize = 255;

/// Write the whole workbook, replacing the file
pub fn write_workbook_xlsx<P: AsRef<Path>>(workbook: &Workbook, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut xlsx = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx.add_worksheet();
        worksheet
            .set_name(sheet.name())
            .with_context(|| format!("Invalid sheet name: {}", sheet.name()))?;
        write_sheet(worksheet, sheet)?;
    }

    xlsx.save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;
    Ok(())
}

fn write_sheet(ws: &mut Worksheet, sheet: &Sheet) -> Result<()> {
    let top = Format::new().set_align(FormatAlign::Top);

    for (r, cells) in sheet.rows().iter().enumerate() {
        let row = r as u32;
        for (c, text) in cells.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            ws.write_string_with_format(row, c as u16, text, &top)?;
        }
    }

    for style in sheet.header_styles() {
        write_header_style(ws, sheet, style)?;
    }

    for row in sheet.hidden_rows() {
        ws.set_row_hidden((row - 1) as u32)?;
    }

    Ok(())
}

/// Header format for one column, following the colour legend
fn header_format(style: &HeaderStyle) -> Format {
    let mut format = Format::new().set_align(FormatAlign::Top);
    format = match style.role {
        PropertyRole::Required => format.set_font_color(Color::Red),
        PropertyRole::Identifying => format.set_font_color(Color::Blue),
        PropertyRole::AdminOnly => format.set_font_color(Color::Gray),
        PropertyRole::Editable => format.set_font_color(Color::Black),
        PropertyRole::Commented => format.set_font_color(Color::Gray).set_italic(),
        PropertyRole::Missing => format.set_font_strikethrough(),
    };
    if style.array {
        format = format.set_bold().set_italic();
    }
    if style.searchable {
        format = format.set_underline(FormatUnderline::Single);
    }
    format
}

fn write_header_style(ws: &mut Worksheet, sheet: &Sheet, style: &HeaderStyle) -> Result<()> {
    let row = (HEADER_ROW - 1) as u32;
    let col = (style.col - 1) as u16;

    ws.write_string_with_format(row, col, sheet.cell(HEADER_ROW, style.col), &header_format(style))?;

    if let Some(note) = &style.note {
        ws.insert_note(row, col, &Note::new(note))?;
    }

    if !style.enum_values.is_empty() && !style.array {
        let joined: usize = style.enum_values.iter().map(|v| v.len() + 1).sum();
        if joined > DROPDOWN_MAX_CHARS {
            debug!(
                "Skipping dropdown for '{}': {} enum values too long for an inline list",
                sheet.cell(HEADER_ROW, style.col),
                style.enum_values.len()
            );
            return Ok(());
        }
        let validation = DataValidation::new().allow_list_strings(style.enum_values.as_slice())?;
        let last_row = sheet.last_row().max(DROPDOWN_ROWS) as u32;
        ws.add_data_validation(row + 1, col, last_row, col, &validation)?;
    }

    Ok(())
}

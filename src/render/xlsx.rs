use rust_xlsxwriter::{Format, Workbook};

use super::layout::{Block, Document};
use super::RenderError;

/// Write a document as a single-sheet workbook. Text lines go to the first
/// column, table cells to consecutive columns.
pub(crate) fn write_xlsx(document: &Document) -> Result<Vec<u8>, RenderError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    let mut row: u32 = 0;
    for block in &document.blocks {
        match block {
            Block::Text(text) => {
                worksheet
                    .write_string(row, 0, text)
                    .map_err(|e| RenderError::Output(e.to_string()))?;
                row += 1;
            }
            Block::Table { header, rows } => {
                for (col, cell) in header.iter().enumerate() {
                    worksheet
                        .write_string_with_format(row, col as u16, cell, &bold)
                        .map_err(|e| RenderError::Output(e.to_string()))?;
                }
                if !header.is_empty() {
                    row += 1;
                }
                for cells in rows {
                    for (col, cell) in cells.iter().enumerate() {
                        worksheet
                            .write_string(row, col as u16, cell)
                            .map_err(|e| RenderError::Output(e.to_string()))?;
                    }
                    row += 1;
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| RenderError::Output(e.to_string()))
}

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, ObjectId, Stream, StringFormat};

use super::layout::{Block, Document};
use super::RenderError;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const FONT_SIZE: f32 = 10.0;
const LEADING: f32 = 14.0;

/// A line of text cells, each placed at a horizontal offset from the left margin.
type Line = Vec<(f32, String)>;

fn layout_lines(document: &Document) -> Vec<Line> {
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    let mut lines = Vec::new();

    for block in &document.blocks {
        match block {
            Block::Text(text) => {
                for part in text.lines() {
                    lines.push(vec![(0.0, part.to_string())]);
                }
                if text.is_empty() {
                    lines.push(Vec::new());
                }
            }
            Block::Table { header, rows } => {
                let columns = rows
                    .iter()
                    .map(Vec::len)
                    .chain(std::iter::once(header.len()))
                    .max()
                    .unwrap_or(0)
                    .max(1);
                let width = usable / columns as f32;
                let row_line = |cells: &[String]| -> Line {
                    cells
                        .iter()
                        .enumerate()
                        .map(|(i, cell)| (i as f32 * width, cell.clone()))
                        .collect()
                };
                if !header.is_empty() {
                    lines.push(row_line(header));
                }
                for row in rows {
                    lines.push(row_line(row));
                }
            }
        }
    }

    lines
}

/// WinAnsi bytes for the standard Helvetica font. Characters outside Latin-1 become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn page_content(lines: &[Line]) -> Content {
    let mut operations = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN - FONT_SIZE;
    for line in lines {
        for (x, text) in line.iter().filter(|(_, text)| !text.is_empty()) {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
            operations.push(Operation::new("Td", vec![(MARGIN + x).into(), y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(text), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        y -= LEADING;
    }
    Content { operations }
}

/// Write a document as a PDF 1.4 file with A4 pages.
pub(crate) fn write_pdf(document: &Document) -> Result<Vec<u8>, RenderError> {
    let lines = layout_lines(document);
    let per_page = ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING).floor() as usize;
    let pages: Vec<&[Line]> = if lines.is_empty() {
        vec![&lines[..]]
    } else {
        lines.chunks(per_page).collect()
    };

    let mut doc = lopdf::Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in &pages {
        let content = page_content(page)
            .encode()
            .map_err(|e| RenderError::Output(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| RenderError::Output(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_strings(pdf: &[u8]) -> Vec<Vec<String>> {
        let doc = lopdf::Document::load_mem(pdf).unwrap();
        doc.get_pages()
            .into_values()
            .map(|page_id| {
                let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
                content
                    .operations
                    .into_iter()
                    .filter(|op| op.operator == "Tj")
                    .filter_map(|op| match op.operands.first() {
                        Some(Object::String(bytes, _)) => {
                            Some(bytes.iter().map(|&b| b as char).collect())
                        }
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let pdf = write_pdf(&Document::default()).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        let pages = page_strings(&pdf);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn test_long_document_breaks_pages() {
        let document = Document {
            blocks: (0..120).map(|i| Block::Text(format!("line {i}"))).collect(),
        };
        let pages = page_strings(&write_pdf(&document).unwrap());
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 53);
        assert_eq!(pages[0][0], "line 0");
        assert_eq!(pages[2].last().map(String::as_str), Some("line 119"));
    }

    #[test]
    fn test_table_cells_are_separate_strings() {
        let document = Document {
            blocks: vec![Block::Table {
                header: vec!["Name".to_string(), "Year".to_string()],
                rows: vec![vec!["Horses (Remastered)".to_string(), "1975".to_string()]],
            }],
        };
        let pages = page_strings(&write_pdf(&document).unwrap());
        assert_eq!(pages[0], vec!["Name", "Year", "Horses (Remastered)", "1975"]);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(win_ansi("a(b)\\"), b"a(b)\\".to_vec());
        assert_eq!(win_ansi("caf\u{e9}\t\u{263a}"), b"caf\xe9 ?".to_vec());
    }
}

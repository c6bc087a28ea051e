use crate::error::{LocalMindError, Result};

/// Paragraph and table text from an OOXML word-processing document.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn extract(bytes: &[u8]) -> Result<String> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| LocalMindError::Processing(format!("DOCX parse error: {e}")))?;

        let mut lines: Vec<String> = Vec::new();

        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(paragraph) => {
                    let text = Self::paragraph_text(paragraph);
                    if !text.trim().is_empty() {
                        lines.push(text);
                    }
                }
                docx_rs::DocumentChild::Table(table) => {
                    lines.extend(Self::table_rows(table));
                }
                _ => {}
            }
        }

        Ok(lines.join("\n"))
    }

    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut content = String::new();
        for para_child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = para_child {
                for run_child in &run.children {
                    match run_child {
                        docx_rs::RunChild::Text(text) => content.push_str(&text.text),
                        docx_rs::RunChild::Tab(_) => content.push('\t'),
                        _ => {}
                    }
                }
            }
        }
        content
    }

    /// One line per row, cells separated by ` | `.
    fn table_rows(table: &docx_rs::Table) -> Vec<String> {
        let mut rows = Vec::new();

        for table_child in &table.rows {
            let docx_rs::TableChild::TableRow(row) = table_child;
            let cells: Vec<String> = row
                .cells
                .iter()
                .map(|row_child| {
                    let docx_rs::TableRowChild::TableCell(cell) = row_child;
                    cell.children
                        .iter()
                        .filter_map(|content| match content {
                            docx_rs::TableCellContent::Paragraph(para) => {
                                Some(Self::paragraph_text(para))
                            }
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                        .trim()
                        .to_string()
                })
                .collect();

            if cells.iter().any(|c| !c.is_empty()) {
                rows.push(cells.join(" | "));
            }
        }

        rows
    }
}

use crate::models::DocumentFormat;

use super::docx::DocxExtractor;

/// Converts stored document bytes into plain text.
///
/// Never fails: unreadable content degrades to lossy UTF-8 or empty text, which
/// the indexing pipeline treats as a skip.
pub struct ContentExtractor;

impl ContentExtractor {
    pub fn extract(bytes: &[u8], format: DocumentFormat) -> String {
        match format {
            DocumentFormat::Txt => Self::decode_lossy(bytes),
            DocumentFormat::Pdf => Self::extract_pdf(bytes),
            DocumentFormat::Docx => match DocxExtractor::extract(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "DOCX parsing failed, decoding raw bytes");
                    Self::decode_lossy(bytes)
                }
            },
            // Legacy .doc is a binary format; recover whatever text is readable
            DocumentFormat::Doc => Self::decode_lossy(bytes),
        }
    }

    /// Page texts joined with a newline after each page.
    ///
    /// `pdf-extract` handles font encodings best but fails the whole file on
    /// one bad page, and can panic on malformed content. When it does, pages
    /// are recovered one at a time.
    fn extract_pdf(bytes: &[u8]) -> String {
        let whole =
            std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
        match whole {
            Ok(Ok(pages)) => join_pages(
                pages
                    .iter()
                    .enumerate()
                    .map(|(i, page)| (i as u32 + 1, page.as_str())),
            ),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "PDF extraction failed, recovering page by page");
                Self::recover_pdf_pages(bytes)
            }
            Err(_) => {
                tracing::warn!("PDF extractor panicked, recovering page by page");
                Self::recover_pdf_pages(bytes)
            }
        }
    }

    /// Extract each page on its own; pages that fail are logged and skipped.
    fn recover_pdf_pages(bytes: &[u8]) -> String {
        let doc = match lopdf::Document::load_mem(bytes) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "PDF could not be parsed, treating document as empty");
                return String::new();
            }
        };

        let mut pages = Vec::new();
        for page in doc.get_pages().into_keys() {
            match doc.extract_text(&[page]) {
                Ok(text) => pages.push((page, text)),
                Err(e) => tracing::warn!(page, error = %e, "Skipping unreadable PDF page"),
            }
        }
        join_pages(pages.iter().map(|(n, t)| (*n, t.as_str())))
    }

    fn decode_lossy(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn join_pages<'a>(pages: impl Iterator<Item = (u32, &'a str)>) -> String {
    let mut text = String::new();
    for (number, page) in pages {
        if page.trim().is_empty() {
            tracing::debug!(page = number, "PDF page has no extractable text");
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_invalid_utf8_is_replaced() {
        let bytes = b"valid start \xff\xfe then more";
        let text = ContentExtractor::extract(bytes, DocumentFormat::Txt);
        assert!(text.starts_with("valid start "));
        assert!(text.ends_with(" then more"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_garbage_pdf_yields_empty_text() {
        let text = ContentExtractor::extract(b"%PDF-1.7 this is not a pdf", DocumentFormat::Pdf);
        assert!(text.trim().is_empty());
    }

    /// Three-page PDF; the middle page has a `Tf` operator without operands.
    fn pdf_with_broken_middle_page() -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let text_page = |text: &str| Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let broken_page = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![]),
                Operation::new("ET", vec![]),
            ],
        };

        let mut kids: Vec<Object> = Vec::new();
        for content in [text_page("Pump maintenance"), broken_page, text_page("Valve schedule")] {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => 3,
                "Kids" => kids,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_unreadable_pdf_page_is_skipped() {
        let text = ContentExtractor::recover_pdf_pages(&pdf_with_broken_middle_page());
        assert!(text.contains("Pump maintenance"));
        assert!(text.contains("Valve schedule"));
    }

    #[test]
    fn test_doc_falls_back_to_lossy_decode() {
        let text = ContentExtractor::extract(b"legacy words", DocumentFormat::Doc);
        assert_eq!(text, "legacy words");
    }

    #[test]
    fn test_docx_that_is_not_a_zip_falls_back() {
        let text = ContentExtractor::extract(b"plain text named .docx", DocumentFormat::Docx);
        assert_eq!(text, "plain text named .docx");
    }
}

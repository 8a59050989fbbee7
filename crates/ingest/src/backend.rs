use anyhow::{Context, Result};
use lopdf::content::Content;
use lopdf::{Document, Object};

/// Turns raw PDF bytes into plain text
pub trait TextBackend: Send + Sync {
    fn name(&self) -> &str;

    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// The default backends, best first
pub fn default_backends() -> Vec<Box<dyn TextBackend>> {
    vec![
        Box::new(PdfExtractBackend),
        Box::new(LopdfTextBackend),
        Box::new(ContentStreamBackend),
    ]
}

/// Layout-aware extraction via `pdf-extract`
pub struct PdfExtractBackend;

impl TextBackend for PdfExtractBackend {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .context("pdf-extract failed to read document")?;
        Ok(text.trim().to_string())
    }
}

/// Page-by-page text through lopdf's font-aware decoder
pub struct LopdfTextBackend;

impl TextBackend for LopdfTextBackend {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let document = Document::load_mem(bytes).context("lopdf failed to parse document")?;

        let mut text = String::new();
        for page_number in document.get_pages().keys() {
            // One unreadable page should not cost us the rest
            if let Ok(page_text) = document.extract_text(&[*page_number]) {
                text.push_str(&page_text);
                text.push('\n');
            }
        }

        Ok(text.trim().to_string())
    }
}

/// Raw scan of text-showing operators in each page's content stream.
///
/// Ignores font encodings entirely, which makes it the most forgiving backend
/// for documents whose fonts confuse the other two.
pub struct ContentStreamBackend;

impl TextBackend for ContentStreamBackend {
    fn name(&self) -> &str {
        "content-stream"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let document = Document::load_mem(bytes).context("lopdf failed to parse document")?;

        let mut text = String::new();
        for (_, page_id) in document.get_pages() {
            let Ok(raw) = document.get_page_content(page_id) else {
                continue;
            };
            let Ok(content) = Content::decode(&raw) else {
                continue;
            };

            for operation in &content.operations {
                match operation.operator.as_str() {
                    "Tj" | "'" | "\"" => {
                        if let Some(Object::String(bytes, _)) = operation.operands.last() {
                            text.push_str(&decode_latin1(bytes));
                        }
                    }
                    "TJ" => {
                        if let Some(Object::Array(items)) = operation.operands.first() {
                            push_tj_array(&mut text, items);
                        }
                    }
                    "Td" | "TD" | "T*" | "ET" => text.push('\n'),
                    _ => {}
                }
            }
            text.push('\n');
        }

        Ok(text.trim().to_string())
    }
}

/// Strings in a TJ array, with a space for large negative kerning gaps
fn push_tj_array(text: &mut String, items: &[Object]) {
    for item in items {
        match item {
            Object::String(bytes, _) => text.push_str(&decode_latin1(bytes)),
            Object::Integer(offset) if *offset < -200 => text.push(' '),
            Object::Real(offset) if *offset < -200.0 => text.push(' '),
            _ => {}
        }
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream};

    /// Single-page PDF whose content stream shows each line with Tj
    pub(crate) fn pdf_with_lines(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for line in lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
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
    fn test_content_stream_backend_reads_tj() {
        let pdf = pdf_with_lines(&["Key risks: credit risk", "and liquidity risk"]);
        let text = ContentStreamBackend.extract_text(&pdf).unwrap();
        assert!(text.contains("Key risks: credit risk"));
        assert!(text.contains("and liquidity risk"));
    }

    #[test]
    fn test_tj_array_spacing() {
        let mut text = String::new();
        push_tj_array(
            &mut text,
            &[
                Object::string_literal("credit"),
                Object::Integer(-250),
                Object::string_literal("risk"),
                Object::Integer(-20),
                Object::string_literal("s"),
            ],
        );
        assert_eq!(text, "credit risks");
    }

    #[test]
    fn test_garbage_is_an_error() {
        let garbage = b"this is not a pdf";
        assert!(LopdfTextBackend.extract_text(garbage).is_err());
        assert!(ContentStreamBackend.extract_text(garbage).is_err());
    }

    #[test]
    fn test_default_backend_order() {
        let names: Vec<String> = default_backends()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["pdf-extract", "lopdf", "content-stream"]);
    }
}

use std::io::{Cursor, Read, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::StampError;
use crate::replace::replace_in_part;

/// Body, header and footer parts carry the visible text
pub fn is_text_part(name: &str) -> bool {
    if name == "word/document.xml" {
        return true;
    }
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    (file.starts_with("header") || file.starts_with("footer"))
        && file.ends_with(".xml")
        && !file.contains('/')
}

/// Copy a docx archive, rewriting its text parts.
///
/// Every other entry is copied raw so embedded media and checkbox controls
/// come through byte for byte.
pub fn rewrite_docx(template: &[u8], old: &str, new: &str) -> Result<(Vec<u8>, usize), StampError> {
    let mut archive = ZipArchive::new(Cursor::new(template))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(template.len())));
    let mut replacements = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        if !is_text_part(&name) {
            writer.raw_copy_file(entry)?;
            continue;
        }

        let options = SimpleFileOptions::default().compression_method(entry.compression());
        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;

        let (rewritten, count) = replace_in_part(&xml, old, new)?;
        debug!(part = %name, replacements = count, "Rewrote document part");
        replacements += count;

        writer.start_file(name, options)?;
        writer.write_all(rewritten.as_bytes())?;
    }

    let bytes = writer.finish()?.into_inner();
    Ok((bytes, replacements))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    /// Minimal docx with one body paragraph, one header and one footer
    pub(crate) fn docx(body: &str, header: &str, footer: &str) -> Vec<u8> {
        let part = |root: &str, text: &str| {
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:{root} xmlns:w="{W_NS}"><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:{root}>"#
            )
        };
        let body = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}"><w:body><w:p><w:r><w:t>{body}</w:t></w:r></w:p></w:body></w:document>"#
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let entries = [
            ("[Content_Types].xml", "<Types/>".to_string()),
            ("word/document.xml", body),
            ("word/header1.xml", part("hdr", header)),
            ("word/footer1.xml", part("ftr", footer)),
            ("word/media/note.txt", "Sep 12_Mass stays here".to_string()),
        ];
        for (name, content) in entries {
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    pub(crate) fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_text_parts() {
        assert!(is_text_part("word/document.xml"));
        assert!(is_text_part("word/header2.xml"));
        assert!(is_text_part("word/footer1.xml"));
        assert!(!is_text_part("word/_rels/header1.xml.rels"));
        assert!(!is_text_part("word/styles.xml"));
        assert!(!is_text_part("docProps/core.xml"));
    }

    #[test]
    fn test_rewrite_body_header_and_footer() {
        let template = docx("Date: Sep 12_Mass", "Sep 12_Mass", "Page 1");
        let (bytes, count) = rewrite_docx(&template, "Sep 12_Mass", "Oct 03_Mass").unwrap();

        assert_eq!(count, 2);
        assert!(read_entry(&bytes, "word/document.xml").contains("Date: Oct 03_Mass"));
        assert!(read_entry(&bytes, "word/header1.xml").contains("Oct 03_Mass"));
        assert!(read_entry(&bytes, "word/footer1.xml").contains("Page 1"));
        assert_eq!(
            read_entry(&bytes, "word/media/note.txt"),
            "Sep 12_Mass stays here"
        );
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            rewrite_docx(b"plain text", "a", "b"),
            Err(StampError::Zip(_))
        ));
    }
}

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::StampError;

const PARAGRAPH: &[u8] = b"w:p";
const TEXT: &[u8] = b"w:t";

/// Replace `old` with `new` in every paragraph of a WordprocessingML part.
///
/// Text inside a single `<w:t>` is replaced in place so run formatting
/// survives. When a paragraph only contains `old` across several runs, the
/// whole replaced paragraph text moves into its first text node and the
/// remaining ones are emptied. Returns the rewritten XML and the number of
/// replacements.
pub fn replace_in_part(xml: &str, old: &str, new: &str) -> Result<(String, usize), StampError> {
    if old.is_empty() {
        return Err(StampError::EmptyText("old text"));
    }

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut paragraph: Vec<Event<'static>> = Vec::new();
    let mut depth = 0usize;
    let mut replacements = 0;

    loop {
        let event = reader.read_event()?;
        if matches!(event, Event::Eof) {
            break;
        }

        let opens = matches!(&event, Event::Start(e) if e.name().as_ref() == PARAGRAPH);
        let closes = matches!(&event, Event::End(e) if e.name().as_ref() == PARAGRAPH);

        if opens {
            depth += 1;
        }
        if depth == 0 {
            writer.write_event(event)?;
            continue;
        }

        paragraph.push(event.into_owned());
        if closes {
            depth -= 1;
            if depth == 0 {
                replacements += rewrite_paragraph(&mut paragraph, old, new)?;
                for buffered in paragraph.drain(..) {
                    writer.write_event(buffered)?;
                }
            }
        }
    }

    // Truncated part: flush whatever was buffered untouched
    for buffered in paragraph.drain(..) {
        writer.write_event(buffered)?;
    }

    let rewritten = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    Ok((rewritten, replacements))
}

fn rewrite_paragraph(events: &mut [Event<'static>], old: &str, new: &str) -> Result<usize, StampError> {
    let mut runs: Vec<(usize, String)> = Vec::new();
    let mut in_text = false;
    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) if e.name().as_ref() == TEXT => in_text = true,
            Event::End(e) if e.name().as_ref() == TEXT => in_text = false,
            Event::Text(t) if in_text => runs.push((index, t.unescape()?.into_owned())),
            _ => {}
        }
    }

    let full: String = runs.iter().map(|(_, text)| text.as_str()).collect();
    if !full.contains(old) {
        return Ok(0);
    }

    let in_runs: usize = runs.iter().map(|(_, text)| text.matches(old).count()).sum();
    if in_runs > 0 {
        for (index, text) in &runs {
            if text.contains(old) {
                events[*index] = text_event(&text.replace(old, new));
            }
        }
        return Ok(in_runs);
    }

    // Spans runs: collapse into the first text node
    let count = full.matches(old).count();
    let mut runs = runs.into_iter();
    if let Some((first, _)) = runs.next() {
        events[first] = text_event(&full.replace(old, new));
        if let Some(Event::Start(start)) = first.checked_sub(1).map(|i| &events[i]) {
            let preserved = preserve_space(start);
            events[first - 1] = Event::Start(preserved);
        }
    }
    for (index, _) in runs {
        events[index] = text_event("");
    }
    Ok(count)
}

fn text_event(text: &str) -> Event<'static> {
    Event::Text(BytesText::new(text).into_owned())
}

/// Word trims text nodes without `xml:space="preserve"`
fn preserve_space(start: &BytesStart<'static>) -> BytesStart<'static> {
    let mut start = start.clone();
    let has_space = start.try_get_attribute("xml:space").ok().flatten().is_some();
    if !has_space {
        start.push_attribute(("xml:space", "preserve"));
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(runs: &[&str]) -> String {
        let runs: String = runs
            .iter()
            .map(|text| format!("<w:r><w:rPr><w:b/></w:rPr><w:t>{text}</w:t></w:r>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p>{runs}</w:p></w:body></w:document>"#
        )
    }

    #[test]
    fn test_run_level_replacement_keeps_formatting() {
        let xml = paragraph(&["Ref: Sep 12_Mass", " and Sep 12_Mass again"]);
        let (out, count) = replace_in_part(&xml, "Sep 12_Mass", "Oct 03_Mass").unwrap();

        assert_eq!(count, 2);
        assert!(out.contains("<w:t>Ref: Oct 03_Mass</w:t>"));
        assert!(out.contains("<w:t> and Oct 03_Mass again</w:t>"));
        assert_eq!(out.matches("<w:b/>").count(), 2);
        assert!(out.starts_with("<?xml"));
    }

    #[test]
    fn test_text_split_across_runs() {
        let xml = paragraph(&["Ref: Sep ", "12_Mass", " end"]);
        let (out, count) = replace_in_part(&xml, "Sep 12_Mass", "Oct 03_Mass").unwrap();

        assert_eq!(count, 1);
        assert!(out.contains(r#"<w:t xml:space="preserve">Ref: Oct 03_Mass end</w:t>"#));
        assert!(out.contains("<w:t></w:t>"));
        assert!(!out.contains("12_Mass</w:t>"));
    }

    #[test]
    fn test_untouched_paragraphs_and_escaping() {
        let xml = paragraph(&["Fish &amp; Chips"]);
        let (out, count) = replace_in_part(&xml, "Sep 12_Mass", "Oct 03_Mass").unwrap();
        assert_eq!(count, 0);
        assert!(out.contains("Fish &amp; Chips"));

        let xml = paragraph(&["A &amp; B Sep 12_Mass"]);
        let (out, count) = replace_in_part(&xml, "Sep 12_Mass", "R&amp;D").unwrap();
        assert_eq!(count, 1);
        assert!(out.contains("A &amp; B R&amp;amp;D"));
    }

    #[test]
    fn test_text_outside_paragraphs_is_ignored() {
        let xml = r#"<w:hdr xmlns:w="x"><w:t>Sep 12_Mass</w:t><w:p><w:r><w:t>Sep 12_Mass</w:t></w:r></w:p></w:hdr>"#;
        let (out, count) = replace_in_part(xml, "Sep 12_Mass", "Oct 03_Mass").unwrap();
        assert_eq!(count, 1);
        assert!(out.starts_with(r#"<w:hdr xmlns:w="x"><w:t>Sep 12_Mass</w:t>"#));
    }

    #[test]
    fn test_empty_old_text_is_rejected() {
        assert!(matches!(
            replace_in_part("<w:p/>", "", "x"),
            Err(StampError::EmptyText(_))
        ));
    }
}

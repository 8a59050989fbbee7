//! Date stamping for the onboarding evaluation Word template.

pub mod docx;
pub mod error;
pub mod replace;
pub mod state;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

pub use docx::rewrite_docx;
pub use error::StampError;
pub use replace::replace_in_part;
pub use state::StampState;

pub const DEFAULT_OLD_TEXT: &str = "Sep 12_Mass";

/// Result of stamping one template
#[derive(Debug, Clone, Serialize)]
pub struct StampOutcome {
    pub output_path: PathBuf,
    pub old_text: String,
    pub new_text: String,
    pub replacements: usize,
}

/// Text written into the template for a date such as "Oct 03"
pub fn stamp_text(date: &str) -> String {
    format!("{}_Mass", date.trim())
}

pub fn output_file_name(new_text: &str) -> String {
    format!("{new_text} Onboarding New Product Evaluation Appendix C.docx")
}

/// `.docx` files in a folder, sorted, without Word's `~$` lock files
pub fn list_templates(dir: &Path) -> Result<Vec<PathBuf>, StampError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut templates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            path.is_file() && name.ends_with(".docx") && !name.starts_with('~')
        })
        .collect();
    templates.sort();
    Ok(templates)
}

/// Stamps templates and remembers the last stamp for the next run
pub struct Stamper {
    output_dir: PathBuf,
    state_file: PathBuf,
    default_old_text: String,
}

impl Stamper {
    pub fn new(output_dir: impl Into<PathBuf>, state_file: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            state_file: state_file.into(),
            default_old_text: DEFAULT_OLD_TEXT.to_string(),
        }
    }

    pub fn with_default_old_text(mut self, old_text: impl Into<String>) -> Self {
        self.default_old_text = old_text.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn state(&self) -> StampState {
        StampState::load(&self.state_file, &self.default_old_text)
    }

    /// Replace the remembered stamp with `"{new_date}_Mass"` and write the
    /// result to the output folder
    pub fn stamp(&self, template: &Path, new_date: &str) -> Result<StampOutcome, StampError> {
        if new_date.trim().is_empty() {
            return Err(StampError::EmptyText("new date"));
        }
        if !template.is_file() {
            return Err(StampError::TemplateNotFound(template.to_path_buf()));
        }

        let mut state = self.state();
        let new_text = stamp_text(new_date);
        info!(
            template = %template.display(),
            old_text = %state.old_text,
            new_text = %new_text,
            "Stamping document"
        );

        let bytes = fs::read(template)?;
        let (stamped, replacements) = rewrite_docx(&bytes, &state.old_text, &new_text)?;
        if replacements == 0 {
            warn!(old_text = %state.old_text, "Template contained no stamp to replace");
        }

        fs::create_dir_all(&self.output_dir)?;
        let output_path = self.output_dir.join(output_file_name(&new_text));
        fs::write(&output_path, stamped)?;

        let old_text = std::mem::replace(&mut state.old_text, new_text.clone());
        state.template = template
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        state.save(&self.state_file)?;

        info!(output = %output_path.display(), replacements, "Document stamped");
        Ok(StampOutcome {
            output_path,
            old_text,
            new_text,
            replacements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::tests::{docx, read_entry};

    #[test]
    fn test_names() {
        assert_eq!(stamp_text(" Oct 03 "), "Oct 03_Mass");
        assert_eq!(
            output_file_name("Oct 03_Mass"),
            "Oct 03_Mass Onboarding New Product Evaluation Appendix C.docx"
        );
    }

    #[test]
    fn test_list_templates_skips_lock_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.docx", "a.docx", "~$a.docx", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("folder.docx")).unwrap();

        let names: Vec<String> = list_templates(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.docx", "b.docx"]);

        assert!(list_templates(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_stamp_chains_through_state() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("Appendix C.docx");
        fs::write(&template, docx("Batch Sep 12_Mass", "Sep 12_Mass", "")).unwrap();

        let stamper = Stamper::new(dir.path().join("results"), dir.path().join("stamp_state.json"));

        let first = stamper.stamp(&template, "Oct 03").unwrap();
        assert_eq!(first.old_text, "Sep 12_Mass");
        assert_eq!(first.replacements, 2);
        assert!(first.output_path.ends_with(
            "results/Oct 03_Mass Onboarding New Product Evaluation Appendix C.docx"
        ));
        let stamped = fs::read(&first.output_path).unwrap();
        assert!(read_entry(&stamped, "word/document.xml").contains("Batch Oct 03_Mass"));

        let state = stamper.state();
        assert_eq!(state.old_text, "Oct 03_Mass");
        assert_eq!(state.template.as_deref(), Some("Appendix C.docx"));

        let second = stamper.stamp(&first.output_path, "Nov 07").unwrap();
        assert_eq!(second.old_text, "Oct 03_Mass");
        assert_eq!(second.replacements, 2);

        // The pristine template still carries the first stamp
        let third = stamper.stamp(&template, "Dec 01").unwrap();
        assert_eq!(third.old_text, "Nov 07_Mass");
        assert_eq!(third.replacements, 0);
    }

    #[test]
    fn test_stamp_errors() {
        let dir = tempfile::tempdir().unwrap();
        let stamper = Stamper::new(dir.path(), dir.path().join("state.json"));

        assert!(matches!(
            stamper.stamp(&dir.path().join("missing.docx"), "Oct 03"),
            Err(StampError::TemplateNotFound(_))
        ));
        assert!(matches!(
            stamper.stamp(&dir.path().join("missing.docx"), "  "),
            Err(StampError::EmptyText(_))
        ));
    }
}

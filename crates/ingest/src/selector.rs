use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{default_backends, TextBackend};

/// Output of the backend that found the most risk mentions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedText {
    pub backend: String,
    pub risk_mentions: usize,
    #[serde(skip)]
    pub text: String,
}

/// Case-insensitive occurrences of "risk"
pub fn count_risk_mentions(text: &str) -> usize {
    text.to_lowercase().matches("risk").count()
}

/// Pick the candidate with the strictly highest risk count.
///
/// Earlier candidates win ties, and nothing is chosen when no candidate
/// mentions risk at all.
pub fn select_best<I>(candidates: I) -> Option<SelectedText>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut best: Option<SelectedText> = None;

    for (backend, text) in candidates {
        let risk_mentions = count_risk_mentions(&text);
        let best_count = best.as_ref().map_or(0, |b| b.risk_mentions);
        if risk_mentions > best_count {
            best = Some(SelectedText {
                backend,
                risk_mentions,
                text,
            });
        }
    }

    best
}

/// Runs every backend over a document and keeps the most useful text
pub struct BackendSelector {
    backends: Vec<Box<dyn TextBackend>>,
}

impl BackendSelector {
    pub fn new(backends: Vec<Box<dyn TextBackend>>) -> Self {
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Text of the winning backend, or `None` when every backend failed or
    /// none of them found the word "risk"
    pub fn select(&self, bytes: &[u8]) -> Option<SelectedText> {
        let outputs: Vec<(String, String)> = self
            .backends
            .iter()
            .filter_map(|backend| run_backend(backend.as_ref(), bytes))
            .collect();

        let selected = select_best(outputs);
        match &selected {
            Some(s) => info!(
                backend = %s.backend,
                risk_mentions = s.risk_mentions,
                chars = s.text.len(),
                "Selected text backend"
            ),
            None => warn!("No backend produced text mentioning risk"),
        }
        selected
    }
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::new(default_backends())
    }
}

/// A backend that errors, panics or returns nothing is skipped
fn run_backend(backend: &dyn TextBackend, bytes: &[u8]) -> Option<(String, String)> {
    let name = backend.name().to_string();

    match catch_unwind(AssertUnwindSafe(|| backend.extract_text(bytes))) {
        Ok(Ok(text)) if !text.trim().is_empty() => {
            debug!(
                backend = %name,
                chars = text.len(),
                risk_mentions = count_risk_mentions(&text),
                "Backend extracted text"
            );
            Some((name, text))
        }
        Ok(Ok(_)) => {
            debug!(backend = %name, "Backend returned no text");
            None
        }
        Ok(Err(e)) => {
            debug!(backend = %name, error = %e, "Backend failed");
            None
        }
        Err(_) => {
            warn!(backend = %name, "Backend panicked");
            None
        }
    }
}

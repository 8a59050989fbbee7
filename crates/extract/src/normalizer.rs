use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Normalize document text: lowercase, newlines to spaces, collapse whitespace
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    // Convert to lowercase
    let lowered = text.to_lowercase();

    // Replace line breaks with spaces
    let flattened = lowered.replace(['\n', '\r'], " ");

    // Collapse multiple spaces
    WHITESPACE.replace_all(&flattened, " ").trim().to_string()
}

/// Comparison form of a phrase: lowercase, collapsed whitespace, no punctuation.
/// Only used for equality/overlap checks, never shown to the user.
pub fn normalize_phrase(phrase: &str) -> String {
    let lowered = phrase.to_lowercase();
    let collapsed = WHITESPACE.replace_all(lowered.trim(), " ");
    PUNCTUATION.replace_all(&collapsed, "").to_string()
}

const PLURAL_REPLACEMENTS: &[(&str, &str)] = &[
    ("bonds", "bond"),
    ("risks", "risk"),
    ("markets", "market"),
    ("rates", "rate"),
    ("securities", "security"),
    ("currencies", "currency"),
];

/// Replace the common plural forms found in disclosure documents, applied in order.
pub fn normalize_plurals(text: &str) -> String {
    PLURAL_REPLACEMENTS
        .iter()
        .fold(text.to_string(), |acc, (plural, singular)| acc.replace(plural, singular))
}

/// Crude singular form of a single token.
pub fn singularize(token: &str) -> String {
    if token.len() > 4 && token.ends_with("ies") {
        return format!("{}y", &token[..token.len() - 3]);
    }
    if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

/// Title-case one word the way a reader expects in a spreadsheet cell:
/// a letter following a non-letter is upper-cased, every other letter lowered.
pub fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut prev_cased = false;

    for c in word.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }

    out
}

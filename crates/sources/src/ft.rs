use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;
use url::Url;

use crate::error::SourceError;
use crate::http::HttpClient;

/// Share of assets above which a single region names the fund's geography
const DOMINANT_REGION_PCT: f64 = 80.0;

static PERCENT_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.?\d*)%").unwrap());
static TRAILING_MORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*More\s*[▼▽⏷⏵]+\s*$").unwrap());
static TRAILING_MORE_PLAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*More\s*$").unwrap());
static INLINE_MORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*More\s*[▼▽⏷⏵]+\s*").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Fields scraped from the FT fund tearsheet; blanks when missing
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TearsheetData {
    pub geographic: String,
    pub investment_objective: String,
    pub launch_date: String,
    pub ongoing_charge: String,
    pub morningstar_category: String,
}

impl TearsheetData {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        Self {
            geographic: parse_geographic(&document),
            investment_objective: parse_objective(&document),
            launch_date: profile_value(&document, "launch date").unwrap_or_default(),
            ongoing_charge: parse_ongoing_charge(&document),
            morningstar_category: profile_value(&document, "morningstar category").unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct FtScraper {
    http: HttpClient,
    base_url: String,
}

impl FtScraper {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn tearsheet_url(&self, isin: &str) -> Result<Url, SourceError> {
        Ok(Url::parse_with_params(&self.base_url, &[("s", isin)])?)
    }

    pub async fn fetch(&self, isin: &str) -> Result<TearsheetData, SourceError> {
        let url = self.tearsheet_url(isin)?;
        let html = self.http.get_text(url.as_str()).await?;
        Ok(TearsheetData::parse(&html))
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Element text with every fragment trimmed and glued together
fn stripped_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect()
}

/// Single dominant region, "Global" when spread out, blank when absent
fn parse_geographic(document: &Html) -> String {
    let column = selector(r#"div.mod-diversification__column[data-mod-section="Region"]"#);
    let table = selector("table.mod-ui-table");
    let row = selector("tr");
    let cell = selector("td");
    let region_label = selector("span.mod-ui-table__cell--colored__wrapper");

    let Some(table) = document
        .select(&column)
        .next()
        .and_then(|section| section.select(&table).next())
    else {
        return String::new();
    };

    let mut regions = Vec::new();
    for tr in table.select(&row) {
        let cells: Vec<ElementRef> = tr.select(&cell).collect();
        if cells.len() < 2 {
            continue;
        }
        let Some(label) = cells[0].select(&region_label).next() else {
            continue;
        };
        let pct = PERCENT_VALUE
            .captures(&stripped_text(cells[1]))
            .and_then(|c| c[1].parse::<f64>().ok());
        if let Some(pct) = pct {
            regions.push((stripped_text(label), pct));
        }
    }

    if regions.is_empty() {
        return String::new();
    }
    regions
        .into_iter()
        .find(|(_, pct)| *pct > DOMINANT_REGION_PCT)
        .map_or_else(|| "Global".to_string(), |(name, _)| name)
}

/// Paragraphs under the "Objective" heading without the "More" toggle
fn parse_objective(document: &Html) -> String {
    let anchors = selector("h2, div.mod-module__content");
    let paragraph = selector("p");

    // Document order: the first content block after the Objective heading
    let mut after_heading = false;
    let mut content = None;
    for element in document.select(&anchors) {
        if element.value().name() == "h2" {
            if !after_heading {
                after_heading = stripped_text(element) == "Objective";
            }
        } else if after_heading {
            content = Some(element);
            break;
        }
    }
    let Some(content) = content else {
        return String::new();
    };

    let mut parts = Vec::new();
    for p in content.select(&paragraph) {
        let text = visible_text(p);
        let text = TRAILING_MORE.replace(&text, "");
        let text = TRAILING_MORE_PLAIN.replace(&text, "");
        if !text.is_empty() {
            parts.push(text.to_string());
        }
    }

    let joined = parts.join(" ");
    let joined = INLINE_MORE.replace_all(&joined, " ");
    WHITESPACE.replace_all(&joined, " ").trim().to_string()
}

/// Text of an element, skipping anything inside the "show more" widgets
fn visible_text(element: ElementRef) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ElementRef::wrap(ancestor).is_some_and(|el| {
                let value = el.value();
                (value.name() == "div" && value.classes().any(|c| c == "mod-ui-show-more"))
                    || (value.name() == "span" && value.classes().any(|c| c == "mod-ui-show-more__link"))
            })
        });
        if !hidden {
            out.push_str(text.trim());
        }
    }
    out
}

/// Value cell of the first profile row whose header contains `label`
fn profile_value(document: &Html, label: &str) -> Option<String> {
    let table = selector("table.mod-ui-table");
    let row = selector("tr");
    let th = selector("th");
    let td = selector("td");

    document
        .select(&table)
        .flat_map(|t| t.select(&row))
        .find_map(|tr| {
            let header = tr.select(&th).next()?;
            let value = tr.select(&td).next()?;
            stripped_text(header)
                .to_lowercase()
                .contains(label)
                .then(|| stripped_text(value))
        })
}

fn parse_ongoing_charge(document: &Html) -> String {
    let Some(value) = profile_value(document, "ongoing charge") else {
        return String::new();
    };
    PERCENT_VALUE
        .captures(&value)
        .map_or(value.clone(), |c| c[0].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEARSHEET: &str = r#"<html><body>
        <div class="mod-module">
          <h2>Objective</h2>
          <div class="mod-module__content">
            <p>The Fund aims to provide income and capital growth.</p>
            <p>It invests in global bonds.<span class="mod-ui-show-more__link">More ▼</span></p>
            <div class="mod-ui-show-more"><p>hidden toggle text</p></div>
          </div>
        </div>
        <table class="mod-ui-table">
          <tr><th>Morningstar category</th><td>Global Bond</td></tr>
          <tr><th>Launch date</th><td>15 Mar 2012</td></tr>
        </table>
        <table class="mod-ui-table">
          <tr><th>Ongoing charge</th><td>1.25% as of 2024</td></tr>
        </table>
        <div class="mod-diversification__column" data-mod-section="Region">
          <table class="mod-ui-table">
            <tr><td><span class="mod-ui-table__cell--colored__wrapper">Americas</span></td><td>55.10%</td></tr>
            <tr><td><span class="mod-ui-table__cell--colored__wrapper">Europe</span></td><td>30.00%</td></tr>
          </table>
        </div>
      </body></html>"#;

    #[test]
    fn test_parse_tearsheet() {
        let data = TearsheetData::parse(TEARSHEET);
        assert_eq!(
            data.investment_objective,
            "The Fund aims to provide income and capital growth. It invests in global bonds."
        );
        assert_eq!(data.morningstar_category, "Global Bond");
        assert_eq!(data.launch_date, "15 Mar 2012");
        assert_eq!(data.ongoing_charge, "1.25%");
        assert_eq!(data.geographic, "Global");
    }

    #[test]
    fn test_dominant_region() {
        let html = r#"<div class="mod-diversification__column" data-mod-section="Region">
            <table class="mod-ui-table">
              <tr><td><span class="mod-ui-table__cell--colored__wrapper">Asia</span></td><td>91.5%</td></tr>
              <tr><td><span class="mod-ui-table__cell--colored__wrapper">Other</span></td><td>8.5%</td></tr>
            </table></div>"#;
        assert_eq!(TearsheetData::parse(html).geographic, "Asia");
    }

    #[test]
    fn test_missing_sections_are_blank() {
        let data = TearsheetData::parse("<html><body><p>Not found</p></body></html>");
        assert_eq!(data, TearsheetData::default());
    }

    #[test]
    fn test_ongoing_charge_without_percentage() {
        let html = r#"<table class="mod-ui-table"><tr><th>Ongoing charge</th><td>n/a</td></tr></table>"#;
        assert_eq!(TearsheetData::parse(html).ongoing_charge, "n/a");
    }
}

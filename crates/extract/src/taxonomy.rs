use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::error::TaxonomyError;
use crate::normalizer::normalize_plurals;

/// A standard risk category and the phrases that identify it
#[derive(Debug, Clone, Serialize)]
pub struct RiskCategory {
    pub name: String,
    pub keywords: Vec<String>,
    /// Short description used for semantic matching
    #[serde(skip)]
    pub definition: String,
}

/// A keyword prepared for matching
#[derive(Debug, Clone)]
pub struct KeywordEntry {
    pub text: String,
    pub plural_normalized: String,
    pub tokens: HashSet<String>,
    category: usize,
}

/// Immutable mapping of standard risk names to keyword variants.
///
/// Every keyword belongs to exactly one category; the builder rejects
/// collisions instead of letting a later category silently win.
#[derive(Debug, Clone)]
pub struct RiskTaxonomy {
    categories: Vec<RiskCategory>,
    keywords: Vec<KeywordEntry>,
    by_keyword: HashMap<String, usize>,
}

impl RiskTaxonomy {
    pub fn builder() -> TaxonomyBuilder {
        TaxonomyBuilder::default()
    }

    /// Parse a JSON object of `{"Standard Name": ["keyword", ...]}`.
    ///
    /// Categories keep their file order, which is the taxonomy-order tie-break.
    pub fn from_json_str(json: &str) -> Result<Self, TaxonomyError> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;

        let mut builder = Self::builder();
        for (name, keywords) in raw {
            let keywords: Vec<String> = serde_json::from_value(keywords)?;
            builder = builder.category(name, keywords);
        }
        builder.build()
    }

    pub fn from_file(path: &Path) -> Result<Self, TaxonomyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// The built-in fund disclosure taxonomy
    pub fn fund_risks() -> Self {
        let mut builder = Self::builder();
        for (name, keywords) in FUND_RISKS {
            let definition = FUND_RISK_DEFINITIONS
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, d)| d.to_string())
                .unwrap_or_else(|| name.to_lowercase());
            builder = builder.category_with_definition(*name, definition, keywords.iter().copied());
        }
        // The built-in table is checked by tests; a collision there is a programming error.
        builder
            .build()
            .unwrap_or_else(|e| panic!("built-in fund risk taxonomy is invalid: {e}"))
    }

    pub fn categories(&self) -> &[RiskCategory] {
        &self.categories
    }

    /// Keywords in taxonomy order (category order, then declaration order)
    pub fn keywords(&self) -> &[KeywordEntry] {
        &self.keywords
    }

    pub fn category_of(&self, keyword: &KeywordEntry) -> &RiskCategory {
        &self.categories[keyword.category]
    }

    /// Standard name for an exact keyword
    pub fn lookup(&self, keyword: &str) -> Option<&str> {
        self.by_keyword
            .get(&keyword.trim().to_lowercase())
            .map(|&idx| self.categories[idx].name.as_str())
    }

    /// Sorted standard risk names
    pub fn standard_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Human-readable dump of every category and its keywords
    pub fn export_text(&self) -> String {
        let mut out = String::from("# Master Risk Dictionary\n");
        out.push_str("# Standardized risk categories and their keyword variants\n\n");

        for category in &self.categories {
            out.push_str(&format!("## {}\n", category.name));
            out.push_str(&format!("Keywords: {}\n\n", category.keywords.join(", ")));
        }

        out.push_str(&format!("\nTotal Categories: {}\n", self.categories.len()));
        out.push_str(&format!("Total Keywords: {}\n", self.keywords.len()));
        out
    }
}

#[derive(Debug, Default)]
pub struct TaxonomyBuilder {
    categories: Vec<RiskCategory>,
}

impl TaxonomyBuilder {
    pub fn category<I, S>(self, name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let definition = name.to_lowercase();
        self.category_with_definition(name, definition, keywords)
    }

    pub fn category_with_definition<I, S>(
        mut self,
        name: impl Into<String>,
        definition: impl Into<String>,
        keywords: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.push(RiskCategory {
            name: name.into().trim().to_string(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            definition: definition.into(),
        });
        self
    }

    pub fn build(self) -> Result<RiskTaxonomy, TaxonomyError> {
        let mut categories = Vec::with_capacity(self.categories.len());
        let mut keywords = Vec::new();
        let mut by_keyword: HashMap<String, usize> = HashMap::new();
        let mut names = HashSet::new();

        for (idx, mut category) in self.categories.into_iter().enumerate() {
            if !names.insert(category.name.clone()) {
                return Err(TaxonomyError::DuplicateCategory(category.name));
            }

            let mut own = Vec::new();
            for raw in &category.keywords {
                let keyword = raw.trim().to_lowercase();
                if keyword.is_empty() {
                    continue;
                }

                match by_keyword.get(&keyword) {
                    // Repeated inside the same category
                    Some(&owner) if owner == idx => continue,
                    Some(&owner) => {
                        return Err(TaxonomyError::DuplicateKeyword {
                            keyword,
                            first: categories
                                .get(owner)
                                .map(|c: &RiskCategory| c.name.clone())
                                .unwrap_or_default(),
                            second: category.name,
                        });
                    }
                    None => {}
                }

                by_keyword.insert(keyword.clone(), idx);
                keywords.push(KeywordEntry {
                    plural_normalized: normalize_plurals(&keyword),
                    tokens: keyword.split_whitespace().map(str::to_string).collect(),
                    text: keyword.clone(),
                    category: idx,
                });
                own.push(keyword);
            }

            if own.is_empty() {
                return Err(TaxonomyError::EmptyCategory(category.name));
            }

            category.keywords = own;
            categories.push(category);
        }

        Ok(RiskTaxonomy {
            categories,
            keywords,
            by_keyword,
        })
    }
}

const FUND_RISKS: &[(&str, &[&str])] = &[
    // Market & asset class
    ("Market Risk", &["market risk", "market risks", "market volatility", "market movements", "market downturns", "market stress"]),
    ("Equity Risk", &["equity risk", "equity risks", "stock risk", "share price risk", "share risk"]),
    ("Interest Rate Risk", &["interest rate risk", "interest rate risks", "rate risk", "ir risk", "duration risk", "yield curve risk"]),
    ("Credit Risk", &["credit risk", "credit risks", "issuer risk", "credit default", "credit quality"]),
    ("Sovereign Risk", &["sovereign risk", "sovereign risks", "government risk", "country risk", "government default"]),
    ("Currency Risk", &["currency risk", "currency risks", "fx risk", "foreign exchange risk", "exchange rate risk", "currency exposure"]),
    ("Commodity Risk", &["commodity risk", "commodity risks", "commodity price risk"]),
    // Liquidity & funding
    ("Liquidity Risk", &["liquidity risk", "liquidity risks", "illiquidity risk", "illiquidity", "lack of liquidity", "limited liquidity"]),
    ("Redemption Risk", &["redemption risk", "redemption risks", "early redemption", "redemption delay"]),
    ("Funding Liquidity Risk", &["funding liquidity risk", "funding risk", "liquidity funding risk"]),
    // Concentration & correlation
    ("Concentration Risk", &["concentration risk", "concentration risks", "single issuer risk", "geographic concentration", "lack of diversification", "concentrated exposure"]),
    ("Correlation Risk", &["correlation risk", "correlation risks", "correlation breakdown"]),
    ("Sector Concentration Risk", &["sector risk", "sector concentration", "industry risk"]),
    // Investment strategy
    ("Style Risk", &["style risk", "growth risk", "value risk", "investment style risk"]),
    ("Volatility Risk", &["volatility risk", "volatility risks", "price volatility", "higher volatility"]),
    ("Derivatives Risk", &["derivatives risk", "derivative risk", "derivatives risks"]),
    ("Hedging Risk", &["hedging risk", "hedging risks", "hedge risk"]),
    ("Leverage Risk", &["leverage risk", "leveraging risk", "gearing risk"]),
    ("Short Selling Risk", &["short selling risk", "shorting risk", "short position risk"]),
    // Counterparty & operational
    ("Counterparty Risk", &["counterparty risk", "counterparty risks", "counterparty default"]),
    ("Operational Risk", &["operational risk", "operational risks", "operational failure"]),
    ("Management Risk", &["management risk", "manager risk", "fund manager risk"]),
    ("Model Risk", &["model risk", "model risks", "quantitative model risk"]),
    // Economic & macro
    ("Inflation Risk", &["inflation risk", "inflation risks", "inflationary risk"]),
    ("Deflation Risk", &["deflation risk", "deflation risks", "deflationary risk"]),
    ("Recession Risk", &["recession risk", "economic downturn risk", "economic risk"]),
    // Regulatory & legal
    ("Political Risk", &["political risk", "political risks", "geopolitical risk"]),
    ("Regulatory Risk", &["regulatory risk", "regulatory risks", "legal risk", "compliance risk"]),
    ("Expropriation Risk", &["expropriation risk", "nationalization risk", "confiscation risk"]),
    // Specialized products
    ("High Yield Risk", &["high yield risk", "junk bond risk", "sub investment grade risk", "below investment grade"]),
    ("Perpetual Bond Risk", &["perpetual bond risk", "perpetual bonds risk", "perpetual securities risk", "hybrid securities risk"]),
    ("Complex Product Risk", &["complex product risk", "structured product risk", "complexity risk"]),
    ("Synthetic Risk", &["synthetic risk", "replication risk", "tracking risk"]),
    ("Default Risk", &["default risk", "issuer default", "bond default", "payment default", "unable to make payments"]),
    ("ELN Risk", &["eln risk", "equity linked note risk", "equity-linked note risk", "structured note risk"]),
    ("Prepayment Risk", &["prepayment risk", "prepayment and extension risk", "early repayment risk", "call risk", "extension risk"]),
    // ESG & sustainability
    ("ESG Risk", &["esg risk", "sustainability risk", "environmental risk", "social risk", "governance risk"]),
    ("Climate Risk", &["climate risk", "climate change risk"]),
    // Emerging markets
    ("Emerging Market Risk", &["emerging market risk", "emerging markets risk", "developing market risk"]),
    ("Capital Controls Risk", &["capital controls risk", "capital restriction risk"]),
    // Other
    ("Reputation Risk", &["reputation risk", "reputational risk"]),
    ("Technology Risk", &["technology risk", "cyber risk", "it risk"]),
    ("Reinvestment Risk", &["reinvestment risk"]),
];

const FUND_RISK_DEFINITIONS: &[(&str, &str)] = &[
    ("Market Risk", "market movements volatility financial market conditions"),
    ("Credit Risk", "issuer default credit quality financial health deterioration"),
    ("Currency Risk", "exchange rate fluctuations foreign currency exposure"),
    ("Interest Rate Risk", "interest rate changes bond value duration"),
    ("Liquidity Risk", "difficulty selling assets marketability trading"),
    ("Equity Risk", "stock share price volatility company performance"),
    ("Derivatives Risk", "derivative instruments complex financial products"),
    ("Leverage Risk", "borrowing amplified exposure financial leverage"),
    ("Concentration Risk", "single issuer geographic sector concentration"),
    ("Counterparty Risk", "counterparty default inability to meet obligations"),
    ("High Yield Risk", "below investment grade junk bonds credit quality"),
    ("Perpetual Bond Risk", "perpetual securities no maturity date call risk"),
    ("Emerging Market Risk", "developing markets political instability"),
    ("Volatility Risk", "price fluctuations market volatility"),
    ("Default Risk", "issuer inability to pay debt obligations"),
    ("ELN Risk", "equity linked notes structured products"),
    ("Prepayment Risk", "early repayment extension callable securities"),
];

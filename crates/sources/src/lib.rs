//! Fund data sources: Morningstar services, the FT tearsheet and PHS documents.

pub mod error;
pub mod fetcher;
pub mod ft;
pub mod http;
pub mod morningstar;
pub mod phs;
pub mod record;
pub mod retry;
pub mod settings;
pub mod xml;

pub use error::SourceError;
pub use fetcher::FundFetcher;
pub use ft::{FtScraper, TearsheetData};
pub use http::HttpClient;
pub use morningstar::{BasicInfo, MorningstarClient};
pub use phs::{PhsAnalysis, PhsAnalyzer};
pub use record::FundRecord;
pub use retry::{RetryPolicy, RetrySettings};
pub use settings::{Endpoints, FetchSettings};

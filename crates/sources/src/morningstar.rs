use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::SourceError;
use crate::http::HttpClient;
use crate::settings::FetchSettings;
use crate::xml::XmlNode;

const PHS_DOCUMENT_TYPE: &str = "77";
const FACTSHEET_DOCUMENT_TYPE: &str = "52";

/// Morningstar category group fragments, checked in order
const ASSET_MAPPING: &[(&str, &str)] = &[
    ("allocation", "Balanced Fund"),
    ("equity", "Equity Fund"),
    ("fixed income", "Fixed Income Fund"),
    ("commodity", "Commodity Fund"),
    ("cash equivalent", "Cash Equivalent Fund"),
    ("alternative", "Alternative Fund"),
];

const RISK_CLASSIFICATION: &[(&str, &str)] = &[
    ("Cash Equivalent Fund", "Low"),
    ("Fixed Income Fund", "Low to Medium"),
    ("Balanced Fund", "Medium to High"),
    ("Equity Fund", "High"),
    ("Commodity Fund", "High"),
    ("Alternative Fund", "High"),
];

/// Fields taken from the share-class basic info service
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BasicInfo {
    pub fund_house: String,
    pub fund_name: String,
    pub asset_type: String,
    pub risk_classification: String,
}

/// Standard asset label for a Morningstar category group; blank when unknown
pub fn normalize_asset_type(raw: &str) -> &'static str {
    let lowered = raw.to_lowercase();
    ASSET_MAPPING
        .iter()
        .find(|(fragment, _)| lowered.contains(fragment))
        .map_or("", |(_, asset)| asset)
}

/// House risk rating for a standard asset label; blank when unknown
pub fn risk_classification(asset_type: &str) -> &'static str {
    RISK_CLASSIFICATION
        .iter()
        .find(|(asset, _)| asset.eq_ignore_ascii_case(asset_type))
        .map_or("", |(_, rating)| rating)
}

/// Retail/AI status from the ISIN's country prefix
pub fn retail_ai_classification(isin: &str) -> &'static str {
    let isin = isin.to_uppercase();
    if isin.starts_with("LU") || isin.starts_with("IE") {
        "Recognised"
    } else if isin.starts_with("SG") {
        "Authorised"
    } else {
        ""
    }
}

pub fn parse_basic_info(xml: &str) -> Result<BasicInfo, SourceError> {
    let root = XmlNode::parse(xml)?;
    let field = |name: &str| root.find_text(name).unwrap_or_default().trim().to_string();

    let asset_type = normalize_asset_type(&field("MorningstarCategoryGroupName")).to_string();
    Ok(BasicInfo {
        fund_house: field("AdvisoryCompanyName"),
        fund_name: field("FundLegalName"),
        risk_classification: risk_classification(&asset_type).to_string(),
        asset_type,
    })
}

/// Newest English PHS in a document-service response, Singapore market
/// preferred on equal dates
pub fn parse_latest_phs(xml: &str) -> Result<Option<String>, SourceError> {
    let root = XmlNode::parse(xml)?;

    let mut best: Option<(NaiveDate, bool, String)> = None;
    for document in root.descendants("Document") {
        let is_phs = document
            .descendants("DocumentType")
            .iter()
            .any(|t| t.attribute("DocumentTypeId") == Some(PHS_DOCUMENT_TYPE));
        if !is_phs || document.find_text("Language") != Some("English") {
            continue;
        }

        let (Some(date), Some(url)) = (document.find_text("DocumentDate"), document.find_text("ViewUrl"))
        else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            continue;
        };
        let singapore = document
            .find_text("Market")
            .is_some_and(|m| m.eq_ignore_ascii_case("singapore"));

        let newer = best
            .as_ref()
            .is_none_or(|(d, s, _)| (date, singapore) > (*d, *s));
        if newer {
            best = Some((date, singapore, url.to_string()));
        }
    }

    Ok(best.map(|(_, _, url)| url))
}

/// Morningstar basic info and document services
#[derive(Clone)]
pub struct MorningstarClient {
    http: HttpClient,
    settings: FetchSettings,
}

impl MorningstarClient {
    pub fn new(http: HttpClient, settings: FetchSettings) -> Self {
        Self { http, settings }
    }

    pub fn basic_info_url(&self, isin: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.settings.endpoints.basic_info)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(isin);
        url.query_pairs_mut()
            .append_pair("accesscode", &self.settings.access_code);
        Ok(url)
    }

    pub fn document_url(&self, isin: &str, document_type: &str) -> Result<Url, SourceError> {
        let url = Url::parse_with_params(
            &self.settings.endpoints.documents,
            &[
                ("type", "customalldocnew"),
                ("investmenttype", "1"),
                ("clientid", self.settings.document_client_id.as_str()),
                ("key", self.settings.document_key.as_str()),
                ("ISIN", isin),
                ("documenttype", document_type),
            ],
        )?;
        Ok(url)
    }

    /// Link to the factsheet document listing; blank for an empty ISIN
    pub fn factsheet_url(&self, isin: &str) -> String {
        if isin.is_empty() {
            return String::new();
        }
        self.document_url(isin, FACTSHEET_DOCUMENT_TYPE)
            .map(|u| u.to_string())
            .unwrap_or_default()
    }

    pub async fn fetch_basic_info(&self, isin: &str) -> Result<BasicInfo, SourceError> {
        let url = self.basic_info_url(isin)?;
        let xml = self.http.get_text(url.as_str()).await?;
        let info = parse_basic_info(&xml)?;
        debug!(isin, fund = %info.fund_name, asset = %info.asset_type, "Fetched basic info");
        Ok(info)
    }

    pub async fn fetch_phs_link(&self, isin: &str) -> Result<Option<String>, SourceError> {
        let url = self.document_url(isin, PHS_DOCUMENT_TYPE)?;
        let xml = self.http.get_text(url.as_str()).await?;
        parse_latest_phs(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BASIC_INFO: &str = r#"<?xml version="1.0" encoding="utf-8"?>
        <response xmlns:ms="http://www.morningstar.com">
          <data>
            <api>
              <ms:AdvisoryCompanyName>Example Asset Management</ms:AdvisoryCompanyName>
              <ms:FundLegalName>Example Global Bond Fund A Acc</ms:FundLegalName>
              <ms:MorningstarCategoryGroupName>Fixed Income</ms:MorningstarCategoryGroupName>
            </api>
          </data>
        </response>"#;

    const DOCUMENTS: &str = r#"<Documents>
        <Document>
          <DocumentType DocumentTypeId="77">Product Highlights Sheet</DocumentType>
          <Language>English</Language><Market>Hong Kong</Market>
          <DocumentDate>2024-03-01</DocumentDate><ViewUrl>http://docs/hk-march</ViewUrl>
        </Document>
        <Document>
          <DocumentType DocumentTypeId="77">Product Highlights Sheet</DocumentType>
          <Language>English</Language><Market>Singapore</Market>
          <DocumentDate>2024-03-01</DocumentDate><ViewUrl>http://docs/sg-march</ViewUrl>
        </Document>
        <Document>
          <DocumentType DocumentTypeId="77">Product Highlights Sheet</DocumentType>
          <Language>Chinese</Language><Market>Singapore</Market>
          <DocumentDate>2024-06-01</DocumentDate><ViewUrl>http://docs/zh-june</ViewUrl>
        </Document>
        <Document>
          <DocumentType DocumentTypeId="52">Factsheet</DocumentType>
          <Language>English</Language>
          <DocumentDate>2024-07-01</DocumentDate><ViewUrl>http://docs/factsheet</ViewUrl>
        </Document>
        <Document>
          <DocumentType DocumentTypeId="77">Product Highlights Sheet</DocumentType>
          <Language>English</Language>
          <DocumentDate>01/08/2024</DocumentDate><ViewUrl>http://docs/bad-date</ViewUrl>
        </Document>
      </Documents>"#;

    #[test]
    fn test_asset_and_risk_mapping() {
        assert_eq!(normalize_asset_type("Fixed Income"), "Fixed Income Fund");
        assert_eq!(normalize_asset_type("Allocation"), "Balanced Fund");
        assert_eq!(normalize_asset_type("Equity"), "Equity Fund");
        assert_eq!(normalize_asset_type("Property"), "");
        assert_eq!(normalize_asset_type(""), "");

        assert_eq!(risk_classification("Fixed Income Fund"), "Low to Medium");
        assert_eq!(risk_classification("balanced fund"), "Medium to High");
        assert_eq!(risk_classification(""), "");
    }

    #[test]
    fn test_retail_ai_classification() {
        assert_eq!(retail_ai_classification("LU0123456789"), "Recognised");
        assert_eq!(retail_ai_classification("ie00B4L5Y983"), "Recognised");
        assert_eq!(retail_ai_classification("SG9999012345"), "Authorised");
        assert_eq!(retail_ai_classification("US0378331005"), "");
        assert_eq!(retail_ai_classification(""), "");
    }

    #[test]
    fn test_parse_basic_info() {
        let info = parse_basic_info(BASIC_INFO).unwrap();
        assert_eq!(info.fund_house, "Example Asset Management");
        assert_eq!(info.fund_name, "Example Global Bond Fund A Acc");
        assert_eq!(info.asset_type, "Fixed Income Fund");
        assert_eq!(info.risk_classification, "Low to Medium");

        let empty = parse_basic_info("<response/>").unwrap();
        assert_eq!(empty, BasicInfo::default());
    }

    #[test]
    fn test_latest_phs_prefers_singapore_on_tie() {
        assert_eq!(
            parse_latest_phs(DOCUMENTS).unwrap().as_deref(),
            Some("http://docs/sg-march")
        );
        assert_eq!(parse_latest_phs("<Documents/>").unwrap(), None);
    }

    fn client(server: &MockServer) -> MorningstarClient {
        let settings = FetchSettings {
            access_code: "secret".to_string(),
            document_client_id: "client".to_string(),
            document_key: "key".to_string(),
            endpoints: crate::settings::Endpoints {
                basic_info: format!("{}/basic/isin", server.uri()),
                documents: format!("{}/services.aspx", server.uri()),
                tearsheet: format!("{}/tearsheet", server.uri()),
            },
            ..Default::default()
        };
        let http = HttpClient::new(&settings, RetryPolicy::new(0, 1, 1)).unwrap();
        MorningstarClient::new(http, settings)
    }

    #[tokio::test]
    async fn test_fetch_basic_info_and_phs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/basic/isin/LU0123456789"))
            .and(query_param("accesscode", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BASIC_INFO))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/services.aspx"))
            .and(query_param("documenttype", "77"))
            .and(query_param("ISIN", "LU0123456789"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DOCUMENTS))
            .mount(&server)
            .await;

        let client = client(&server);
        let info = client.fetch_basic_info("LU0123456789").await.unwrap();
        assert_eq!(info.asset_type, "Fixed Income Fund");

        let link = client.fetch_phs_link("LU0123456789").await.unwrap();
        assert_eq!(link.as_deref(), Some("http://docs/sg-march"));

        let factsheet = client.factsheet_url("LU0123456789");
        assert!(factsheet.contains("documenttype=52"));
        assert!(factsheet.contains("ISIN=LU0123456789"));
        assert_eq!(client.factsheet_url(""), "");
    }
}

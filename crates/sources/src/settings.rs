use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything the fetchers need to reach the three data sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Morningstar web-service access code
    pub access_code: String,
    pub verify_ssl: bool,
    pub request_timeout_secs: u64,
    /// Pause between funds in a batch
    pub delay_secs: f64,
    /// Credentials for the Morningstar document service
    pub document_client_id: String,
    pub document_key: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub basic_info: String,
    pub documents: String,
    pub tearsheet: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            access_code: String::new(),
            verify_ssl: false,
            request_timeout_secs: 30,
            delay_secs: 2.0,
            document_client_id: String::new(),
            document_key: String::new(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            basic_info: "https://api.morningstar.com/v2/service/mf/FundShareClassBasicInfo/isin".to_string(),
            documents: "http://doc.morningstar.com/services.aspx".to_string(),
            tearsheet: "https://markets.ft.com/data/funds/tearsheet/summary".to_string(),
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs.max(0.0))
    }
}

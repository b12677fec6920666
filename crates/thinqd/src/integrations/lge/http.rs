//! HTTP transport for the ThinQ V2 service API.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use tracing::debug;
use tracing::trace;

use super::LgeConfig;
use crate::thinq::ControlCommand;
use crate::thinq::Snapshot;
use crate::thinq::ThinqClient;
use crate::thinq::ThinqError;

const RESULT_OK: &str = "0000";
const APP_KEY: &str = "LGAO221A02";
const SERVICE_CODE: &str = "SVC202";

/// Envelope every service API response comes in
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "resultCode")]
    result_code: String,

    #[serde(default)]
    result: Value,
}

impl ApiResponse {
    fn into_result(self) -> Result<Value, ThinqError> {
        if self.result_code != RESULT_OK {
            return Err(ThinqError::Api(format!("result code {}", self.result_code)));
        }
        Ok(self.result)
    }
}

/// Status object of a device detail response; `None` until the device has
/// reported anything.
fn snapshot_from(result: Value) -> Option<Snapshot> {
    match result {
        Value::Object(mut device) => match device.remove("snapshot") {
            Some(Value::Object(snapshot)) if !snapshot.is_empty() => Some(snapshot),
            _ => None,
        },
        _ => None,
    }
}

/// ThinQ client speaking to the V2 service API with a pre-issued token.
///
/// Only V2 `control-sync` commands are supported.
pub struct HttpClient {
    http: reqwest::Client,
    api_base: String,
}

impl HttpClient {
    pub fn new(config: &LgeConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static(APP_KEY));
        headers.insert("x-service-code", HeaderValue::from_static(SERVICE_CODE));
        headers.insert("x-thinq-app-type", HeaderValue::from_static("NAPP"));
        headers.insert("x-thinq-app-os", HeaderValue::from_static("ANDROID"));
        headers.insert(
            "x-emp-token",
            HeaderValue::from_str(&config.access_token).context("Invalid access token")?,
        );
        headers.insert(
            "x-country-code",
            HeaderValue::from_str(&config.country).context("Invalid country code")?,
        );
        headers.insert(
            "x-language-code",
            HeaderValue::from_str(&config.language).context("Invalid language code")?,
        );
        if let Some(client_id) = &config.client_id {
            headers.insert(
                "x-client-id",
                HeaderValue::from_str(client_id).context("Invalid client id")?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ThinqClient for HttpClient {
    async fn control(&self, device_id: &str, command: ControlCommand) -> Result<(), ThinqError> {
        let ControlCommand::V2 {
            ctrl_key,
            command,
            data_key,
            data_value,
        } = command
        else {
            return Err(ThinqError::Unsupported(
                "V1 control over the V2 service API".to_string(),
            ));
        };

        let url = format!("{}/service/devices/{}/control-sync", self.api_base, device_id);
        let body = json!({
            "ctrlKey": ctrl_key,
            "command": command,
            "dataKey": data_key,
            "dataValue": data_value,
        });
        debug!(url = %url, body = %body, "sending control command");

        self.http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ApiResponse>()
            .await?
            .into_result()?;
        Ok(())
    }

    async fn poll(&self, device_id: &str) -> Result<Option<Snapshot>, ThinqError> {
        let url = format!("{}/service/devices/{}", self.api_base, device_id);
        trace!(url = %url, "polling device");

        let result = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<ApiResponse>()
            .await?
            .into_result()?;
        Ok(snapshot_from(result))
    }
}

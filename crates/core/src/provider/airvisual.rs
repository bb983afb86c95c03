use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::domain::location::LocationQuery;
use crate::domain::reading::Reading;
use crate::errors::FetchError;
use crate::provider::ReadingProvider;

/// IQAir AirVisual `city` endpoint client. One GET per lookup, no retries.
#[derive(Clone, Debug)]
pub struct AirVisualClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct CityResponse {
    status: String,
    data: Option<CityData>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CityData {
    Found { current: CurrentConditions },
    Failure { message: String },
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    pollution: Pollution,
}

#[derive(Debug, Deserialize)]
struct Pollution {
    aqius: u32,
}

impl AirVisualClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| FetchError::Transport(error.to_string()))?;
        Ok(Self::with_client(client, &config.base_url, config.api_key.clone()))
    }

    pub fn with_client(client: Client, base_url: &str, api_key: SecretString) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_owned(), api_key }
    }

    fn city_url(&self) -> String {
        format!("{}/city", self.base_url)
    }
}

#[async_trait]
impl ReadingProvider for AirVisualClient {
    async fn fetch_reading(&self, query: &LocationQuery) -> Result<Reading, FetchError> {
        debug!(
            event_name = "provider.airvisual.request",
            city = query.city(),
            state = query.state(),
            country = query.country(),
            "requesting city reading"
        );

        let response = self
            .client
            .get(self.city_url())
            .query(&[
                ("city", query.city()),
                ("state", query.state()),
                ("country", query.country()),
                ("key", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(|error| FetchError::Transport(error.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| FetchError::Transport(error.without_url().to_string()))?;

        if !status.is_success() {
            warn!(
                event_name = "provider.airvisual.http_error",
                status = %status,
                city = query.city(),
                "air quality provider returned an error status"
            );
            // AirVisual reports unknown cities as 4xx with a JSON failure body.
            if let Err(FetchError::Provider(message)) = parse_city_response(&body) {
                return Err(FetchError::Provider(message));
            }
            return Err(FetchError::Status { status: status.as_u16() });
        }

        parse_city_response(&body)
    }
}

fn parse_city_response(body: &[u8]) -> Result<Reading, FetchError> {
    let payload: CityResponse =
        serde_json::from_slice(body).map_err(|error| FetchError::Decode(error.to_string()))?;

    match (payload.status.as_str(), payload.data) {
        ("success", Some(CityData::Found { current })) => {
            Ok(Reading::new(current.pollution.aqius))
        }
        (_, Some(CityData::Failure { message })) => Err(FetchError::Provider(message)),
        (status, _) => Err(FetchError::Provider(format!("unexpected status `{status}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_city_response, AirVisualClient};
    use crate::domain::reading::Reading;
    use crate::errors::FetchError;

    #[test]
    fn parses_us_aqi_from_success_payload() {
        let body = br#"{
            "status": "success",
            "data": {
                "city": "Los Angeles",
                "state": "California",
                "country": "USA",
                "current": {
                    "weather": {"tp": 21},
                    "pollution": {"ts": "2024-01-01T00:00:00.000Z", "aqius": 87, "mainus": "p2"}
                }
            }
        }"#;

        assert_eq!(parse_city_response(body), Ok(Reading::new(87)));
    }

    #[test]
    fn surfaces_provider_failure_message() {
        let body = br#"{"status":"fail","data":{"message":"city_not_found"}}"#;

        assert_eq!(
            parse_city_response(body),
            Err(FetchError::Provider("city_not_found".to_owned()))
        );
    }

    #[test]
    fn rejects_non_json_payload() {
        let result = parse_city_response(b"<html>bad gateway</html>");
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = AirVisualClient::with_client(
            reqwest::Client::new(),
            "https://api.airvisual.com/v2/",
            "key".to_owned().into(),
        );
        assert_eq!(client.city_url(), "https://api.airvisual.com/v2/city");
    }
}

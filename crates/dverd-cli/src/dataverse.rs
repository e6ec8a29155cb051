use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Serialize;

use dverd_core::payload::{OptionSetPayload, RelationshipPayload, TablePayload};
use dverd_core::{ClientError, MetadataClient};

const API_SEGMENT: &str = "api/data/v9.2";
const MAX_RATE_LIMIT_RETRIES: u32 = 3;
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Dataverse Web API metadata client over blocking HTTP with bearer-token
/// auth. Rate-limit responses are retried in place, honoring Retry-After.
pub struct DataverseClient {
    http: Client,
    base: String,
    token: String,
}

impl DataverseClient {
    pub fn new(url: &str, token: &str) -> Result<Self, String> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(DataverseClient {
            http,
            base: format!("{}/{}", url.trim_end_matches('/'), API_SEGMENT),
            token: token.to_string(),
        })
    }

    fn execute(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, ClientError> {
        for attempt in 1..=MAX_RATE_LIMIT_RETRIES {
            let response = build()
                .bearer_auth(&self.token)
                .header("OData-MaxVersion", "4.0")
                .header("OData-Version", "4.0")
                .header("Accept", "application/json")
                .send()
                .map_err(|e| ClientError::Transport(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }
            if attempt == MAX_RATE_LIMIT_RETRIES {
                break;
            }

            let wait = retry_after_seconds(&response).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            log::warn!(
                "rate limited; retrying in {}s (attempt {}/{})",
                wait,
                attempt,
                MAX_RATE_LIMIT_RETRIES
            );
            thread::sleep(Duration::from_secs(wait));
        }
        Err(ClientError::RateLimitExhausted)
    }

    /// Find one object in a metadata collection by exact SchemaName.
    fn find_by_schema_name(
        &self,
        collection: &str,
        name: &str,
    ) -> Result<Option<String>, ClientError> {
        let url = format!(
            "{}/{}?$select=MetadataId,SchemaName&$filter=SchemaName eq '{}'",
            self.base, collection, name
        );
        let response = self.execute(|| self.http.get(&url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(http_error(status, response));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(body["value"]
            .as_array()
            .and_then(|v| v.first())
            .and_then(|entry| entry["MetadataId"].as_str())
            .map(String::from))
    }

    fn create(&self, collection: &str, payload: &impl Serialize) -> Result<String, ClientError> {
        let url = format!("{}/{}", self.base, collection);
        let response = self.execute(|| self.http.post(&url).json(payload))?;
        let status = response.status();

        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            return Err(ClientError::Conflict);
        }
        if !status.is_success() {
            return Err(http_error(status, response));
        }

        // The identifier of the new object comes back in the OData-EntityId
        // header, as a keyed collection URL.
        response
            .headers()
            .get("OData-EntityId")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_entity_id)
            .ok_or_else(|| ClientError::Transport("response missing OData-EntityId".to_string()))
    }
}

impl MetadataClient for DataverseClient {
    fn find_option_set(&mut self, name: &str) -> Result<Option<String>, ClientError> {
        // Global option sets support keyed lookup by name.
        let url = format!(
            "{}/GlobalOptionSetDefinitions(Name='{}')?$select=MetadataId",
            self.base, name
        );
        let response = self.execute(|| self.http.get(&url))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(http_error(status, response));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(body["MetadataId"].as_str().map(String::from))
    }

    fn create_option_set(&mut self, payload: &OptionSetPayload) -> Result<String, ClientError> {
        self.create("GlobalOptionSetDefinitions", payload)
    }

    fn find_table(&mut self, schema_name: &str) -> Result<Option<String>, ClientError> {
        self.find_by_schema_name("EntityDefinitions", schema_name)
    }

    fn create_table(&mut self, payload: &TablePayload) -> Result<String, ClientError> {
        self.create("EntityDefinitions", payload)
    }

    fn find_relationship(&mut self, schema_name: &str) -> Result<Option<String>, ClientError> {
        self.find_by_schema_name("RelationshipDefinitions", schema_name)
    }

    fn create_relationship(
        &mut self,
        payload: &RelationshipPayload,
    ) -> Result<String, ClientError> {
        self.create("RelationshipDefinitions", payload)
    }
}

fn retry_after_seconds(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("Retry-After")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn http_error(status: StatusCode, response: Response) -> ClientError {
    ClientError::Http {
        status: status.as_u16(),
        message: response.text().unwrap_or_default(),
    }
}

/// Extract the key from a keyed collection URL, e.g.
/// `[...]/EntityDefinitions(70816501-edb9-4740-a16c-6a5efbc05d84)`.
fn parse_entity_id(header: &str) -> Option<String> {
    let start = header.rfind('(')?;
    let end = header.rfind(')')?;
    if start + 1 >= end {
        return None;
    }
    Some(header[start + 1..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_from_keyed_url() {
        let header = "https://example.crm.dynamics.com/api/data/v9.2/EntityDefinitions(70816501-edb9-4740-a16c-6a5efbc05d84)";
        assert_eq!(
            parse_entity_id(header).as_deref(),
            Some("70816501-edb9-4740-a16c-6a5efbc05d84")
        );
    }

    #[test]
    fn entity_id_missing_key_is_none() {
        assert_eq!(parse_entity_id("no key here"), None);
        assert_eq!(parse_entity_id("empty()"), None);
    }

    #[test]
    fn client_base_url_normalized() {
        let client = DataverseClient::new("https://example.crm.dynamics.com/", "t").unwrap();
        assert_eq!(
            client.base,
            "https://example.crm.dynamics.com/api/data/v9.2"
        );
    }
}

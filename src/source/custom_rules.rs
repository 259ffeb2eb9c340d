//! Organization custom rules fetched from the rules API
//!
//! The API answers with JSON; the archive travels base64-encoded in
//! `fileContentResult.text` and is decoded back to raw gzip bytes here.

use super::{http_agent, CustomRulesSource};
use crate::error::FetchError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::fmt;
use std::io::{Cursor, Read};
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// Default base URL of the rules API
pub const DEFAULT_API_URL: &str = "https://snyk.io/api/v1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomRulesResponse {
    file_content_result: FileContentResult,
}

#[derive(Debug, Deserialize)]
struct FileContentResult {
    text: String,
}

/// Authenticated client for `GET <api>/custom-rules`
pub struct ApiCustomRulesSource {
    base_url: String,
    token: Option<String>,
    agent: Agent,
}

impl fmt::Debug for ApiCustomRulesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCustomRulesSource")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ApiCustomRulesSource {
    /// Create a client for the API at `base_url`
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Option<Duration>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            agent: http_agent(timeout),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/custom-rules", self.base_url.trim_end_matches('/'))
    }
}

impl CustomRulesSource for ApiCustomRulesSource {
    fn fetch(&self, organization_id: Option<&str>) -> Result<Box<dyn Read>, FetchError> {
        let token = self.token.as_deref().ok_or(FetchError::MissingToken)?;
        let url = self.endpoint();

        debug!(
            "Fetching custom rules from {} (org: {})",
            url,
            organization_id.unwrap_or("<default>")
        );

        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json");
        if let Some(org) = organization_id {
            request = request.query("org", org);
        }

        let response = request
            .call()
            .map_err(|e| FetchError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body: CustomRulesResponse =
            serde_json::from_reader(response.into_body().into_reader()).map_err(|e| {
                FetchError::InvalidPayload {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            })?;

        let archive = STANDARD
            .decode(body.file_content_result.text.trim())
            .map_err(|e| FetchError::InvalidPayload {
                url: url.clone(),
                reason: format!("archive is not valid base64: {}", e),
            })?;

        debug!("Received {} bytes of custom rules", archive.len());
        Ok(Box::new(Cursor::new(archive)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn response_body(archive: &[u8]) -> String {
        serde_json::json!({
            "fileContentResult": { "text": STANDARD.encode(archive) }
        })
        .to_string()
    }

    #[test]
    fn fetch_decodes_archive() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/custom-rules")
            .match_query(Matcher::UrlEncoded("org".into(), "acme".into()))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(response_body(b"\x1f\x8b\x08\x00binary\xff"))
            .create();

        let source = ApiCustomRulesSource::new(server.url(), Some("secret".into()), None);
        let mut bytes = Vec::new();
        source
            .fetch(Some("acme"))
            .unwrap()
            .read_to_end(&mut bytes)
            .unwrap();

        assert_eq!(bytes, b"\x1f\x8b\x08\x00binary\xff");
        mock.assert();
    }

    #[test]
    fn trailing_slash_in_base_url() {
        let source = ApiCustomRulesSource::new("http://api.test/v1/", None, None);
        assert_eq!(source.endpoint(), "http://api.test/v1/custom-rules");
    }

    #[test]
    fn missing_token_makes_no_request() {
        let mut server = mockito::Server::new();
        let mock = server.mock("GET", Matcher::Any).expect(0).create();

        let source = ApiCustomRulesSource::new(server.url(), None, None);

        assert!(matches!(source.fetch(Some("acme")), Err(FetchError::MissingToken)));
        mock.assert();
    }

    #[test]
    fn error_status_is_reported() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/custom-rules")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("Unauthorized")
            .create();

        let source = ApiCustomRulesSource::new(server.url(), Some("bad".into()), None);

        assert!(matches!(
            source.fetch(Some("acme")),
            Err(FetchError::Status { status: 401, .. })
        ));
    }

    #[test]
    fn malformed_json_is_invalid_payload() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/custom-rules")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"unexpected": true}"#)
            .create();

        let source = ApiCustomRulesSource::new(server.url(), Some("secret".into()), None);

        assert!(matches!(
            source.fetch(Some("acme")),
            Err(FetchError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn invalid_base64_is_invalid_payload() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/custom-rules")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"fileContentResult": {"text": "not base64!!"}}"#)
            .create();

        let source = ApiCustomRulesSource::new(server.url(), Some("secret".into()), None);

        assert!(matches!(
            source.fetch(Some("acme")),
            Err(FetchError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let source = ApiCustomRulesSource::new("http://api.test", Some("secret".into()), None);
        let rendered = format!("{:?}", source);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("REDACTED"));
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::authenticator::common::TrackStatus;

/// Uniform success/error envelope wrapping every Freebox API response
/// body. The `result` schema is stage-specific, the envelope is not.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FreeboxResponse<T: Clone> {
    pub msg: Option<String>,
    pub success: Option<bool>,
    pub uid: Option<String>,
    pub error_code: Option<String>,
    pub result: Option<T>,
}

impl<T: Clone> FreeboxResponse<T> {
    /// Unwraps the envelope: the payload when `success` is true, the
    /// device-supplied diagnostic verbatim otherwise.
    pub fn into_result(self) -> Result<T, HandshakeError> {
        if !self.success.unwrap_or(false) {
            return Err(HandshakeError::Api {
                error_code: self.error_code.unwrap_or_default(),
                msg: self.msg.unwrap_or_default(),
            });
        }

        self.result.ok_or_else(|| {
            HandshakeError::Transport("response envelope carried no result".to_string())
        })
    }
}

/// Everything that can go wrong between `api_version` discovery and an
/// open session. Each stage fails fast with its own variant, nothing is
/// downgraded on the way up.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("discovery request failed: {status}")]
    Discovery { status: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("api error {error_code}: {msg}")]
    Api { error_code: String, msg: String },

    #[error("authorization has failed, reason: {0}")]
    Authorization(TrackStatus),

    #[error("session rejected ({error_code}): {msg}")]
    Session { error_code: String, msg: String },

    #[error("handshake out of sequence: {0}")]
    State(String),
}

impl From<reqwest::Error> for HandshakeError {
    fn from(e: reqwest::Error) -> Self {
        HandshakeError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for HandshakeError {
    fn from(e: serde_json::Error) -> Self {
        HandshakeError::Transport(format!("malformed response body: {e}"))
    }
}

/// Rejects non 2xx statuses before the envelope is even inspected.
pub async fn read_body(resp: reqwest::Response) -> Result<String, HandshakeError> {
    let status = resp.status();

    if !status.is_success() {
        return Err(HandshakeError::Transport(status.to_string()));
    }

    Ok(resp.text().await?)
}

#[cfg(test)]
mod tests {

    use crate::core::common::{
        http_client_factory::http_client_factory,
        transport::{read_body, FreeboxResponse, HandshakeError},
    };
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn envelope(success: Option<bool>, result: Option<String>) -> FreeboxResponse<String> {
        FreeboxResponse {
            msg: None,
            success,
            uid: None,
            error_code: None,
            result,
        }
    }

    #[test]
    fn success_envelope_yields_result() {
        let res = envelope(Some(true), Some("X".to_string())).into_result();

        assert_eq!("X", res.unwrap());
    }

    #[test]
    fn failed_envelope_yields_api_error_verbatim() {
        let mut response = envelope(Some(false), None);
        response.error_code = Some("E".to_string());
        response.msg = Some("M".to_string());

        match response.into_result() {
            Err(HandshakeError::Api { error_code, msg }) => {
                assert_eq!("E", error_code);
                assert_eq!("M", msg);
            }
            other => panic!("expected api error, got {other:#?}"),
        }
    }

    #[test]
    fn empty_success_envelope_is_a_transport_failure() {
        match envelope(Some(true), None).into_result() {
            Err(HandshakeError::Transport(_)) => {}
            other => panic!("expected transport error, got {other:#?}"),
        }
    }

    #[tokio::test]
    async fn non_ok_status_fails_before_envelope_inspection() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v9/login"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(serde_json::json!({"success": true, "result": {}})),
            )
            .mount(&mock_server)
            .await;

        let client = http_client_factory().unwrap();
        let resp = client
            .get(format!("{}/api/v9/login", mock_server.uri()))
            .send()
            .await
            .unwrap();

        match read_body(resp).await {
            Err(HandshakeError::Transport(text)) => assert!(text.contains("503")),
            other => panic!("expected transport error, got {other:#?}"),
        }
    }
}

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use hmac::{Hmac, Mac};
use log::debug;
use sha1::Sha1;
use std::sync::Arc;
use tokio::sync::Mutex;

type HmacSha1 = Hmac<Sha1>;

use crate::core::{
    authenticator::{
        application_token_provider::ApplicationTokenProvider,
        common::{ChallengeResult, FreeboxSession, SessionPayload, SessionResult},
        handshake::HandshakeState,
    },
    common::{
        http_client_factory::http_client_factory,
        transport::{read_body, FreeboxResponse, HandshakeError},
    },
    discovery::ApiEndpoint,
};

/// Turns a granted app token into an open session: fetch the current
/// challenge, derive the one-time password, exchange it for a session
/// token. Each `login` consumes a fresh challenge; the last one is
/// cached for thirty minutes so routine calls do not redo the exchange.
#[derive(Clone)]
pub struct SessionTokenProvider {
    issued_on: Arc<Mutex<DateTime<Utc>>>,
    value: Arc<Mutex<String>>,
    app_token_store: Arc<dyn ApplicationTokenProvider>,
    endpoint: ApiEndpoint,
    app_id: String,
    app_version: String,
}

impl SessionTokenProvider {
    pub fn new(
        app_token_store: Arc<dyn ApplicationTokenProvider>,
        endpoint: ApiEndpoint,
        app_id: String,
        app_version: String,
    ) -> Self {
        Self {
            issued_on: Arc::new(Mutex::new(
                Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 1).single().unwrap_or_default(),
            )),
            value: Arc::new(Mutex::new(String::new())),
            app_token_store,
            endpoint,
            app_id,
            app_version,
        }
    }

    /// Cached session token, renewed through a full challenge exchange
    /// once the thirty minute window has passed.
    pub async fn get(&self) -> Result<String, HandshakeError> {
        let issued_on = *self.issued_on.lock().await;

        if Utc::now() - issued_on > TimeDelta::minutes(30) {
            let session = self.login().await?;
            return Ok(session.session_token);
        }

        Ok(self.value.lock().await.clone())
    }

    pub async fn login(&self) -> Result<FreeboxSession, HandshakeError> {
        debug!("login in");

        let app_token = self.stored_token().await?;

        let state = HandshakeState::granted(self.endpoint.clone(), app_token)
            .on_challenge(self.get_challenge().await?);

        let (app_token, challenge) = match &state {
            HandshakeState::ChallengeFetched {
                app_token,
                challenge,
                ..
            } => (app_token.clone(), challenge.clone()),
            _ => return Err(state.into_failure()),
        };

        let password = compute_password(&app_token, &challenge)?;
        let result = self.get_session_token(password).await?;

        match state.on_session(&self.app_id, &self.app_version, result) {
            HandshakeState::SessionOpen { session } => {
                let mut issued_on_guard = self.issued_on.lock().await;
                let mut token_guard = self.value.lock().await;

                *issued_on_guard = Utc::now();
                token_guard.clear();
                token_guard.push_str(&session.session_token);

                Ok(session)
            }
            failed => Err(failed.into_failure()),
        }
    }

    async fn stored_token(&self) -> Result<String, HandshakeError> {
        self.app_token_store.get().await.map_err(|e| {
            HandshakeError::State(format!("no stored application token: {e}"))
        })
    }

    async fn get_challenge(&self) -> Result<ChallengeResult, HandshakeError> {
        debug!("fetching challenge");

        let client = http_client_factory()?;

        let resp = client.get(self.endpoint.url("login")).send().await?;
        let body = read_body(resp).await?;

        serde_json::from_str::<FreeboxResponse<ChallengeResult>>(&body)?.into_result()
    }

    async fn get_session_token(&self, password: String) -> Result<SessionResult, HandshakeError> {
        debug!("negociating session token");

        let client = http_client_factory()?;

        let payload = SessionPayload {
            app_id: self.app_id.clone(),
            app_version: self.app_version.clone(),
            password,
        };

        let resp = client
            .post(self.endpoint.url("login/session"))
            .json(&payload)
            .send()
            .await?;

        let body = read_body(resp).await?;

        // An envelope failure here means the device rejected the derived
        // password, so it surfaces as a session error; recovery needs a
        // fresh challenge, not a retry of the same payload.
        match serde_json::from_str::<FreeboxResponse<SessionResult>>(&body)?.into_result() {
            Err(HandshakeError::Api { error_code, msg }) => {
                Err(HandshakeError::Session { error_code, msg })
            }
            other => other,
        }
    }
}

/// Session password: lowercase-hex HMAC-SHA1 of the UTF-8 challenge
/// keyed with the UTF-8 app token. The device recomputes the exact same
/// digest, any deviation is rejected at session open.
pub fn compute_password(app_token: &str, challenge: &str) -> Result<String, HandshakeError> {
    debug!("computing session password");

    let mut mac = HmacSha1::new_from_slice(app_token.as_bytes())
        .map_err(|e| HandshakeError::State(e.to_string()))?;

    mac.update(challenge.as_bytes());

    let code = mac.finalize().into_bytes();

    Ok(code
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(""))
}

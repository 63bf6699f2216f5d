use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};

use crate::core::{
    common::{
        http_client_factory::{http_client_factory, AuthenticatedHttpClientFactory},
        transport::{read_body, FreeboxResponse, HandshakeError},
    },
    discovery::ApiEndpoint,
};

pub mod application_token_provider;
pub mod common;
pub mod handshake;
pub mod session_token_provider;


use application_token_provider::ApplicationTokenProvider;
use common::{FreeboxSession, TokenRequest, TokenResult, TrackResult, TrackStatus};
use handshake::HandshakeState;
pub use session_token_provider::SessionTokenProvider;

/// Cadence of the user-approval poll loop. Exhausting the window is
/// treated exactly like a `timeout` tracking status.
#[derive(Clone, Copy, Debug)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(interval_secs: u64, timeout_secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn attempts(&self) -> u64 {
        (self.timeout.as_millis() / self.interval.as_millis().max(1)).max(1) as u64
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings::new(2, 120)
    }
}

/// Drives the handshake against one resolved endpoint. The endpoint is
/// fixed at construction; talking to another device means resolving a
/// new context and building a new authenticator.
pub struct Authenticator {
    endpoint: ApiEndpoint,
    token_store: Arc<dyn ApplicationTokenProvider>,
    identity: TokenRequest,
}

impl Authenticator {
    pub fn new(
        endpoint: ApiEndpoint,
        token_store: Arc<dyn ApplicationTokenProvider>,
        identity: TokenRequest,
    ) -> Self {
        Self {
            endpoint,
            token_store,
            identity,
        }
    }

    pub async fn is_registered(&self) -> bool {
        self.token_store.get().await.is_ok()
    }

    /// Requests an application token and polls the tracking handle
    /// until the user answers on the device. The token is persisted as
    /// soon as it is issued, before approval, so a crash mid-poll does
    /// not lose it.
    pub async fn register(&self, poll: PollSettings) -> Result<(), HandshakeError> {
        debug!("requesting application token");

        let issued = self.request_token().await?;

        if let Err(e) = self.token_store.store(issued.app_token.clone()).await {
            warn!(
                "storing application token failed, you can still save it by yourself (token.dat): {e}"
            );
        }

        let mut state = HandshakeState::resolved(self.endpoint.clone()).on_credential(issued);

        let track_id = match &state {
            HandshakeState::CredentialPending { track_id, .. } => *track_id,
            _ => return Err(state.into_failure()),
        };

        info!("requested authorization, please go to the Freebox and check LCD screen instructions");

        for _ in 0..poll.attempts() {
            // dropping the future during this sleep aborts the loop
            tokio::time::sleep(poll.interval).await;

            let track = self.get_authorization_status(track_id).await?;
            state = state.on_track_status(track.status);

            match &state {
                HandshakeState::CredentialPending { .. } => continue,
                HandshakeState::CredentialGranted { .. } => {
                    info!("successfully registered application");
                    return Ok(());
                }
                _ => return Err(state.into_failure()),
            }
        }

        Err(HandshakeError::Authorization(TrackStatus::Timeout))
    }

    /// Runs the challenge/session tail of the handshake with the stored
    /// credential and returns the opened session.
    pub async fn login(&self) -> Result<FreeboxSession, HandshakeError> {
        self.session_provider().login().await
    }

    /// Hands the caller a factory for clients bound to the session;
    /// what every later API call goes through.
    pub fn client_factory(&self) -> AuthenticatedHttpClientFactory {
        AuthenticatedHttpClientFactory::new(&self.endpoint, self.session_provider())
    }

    fn session_provider(&self) -> SessionTokenProvider {
        SessionTokenProvider::new(
            self.token_store.clone(),
            self.endpoint.clone(),
            self.identity.app_id.clone(),
            self.identity.app_version.clone(),
        )
    }

    async fn request_token(&self) -> Result<TokenResult, HandshakeError> {
        let client = http_client_factory()?;

        let resp = client
            .post(self.endpoint.url("login/authorize"))
            .json(&self.identity)
            .send()
            .await?;

        let body = read_body(resp).await?;

        serde_json::from_str::<FreeboxResponse<TokenResult>>(&body)?.into_result()
    }

    async fn get_authorization_status(
        &self,
        track_id: i32,
    ) -> Result<TrackResult, HandshakeError> {
        debug!("checking authorization status");

        let client = http_client_factory()?;

        let resp = client
            .get(self.endpoint.url(&format!("login/authorize/{track_id}")))
            .send()
            .await?;

        let body = read_body(resp).await?;

        serde_json::from_str::<FreeboxResponse<TrackResult>>(&body)?.into_result()
    }
}

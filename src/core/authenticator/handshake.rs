use crate::core::{
    authenticator::common::{
        ChallengeResult, FreeboxSession, SessionResult, TokenResult, TrackStatus,
    },
    common::transport::HandshakeError,
    discovery::ApiEndpoint,
};

/// One named state per handshake stage. Transitions consume decoded
/// stage output and never touch the network, so each of them can be
/// exercised without a live device; the drivers perform the calls and
/// feed the results in.
#[derive(Debug)]
pub enum HandshakeState {
    Unresolved {
        device_root_url: String,
    },
    Resolved {
        endpoint: ApiEndpoint,
    },
    CredentialPending {
        endpoint: ApiEndpoint,
        app_token: String,
        track_id: i32,
    },
    CredentialGranted {
        endpoint: ApiEndpoint,
        app_token: String,
    },
    ChallengeFetched {
        endpoint: ApiEndpoint,
        app_token: String,
        challenge: String,
    },
    SessionOpen {
        session: FreeboxSession,
    },
    Failed {
        error: HandshakeError,
    },
}

impl HandshakeState {
    pub fn start(device_root_url: String) -> Self {
        HandshakeState::Unresolved { device_root_url }
    }

    pub fn resolved(endpoint: ApiEndpoint) -> Self {
        HandshakeState::Resolved { endpoint }
    }

    /// Entry point for a credential persisted by an earlier run; the
    /// authorization stages are already behind it.
    pub fn granted(endpoint: ApiEndpoint, app_token: String) -> Self {
        HandshakeState::CredentialGranted {
            endpoint,
            app_token,
        }
    }

    pub fn on_resolved(self, endpoint: ApiEndpoint) -> Self {
        match self {
            HandshakeState::Unresolved { .. } => HandshakeState::Resolved { endpoint },
            other => other.out_of_sequence("resolve"),
        }
    }

    pub fn on_credential(self, issued: TokenResult) -> Self {
        match self {
            HandshakeState::Resolved { endpoint } => HandshakeState::CredentialPending {
                endpoint,
                app_token: issued.app_token,
                track_id: issued.track_id,
            },
            other => other.out_of_sequence("authorize"),
        }
    }

    /// `pending` keeps the state where it is, `granted` advances, the
    /// other statuses are terminal failures requiring a full re-issue.
    pub fn on_track_status(self, status: TrackStatus) -> Self {
        match self {
            HandshakeState::CredentialPending {
                endpoint,
                app_token,
                track_id,
            } => match status {
                TrackStatus::Granted => HandshakeState::CredentialGranted {
                    endpoint,
                    app_token,
                },
                TrackStatus::Pending => HandshakeState::CredentialPending {
                    endpoint,
                    app_token,
                    track_id,
                },
                terminal => HandshakeState::Failed {
                    error: HandshakeError::Authorization(terminal),
                },
            },
            other => other.out_of_sequence("track"),
        }
    }

    pub fn on_challenge(self, result: ChallengeResult) -> Self {
        match self {
            HandshakeState::CredentialGranted {
                endpoint,
                app_token,
            } => HandshakeState::ChallengeFetched {
                endpoint,
                app_token,
                challenge: result.challenge,
            },
            other => other.out_of_sequence("challenge"),
        }
    }

    pub fn on_session(self, app_id: &str, app_version: &str, result: SessionResult) -> Self {
        match self {
            HandshakeState::ChallengeFetched { .. } => match result.session_token {
                Some(session_token) => HandshakeState::SessionOpen {
                    session: FreeboxSession {
                        app_id: app_id.to_string(),
                        app_version: app_version.to_string(),
                        session_token,
                    },
                },
                None => HandshakeState::Failed {
                    error: HandshakeError::Session {
                        error_code: String::new(),
                        msg: "no session token in response".to_string(),
                    },
                },
            },
            other => other.out_of_sequence("session"),
        }
    }

    /// Extracts the failure out of a dead-end state; anything not
    /// `Failed` means the driver broke the sequence.
    pub fn into_failure(self) -> HandshakeError {
        match self {
            HandshakeState::Failed { error } => error,
            other => HandshakeError::State(format!("unexpected state {}", other.name())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HandshakeState::Unresolved { .. } => "unresolved",
            HandshakeState::Resolved { .. } => "resolved",
            HandshakeState::CredentialPending { .. } => "credential-pending",
            HandshakeState::CredentialGranted { .. } => "credential-granted",
            HandshakeState::ChallengeFetched { .. } => "challenge-fetched",
            HandshakeState::SessionOpen { .. } => "session-open",
            HandshakeState::Failed { .. } => "failed",
        }
    }

    fn out_of_sequence(self, transition: &str) -> Self {
        HandshakeState::Failed {
            error: HandshakeError::State(format!(
                "{transition} applied to state {}",
                self.name()
            )),
        }
    }
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Application identity presented to the device when requesting a
/// token, shown to the user on the LCD screen.
#[derive(Serialize, Clone, Debug)]
pub struct TokenRequest {
    pub app_id: String,
    pub app_name: String,
    pub app_version: String,
    pub device_name: String,
}

impl TokenRequest {
    pub fn new(app_id: String, app_name: String, app_version: String, device_name: String) -> Self {
        Self {
            app_id,
            app_name,
            app_version,
            device_name,
        }
    }
}

/// Issued credential: the long-lived secret plus the handle used to
/// track the pending user approval.
#[derive(Deserialize, Clone, Debug)]
pub struct TokenResult {
    pub app_token: String,
    pub track_id: i32,
}

/// User-approval state of one tracking handle. Only `pending` keeps the
/// poll loop alive, `granted` is the single success outcome.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    Unknown,
    Pending,
    Timeout,
    Granted,
    Denied,
}

impl Display for TrackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TrackStatus::Unknown => "unknown",
            TrackStatus::Pending => "pending",
            TrackStatus::Timeout => "timeout",
            TrackStatus::Granted => "granted",
            TrackStatus::Denied => "denied",
        };
        write!(f, "{text}")
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TrackResult {
    pub status: TrackStatus,
    pub challenge: Option<String>,
    pub password_salt: Option<String>,
}

/// Current login state and the one-time challenge the session password
/// is derived from.
#[derive(Deserialize, Clone, Debug)]
pub struct ChallengeResult {
    pub logged_in: Option<bool>,
    pub challenge: String,
    pub password_salt: Option<String>,
    pub password_set: Option<bool>,
}

#[derive(Serialize, Debug)]
pub struct SessionPayload {
    pub app_id: String,
    pub app_version: String,
    pub password: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionResult {
    pub session_token: Option<String>,
    pub permissions: Option<Permissions>,
}

/// Per-application grants echoed when a session opens.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Permissions {
    pub connection: Option<bool>,
    pub settings: Option<bool>,
    pub contacts: Option<bool>,
    pub calls: Option<bool>,
    pub explorer: Option<bool>,
    pub downloader: Option<bool>,
    pub parental: Option<bool>,
    pub pvr: Option<bool>,
}

/// The authenticated session the whole handshake works towards. Owned
/// by the caller once issued; renewal means a fresh challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeboxSession {
    pub app_id: String,
    pub app_version: String,
    pub session_token: String,
}

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::common::{
    http_client_factory::http_client_factory, transport::HandshakeError,
};

pub const DEFAULT_FBX_HOST: &str = "mafreebox.freebox.fr";

const DISCOVERY_PATH: &str = "/api_version";

/// Device descriptor returned by `api_version`, immutable once fetched.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApiVersion {
    pub box_model_name: String,
    pub api_base_url: String,
    pub https_port: i32,
    pub device_name: String,
    pub https_available: bool,
    pub box_model: String,
    pub api_domain: String,
    pub uid: String,
    pub api_version: String,
    pub device_type: String,
}

impl ApiVersion {
    /// Negotiated major version, the integer prefix of `api_version`
    /// before the first `.`.
    pub fn major(&self) -> Result<u32, HandshakeError> {
        let text = self.api_version.split('.').next().unwrap_or_default();

        text.parse::<u32>().map_err(|_| HandshakeError::Discovery {
            status: format!("unparseable api_version: {}", self.api_version),
        })
    }

    /// Path prefix of every versioned call, e.g. `/api/v9/`.
    pub fn versioned_prefix(&self) -> Result<String, HandshakeError> {
        Ok(format!("{}v{}/", self.api_base_url, self.major()?))
    }
}

/// Immutable handshake context produced by discovery. Every later stage
/// receives it explicitly instead of reading client-global state; a
/// reconnect to another device means resolving a new one.
#[derive(Clone, Debug)]
pub struct ApiEndpoint {
    version: ApiVersion,
    api_url: String,
}

impl ApiEndpoint {
    pub fn new(device_root_url: &str, version: ApiVersion) -> Result<Self, HandshakeError> {
        let api_url = format!(
            "{}{}",
            device_root_url.trim_end_matches('/'),
            version.versioned_prefix()?
        );

        Ok(Self { version, api_url })
    }

    pub fn version(&self) -> &ApiVersion {
        &self.version
    }

    /// Fully qualified versioned prefix, e.g. `https://host/api/v9/`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

/// Discovers the device API location and negotiated version with an
/// unauthenticated GET on the device root. Nothing else can be called
/// until this has succeeded.
pub async fn resolve(device_root_url: &str) -> Result<ApiEndpoint, HandshakeError> {
    debug!("discovering api endpoint on {device_root_url}");

    let client = http_client_factory()?;

    let resp = client
        .get(format!(
            "{}{}",
            device_root_url.trim_end_matches('/'),
            DISCOVERY_PATH
        ))
        .send()
        .await?;

    let status = resp.status();

    if !status.is_success() {
        return Err(HandshakeError::Discovery {
            status: status.to_string(),
        });
    }

    let version = resp.json::<ApiVersion>().await?;

    debug!(
        "discovered {} ({}) api v{}",
        version.device_name, version.box_model, version.api_version
    );

    ApiEndpoint::new(device_root_url, version)
}

/// Builds the device root URL from an FQDN, `use_tls` should stay on
/// unless the device is reached through a plain HTTP redirector.
pub fn root_url(fqdn: &str, use_tls: bool) -> String {
    let scheme = match use_tls {
        true => "https",
        false => "http",
    };

    format!("{scheme}://{fqdn}")
}

use std::sync::Arc;

use log::info;

use crate::core::{
    authenticator::{
        application_token_provider::FileSystemProvider, common::TokenRequest, Authenticator,
        PollSettings,
    },
    common::transport::HandshakeError,
    configuration::Configuration,
    discovery::{self, ApiEndpoint},
};

type Error = Box<dyn std::error::Error + Send + Sync>;

/// Resolves the device and reports what it negotiated.
pub async fn discover(conf: &Configuration) -> Result<(), Error> {
    let endpoint = resolve_endpoint(conf).await?;
    let version = endpoint.version();

    info!(
        "discovered {} ({}), api v{}, calls go through {}",
        version.device_name, version.box_model_name, version.api_version,
        endpoint.api_url()
    );

    Ok(())
}

/// Issues an application token and waits for the user to approve it on
/// the device. Skipped entirely when a token is already persisted; a
/// revoked token requires deleting `token.dat` and registering again.
pub async fn register(conf: &Configuration, pooling_interval: Option<u64>) -> Result<(), Error> {
    conf.assert_data_dir_permissions()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let authenticator = create_authenticator(conf).await?;

    if authenticator.is_registered().await {
        info!("application is already registered, skipping registration");
        return Ok(());
    }

    info!("application is not registered, registering now");

    let poll = PollSettings::new(
        pooling_interval
            .or(conf.api.pooling_interval)
            .unwrap_or(2),
        conf.api.pooling_timeout.unwrap_or(120),
    );

    authenticator.register(poll).await?;

    Ok(())
}

/// Runs the challenge/session tail of the handshake with the persisted
/// credential and reports on the opened session.
pub async fn session_diagnostic(conf: &Configuration, show_token: bool) -> Result<(), Error> {
    let authenticator = create_authenticator(conf).await?;

    if !authenticator.is_registered().await {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "Application is not registered, please register it first",
        )));
    }

    let session = authenticator.login().await?;

    info!(
        "session opened for {} {}",
        session.app_id, session.app_version
    );

    if show_token {
        println!("SESSION_TOKEN: {}", session.session_token);
    }

    Ok(())
}

async fn resolve_endpoint(conf: &Configuration) -> Result<ApiEndpoint, HandshakeError> {
    let host = conf
        .api
        .host
        .clone()
        .unwrap_or_else(|| discovery::DEFAULT_FBX_HOST.to_string());
    let root = discovery::root_url(&host, conf.api.use_tls.unwrap_or(true));

    discovery::resolve(&root).await
}

async fn create_authenticator(conf: &Configuration) -> Result<Authenticator, Error> {
    let endpoint = resolve_endpoint(conf).await?;

    let data_dir = conf
        .core
        .data_directory
        .clone()
        .unwrap_or_else(|| ".".to_string());

    Ok(Authenticator::new(
        endpoint,
        Arc::new(FileSystemProvider::new(data_dir)),
        identity_from(conf),
    ))
}

fn identity_from(conf: &Configuration) -> TokenRequest {
    let device_name = conf
        .app
        .device_name
        .clone()
        .or_else(|| hostname::get().ok().map(|h| h.to_string_lossy().into_owned()))
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    TokenRequest::new(
        conf.app
            .id
            .clone()
            .unwrap_or_else(|| "fr.freebox.login.rs".to_string()),
        conf.app
            .name
            .clone()
            .unwrap_or_else(|| "Freebox Login".to_string()),
        conf.app
            .version
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        device_name,
    )
}

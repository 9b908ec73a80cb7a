//! Guest session lifecycle.
//!
//! The guest session identifier is the only state this application
//! persists. It lives in the config file and is created at most once:
//! later runs reuse the stored id without touching the network.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::instrument;

use crate::config::AppConfig;
use cinedex_api::tmdb::LocalTmdbApi;

/// Returns the persisted guest session id, creating and persisting a new
/// one via the API when none exists yet.
///
/// Session creation failure is not fatal: search and browse still work,
/// only rating is disabled. `Ok(None)` signals exactly that.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written. API
/// failures are logged and reported as `Ok(None)`.
#[instrument(skip_all)]
pub async fn get_or_create_session(
    api: &(impl LocalTmdbApi + Sync),
    config_path: &Path,
) -> Result<Option<String>> {
    let mut config = AppConfig::load(config_path).context("failed to load config")?;

    if let Some(id) = config.session.guest_session_id.clone() {
        tracing::debug!("using existing guest session");
        return Ok(Some(id));
    }

    tracing::info!("no guest session found, requesting a new one");
    match api.new_guest_session().await {
        Ok(response) => {
            config.session.guest_session_id = Some(response.guest_session_id.clone());
            config
                .save(config_path)
                .context("failed to persist guest session")?;
            tracing::info!("new guest session created");
            Ok(Some(response.guest_session_id))
        }
        Err(err) => {
            tracing::warn!("guest session init failed, rating disabled: {err:#}");
            Ok(None)
        }
    }
}

/// Reads the persisted guest session id without creating one.
///
/// # Errors
///
/// Returns an error if the config file cannot be read.
pub fn stored_session(config_path: &Path) -> Result<Option<String>> {
    let config = AppConfig::load(config_path).context("failed to load config")?;
    Ok(config.session.guest_session_id)
}

//! Backend selection: prefer the remote adapter, fall back to the local
//! one when remote construction or initialization fails. Selection happens
//! once, at startup — there is no mid-session adapter switching.

use tracing::{info, warn};

use vigil_core::config::{StorageConfig, StorageMode};

use crate::adapter::{StorageAdapter, StoreError, StoreResult};
use crate::local::LocalAdapter;
use crate::remote::RemoteAdapter;

/// Check the remote connection info before constructing anything.
pub fn validate_remote_config(config: &StorageConfig) -> StoreResult<(String, String)> {
    let url = config
        .remote_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| StoreError::Configuration("remote_url is not set".into()))?;
    if !url.starts_with("http") {
        return Err(StoreError::Configuration(format!(
            "remote_url must be an http(s) url, got {url:?}"
        )));
    }
    let key = config
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| StoreError::Configuration("api_key is not set".into()))?;
    Ok((url.to_string(), key.to_string()))
}

async fn init_remote(config: &StorageConfig) -> StoreResult<RemoteAdapter> {
    let (url, key) = validate_remote_config(config)?;
    let adapter = RemoteAdapter::new(&url, &key, config);
    adapter.initialize().await?;
    Ok(adapter)
}

async fn init_local(config: &StorageConfig) -> StoreResult<LocalAdapter> {
    let adapter = LocalAdapter::new(&config.local_path);
    adapter.initialize().await?;
    Ok(adapter)
}

/// Construct and initialize the storage backend for `config.mode`.
///
/// `Remote` surfaces configuration/connectivity errors to the caller;
/// `Auto` logs them and substitutes the local adapter.
pub async fn create_storage(config: &StorageConfig) -> StoreResult<Box<dyn StorageAdapter>> {
    match config.mode {
        StorageMode::Local => {
            let adapter = init_local(config).await?;
            info!(path = %config.local_path.display(), "using local storage adapter");
            Ok(Box::new(adapter))
        }
        StorageMode::Remote => {
            let adapter = init_remote(config).await?;
            info!("using remote storage adapter");
            Ok(Box::new(adapter))
        }
        StorageMode::Auto => match init_remote(config).await {
            Ok(adapter) => {
                info!("using remote storage adapter");
                Ok(Box::new(adapter))
            }
            Err(err) => {
                warn!("remote storage unavailable, falling back to local: {err}");
                let adapter = init_local(config).await?;
                info!(path = %config.local_path.display(), "using local storage adapter");
                Ok(Box::new(adapter))
            }
        },
    }
}

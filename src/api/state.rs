// src/api/state.rs
use crate::cache::MemoryViewCache;
use crate::client::RemoteClient;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::remote::HttpUserDirectory;
use crate::service::RegistrationService;
use std::sync::Arc;

pub type Registrations = RegistrationService<HttpUserDirectory, MemoryViewCache>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<Registrations>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = RemoteClient::new(&config.remote)?;
        let directory = HttpUserDirectory::new(client, config.remote.users_path.clone());
        let cache = Arc::new(MemoryViewCache::from_config(&config.cache)?);
        // The listing view is keyed by the same path the remote serves it under.
        let service = RegistrationService::new(directory, cache, config.remote.users_path.clone());

        Ok(Self {
            config: Arc::new(config),
            service: Arc::new(service),
        })
    }
}

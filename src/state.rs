use std::sync::Arc;

use crate::captcha::CaptchaVerifier;
use crate::captcha::turnstile::TurnstileVerifier;
use crate::config::Config;
use crate::storage::RecordStore;
use crate::storage::airtable::AirtableStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub verifier: Arc<dyn CaptchaVerifier>,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Wire up the Turnstile verifier and Airtable store described by `config`.
    pub fn from_config(config: Config) -> Result<Self, String> {
        let verifier = TurnstileVerifier::new(&config.turnstile, config.upstream_timeout)?;
        let store = AirtableStore::new(&config.airtable, config.upstream_timeout)?;

        Ok(Self::new(config, Arc::new(verifier), Arc::new(store)))
    }

    pub fn new(
        config: Config,
        verifier: Arc<dyn CaptchaVerifier>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            config,
            verifier,
            store,
        }
    }
}

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};
use water_connect::config::{MailConfig, MpesaConfig, StorageConfig};
use water_connect::error::AppError;
use water_connect::notifications::{HttpMailer, LogMailer, Mailer};
use water_connect::payments::{DarajaClient, DisabledGateway, PaymentGateway};
use water_connect::store::MemoryStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens the snapshot when one is configured, otherwise a volatile store.
pub(crate) fn build_store(config: &StorageConfig) -> Result<Arc<MemoryStore>, AppError> {
    let store = match &config.data_file {
        Some(path) => {
            info!(path = %path.display(), "loading entity snapshot");
            MemoryStore::open(path)?
        }
        None => {
            warn!("APP_DATA_FILE not set; records are kept in memory only");
            MemoryStore::new()
        }
    };
    Ok(Arc::new(store))
}

pub(crate) fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, AppError> {
    match &config.api_key {
        Some(api_key) => {
            let mailer = HttpMailer::new(
                config.api_url.clone(),
                api_key.clone(),
                config.sender.clone(),
                config.timeout,
            )?;
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("MAIL_API_KEY not set; notification emails are logged instead of sent");
            Ok(Arc::new(LogMailer))
        }
    }
}

pub(crate) fn build_gateway(config: &MpesaConfig) -> Result<Arc<dyn PaymentGateway>, AppError> {
    match config.credentials() {
        Some(credentials) => {
            let client = DarajaClient::new(
                config.base_url.clone(),
                config.shortcode.clone(),
                credentials,
                config.timeout,
            )?;
            Ok(Arc::new(client))
        }
        None => {
            warn!("M-Pesa credentials incomplete; payment requests will be refused");
            Ok(Arc::new(DisabledGateway))
        }
    }
}

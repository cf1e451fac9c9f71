use crate::config::ServerConfig;
use chrono::{DateTime, Utc};
use hazmon_alert::RefirePolicy;
use hazmon_feeds::seismic::SeismicClient;
use hazmon_feeds::weather::WeatherClient;
use hazmon_storage::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub weather: Arc<WeatherClient>,
    pub seismic: Arc<SeismicClient>,
    pub refire_policy: RefirePolicy,
    pub start_time: DateTime<Utc>,
    pub jwt_secret: Arc<String>,
    pub token_expire_secs: u64,
    pub config: Arc<ServerConfig>,
}

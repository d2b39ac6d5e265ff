use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::db::DbPool;
use crate::observability::Telemetry;
use crate::services::forecast::ProjectionModel;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub projection: Arc<dyn ProjectionModel>,
    pub telemetry: Telemetry,
}

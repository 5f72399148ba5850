use crate::analysis::{
    classifier::ModelClassifier, nutrition::NutritionClient, Pipeline,
};
use crate::auth::oauth::{GoogleProvider, IdentityProvider};
use crate::config::{MlConfig, WebConfig};
use crate::scans::MlClient;
use crate::storage::{MongoScanStore, ScanStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state of the web front end.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebConfig>,
    /// `None` when no database is configured; scans are then not persisted.
    pub scans: Option<Arc<dyn ScanStore>>,
    /// `None` when no analysis service is configured.
    pub ml: Option<MlClient>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub async fn init(config: WebConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let scans = match &config.mongodb_uri {
            Some(uri) => match MongoScanStore::connect(uri).await {
                Ok(store) => Some(Arc::new(store) as Arc<dyn ScanStore>),
                Err(e) => {
                    warn!(error = %e, "mongodb client setup failed; scans will not be stored");
                    None
                }
            },
            None => {
                warn!("MONGODB_URI not set; scans will not be stored");
                None
            }
        };

        let ml = match &config.ml_service_url {
            Some(url) => {
                info!(url = %url, "using analysis service");
                Some(MlClient::new(url.clone())?)
            }
            None => {
                warn!("ML_SERVICE_URL not set; using placeholder nutrition");
                None
            }
        };

        let identity =
            Arc::new(GoogleProvider::new(config.google.clone())?) as Arc<dyn IdentityProvider>;

        Ok(Self {
            config,
            scans,
            ml,
            identity,
        })
    }

    pub fn from_parts(
        config: Arc<WebConfig>,
        scans: Option<Arc<dyn ScanStore>>,
        ml: Option<MlClient>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config,
            scans,
            ml,
            identity,
        }
    }
}

/// Shared state of the analysis service.
#[derive(Clone)]
pub struct MlState {
    pub pipeline: Pipeline,
}

impl MlState {
    pub fn init(config: &MlConfig) -> anyhow::Result<Self> {
        if config.nutrition.url.is_none() || config.nutrition.key.is_none() {
            warn!("FOOD_API_URL or FOOD_API_KEY missing; nutrition lookups will fail");
        }
        let classifier = Arc::new(ModelClassifier::new(&config.model_dir));
        let nutrition = Arc::new(NutritionClient::new(config.nutrition.clone())?);
        Ok(Self::from_parts(Pipeline::new(classifier, nutrition)))
    }

    pub fn from_parts(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

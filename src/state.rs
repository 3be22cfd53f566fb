use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    catalog::{Catalog, OrmCatalog},
    clients::{
        cvr::{CvrRegistry, ElasticCvrRegistry},
        geocode::{Geocoder, NominatimGeocoder},
        mail::{LogMailer, Mailer},
    },
    config::AppConfig,
    session::{OrmSessionStore, SessionStore},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub catalog: Arc<dyn Catalog>,
    pub sessions: Arc<dyn SessionStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub cvr: Arc<dyn CvrRegistry>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Wire the database-backed stores and the HTTP collaborators from config.
    pub fn new(orm: DatabaseConnection, config: AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("foodbee/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            catalog: Arc::new(OrmCatalog::new(orm.clone())),
            sessions: Arc::new(OrmSessionStore::new(orm.clone())),
            geocoder: Arc::new(NominatimGeocoder::new(
                http.clone(),
                config.nominatim_url.clone(),
            )),
            cvr: Arc::new(ElasticCvrRegistry::new(http, config.cvr.clone())),
            mailer: Arc::new(LogMailer),
            config: Arc::new(config),
            orm,
        })
    }
}

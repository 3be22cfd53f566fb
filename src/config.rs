use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Public host used in links sent by email, e.g. `foodbee.dk`.
    pub site_domain: String,
    pub mail_from: String,
    pub nominatim_url: String,
    pub cvr: CvrConfig,
}

#[derive(Debug, Clone)]
pub struct CvrConfig {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let site_domain = env::var("SITE_DOMAIN").unwrap_or_else(|_| format!("localhost:{port}"));
        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@foodbee.dk".to_string());
        let nominatim_url = env::var("NOMINATIM_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org/search".to_string());
        let cvr = CvrConfig {
            url: env::var("CVR_URL")
                .unwrap_or_else(|_| "http://distribution.virk.dk".to_string()),
            user: env::var("CVR_USER").unwrap_or_default(),
            password: env::var("CVR_PASS").unwrap_or_default(),
        };
        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            site_domain,
            mail_from,
            nominatim_url,
            cvr,
        })
    }
}

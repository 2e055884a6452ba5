use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub docstore_url: String,
    pub docstore_service_key: String,
    pub auth_jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            docstore_url: env::var("DOCSTORE_URL")
                .unwrap_or_else(|_| {
                    warn!("DOCSTORE_URL not set, using empty value");
                    String::new()
                }),
            docstore_service_key: env::var("DOCSTORE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("DOCSTORE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            auth_jwt_secret: env::var("AUTH_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("AUTH_JWT_SECRET not set, using empty value");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.docstore_url.is_empty()
            && !self.docstore_service_key.is_empty()
            && !self.auth_jwt_secret.is_empty()
    }
}

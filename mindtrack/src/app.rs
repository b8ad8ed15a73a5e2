use crate::errors::MindtrackError;
use crate::models::user::User;
use crate::resources::email_client::TlsMode;
use crate::resources::formio::Formio;
use crate::resources::mailer::Mailer;
use crate::resources::resource::Resource;
use actix_cors::Cors;
use actix_session::config::PersistentSession;
use actix_session::storage::RedisSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::{cookie, http, web};
use scylla::client::caching_session::CachingSession;
use serde::Deserialize;
use std::sync::Arc;
use std::{env, fs};

#[derive(Clone, Deserialize)]
pub struct ScyllaCfg {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub ca_cert: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct RedisCfg {
    pub url: String,
}

#[derive(Clone, Deserialize)]
pub struct FormioCfg {
    pub url: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_name: Option<String>,
    pub from_email: String,
    pub tls_mode: TlsMode,
}

#[derive(Clone, Deserialize)]
pub struct AdminCfg {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Deserialize)]
pub struct ReminderCfg {
    #[serde(default = "ReminderCfg::default_interval_min")]
    pub interval_min: u64,

    #[serde(default = "ReminderCfg::default_lead_hours")]
    pub lead_hours: i64,
}

impl ReminderCfg {
    fn default_interval_min() -> u64 {
        30
    }

    fn default_lead_hours() -> i64 {
        24
    }
}

impl Default for ReminderCfg {
    fn default() -> Self {
        Self {
            interval_min: Self::default_interval_min(),
            lead_hours: Self::default_lead_hours(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub allowed_origin: String,
    pub secret_key: String,
    pub session_expiration_in_days: i64,
    pub client_url: String,
    pub scylla: ScyllaCfg,
    pub redis: RedisCfg,
    pub formio: FormioCfg,
    pub smtp: Option<SmtpConfig>,
    pub admin: Option<AdminCfg>,

    #[serde(default)]
    pub reminder: ReminderCfg,
}

#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub db_session: Arc<CachingSession>,
    pub formio: Arc<Formio>,
    pub mailer: Arc<Mailer>,
    pub session_store: RedisSessionStore,
}

impl App {
    pub async fn new() -> Result<Self, MindtrackError> {
        dotenv::dotenv().ok();

        let env = env::var("ENV").expect("ENV must be set");
        let config_file = format!("config.{}.toml", env);
        let contents = fs::read_to_string(&config_file)
            .map_err(|e| MindtrackError::InternalServerError(format!("Unable to read {}: {}", config_file, e)))?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| MindtrackError::InternalServerError(format!("Unable to parse {}: {}", config_file, e)))?;

        let db_session = CachingSession::init_resource(&config.scylla).await;
        let session_store = RedisSessionStore::init_resource(&config.redis).await;
        let formio = Formio::init_resource(&config).await;
        let mailer = Mailer::init_resource(&config).await;

        Ok(Self {
            config,
            db_session: Arc::new(db_session),
            formio: Arc::new(formio),
            mailer: Arc::new(mailer),
            session_store,
        })
    }

    /// Init processes that need to be run on startup
    pub async fn init(&self) {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

        if let Err(e) = self.formio.ping().await {
            log::warn!("Form engine is not reachable yet: {}", e);
        }

        if let Err(e) = User::seed_admin(&web::Data::new(self.clone())).await {
            log::error!("Could not seed the admin account: {}", e);
        }
    }

    pub fn cors(&self) -> Cors {
        Cors::default()
            .allowed_origin(self.config.allowed_origin.as_str())
            .supports_credentials()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::ORIGIN,
                http::header::USER_AGENT,
                http::header::DNT,
                http::header::CONTENT_TYPE,
                http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            ])
            .expose_headers(vec![http::header::LOCATION, http::header::ACCESS_CONTROL_ALLOW_ORIGIN])
            .max_age(86400)
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn session_middleware(&self) -> SessionMiddleware<RedisSessionStore> {
        let ttl =
            PersistentSession::default().session_ttl(cookie::time::Duration::days(self.config.session_expiration_in_days));

        SessionMiddleware::builder(self.session_store.clone(), self.secret_key())
            .session_lifecycle(ttl)
            .cookie_secure(false)
            .build()
    }

    fn secret_key(&self) -> Key {
        Key::from(self.config.secret_key.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config_file() {
        let config: Config = toml::from_str(
            r#"
            port = 8080
            allowed_origin = "http://localhost:3000"
            secret_key = "0123456789012345678901234567890123456789012345678901234567890123"
            session_expiration_in_days = 7
            client_url = "http://localhost:3000"

            [scylla]
            hosts = ["127.0.0.1:9042"]
            keyspace = "mindtrack"

            [redis]
            url = "redis://127.0.0.1:6379"

            [formio]
            url = "http://localhost:3001"
            email = "admin@example.com"
            password = "secret"

            [reminder]
            interval_min = 15
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.port, 8080);
        assert_eq!(config.scylla.hosts, vec!["127.0.0.1:9042".to_string()]);
        assert!(config.scylla.ca_cert.is_none());
        assert!(config.smtp.is_none());
        assert!(config.admin.is_none());
        assert_eq!(config.reminder.interval_min, 15);
        assert_eq!(config.reminder.lead_hours, 24);
    }
}

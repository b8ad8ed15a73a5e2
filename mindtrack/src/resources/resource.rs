use crate::app::{Config, RedisCfg, ScyllaCfg};
use crate::resources::email_client::{EmailClient, Smtp};
use crate::resources::formio::Formio;
use crate::resources::mailer::Mailer;
use actix_session::storage::RedisSessionStore;
use openssl::ssl::{SslContextBuilder, SslMethod};
use scylla::client::caching_session::CachingSession;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::time::Duration;

/// Resources should be alive during application runtime. Usually related to external services like
/// the database session, the form engine client or the session store.
pub trait Resource<'a>: Sized {
    type Cfg;

    async fn init_resource(cfg: Self::Cfg) -> Self;
}

impl<'a> Resource<'a> for CachingSession {
    type Cfg = &'a ScyllaCfg;

    async fn init_resource(cfg: Self::Cfg) -> Self {
        let mut builder = SessionBuilder::new()
            .known_nodes(&cfg.hosts)
            .connection_timeout(Duration::from_secs(3))
            .use_keyspace(&cfg.keyspace, false);

        if let Some(ca_cert) = &cfg.ca_cert {
            let mut context_builder =
                SslContextBuilder::new(SslMethod::tls()).expect("Could not create ssl context");

            context_builder
                .set_ca_file(ca_cert)
                .unwrap_or_else(|e| panic!("Could not read scylla ca file {}.\nError: {}", ca_cert, e));

            builder = builder.tls_context(Some(context_builder.build()));
        }

        let session: Session = builder.build().await.unwrap_or_else(|e| {
            panic!("Unable to connect to scylla hosts: {:?}. \nError: {}", cfg.hosts, e)
        });

        CachingSession::from(session, 1000)
    }
}

impl<'a> Resource<'a> for RedisSessionStore {
    type Cfg = &'a RedisCfg;

    async fn init_resource(cfg: Self::Cfg) -> Self {
        RedisSessionStore::new(cfg.url.clone())
            .await
            .unwrap_or_else(|e| panic!("Unable to connect to redis {}. \nError: {}", cfg.url, e))
    }
}

impl<'a> Resource<'a> for Formio {
    type Cfg = &'a Config;

    async fn init_resource(config: Self::Cfg) -> Self {
        Formio::new(&config.formio)
    }
}

impl<'a> Resource<'a> for Mailer {
    type Cfg = &'a Config;

    async fn init_resource(config: Self::Cfg) -> Self {
        let email_client = match &config.smtp {
            Some(smtp_cfg) => EmailClient::Smtp(Smtp::new(smtp_cfg.clone())),
            None => EmailClient::Noop,
        };

        Mailer::new(email_client, config.client_url.clone())
    }
}

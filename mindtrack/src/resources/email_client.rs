use crate::app::SmtpConfig;
use crate::errors::MindtrackError;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, SmtpTransport, Transport};
use serde::Deserialize;

#[derive(Clone, Deserialize, strum_macros::Display, strum_macros::EnumString)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    None,
    Tls,
    StartTls,
}

pub struct Smtp {
    pub from: Mailbox,
    pub client: SmtpTransport,
}

impl Smtp {
    pub fn new(smtp_cfg: SmtpConfig) -> Self {
        let transport_builder = match smtp_cfg.tls_mode {
            TlsMode::None => Ok(SmtpTransport::builder_dangerous(&smtp_cfg.host)),
            TlsMode::Tls => SmtpTransport::relay(&smtp_cfg.host),
            TlsMode::StartTls => SmtpTransport::starttls_relay(&smtp_cfg.host),
        };

        let mut client = transport_builder
            .expect("SMTP transport builder failed")
            .port(smtp_cfg.port);

        if !smtp_cfg.username.is_empty() {
            client = client.credentials(Credentials::new(smtp_cfg.username, smtp_cfg.password));
        }

        let client = client.build();

        Self {
            from: Mailbox::new(
                smtp_cfg.from_name,
                smtp_cfg.from_email.parse::<Address>().expect("Invalid SMTP from email"),
            ),
            client,
        }
    }

    pub async fn send_email(&self, to: String, subject: &str, message: String) -> Result<(), MindtrackError> {
        let email = lettre::Message::builder()
            .from(self.from.clone())
            .to(to.parse().map_err(|e| MindtrackError::EmailError(format!("{:?}", e)))?)
            .subject(subject)
            .header(lettre::message::header::ContentType::TEXT_HTML)
            .body(message)
            .map_err(|e| MindtrackError::EmailError(format!("{:?}", e)))?;

        self.client
            .send(&email)
            .map_err(|e| MindtrackError::EmailError(format!("{:?}", e)))?;

        Ok(())
    }
}

pub enum EmailClient {
    Smtp(Smtp),
    /// Used when no SMTP section is configured. Deliveries are logged and dropped.
    Noop,
}

impl EmailClient {
    pub async fn send_email(&self, to: String, subject: &str, message: String) -> Result<(), MindtrackError> {
        match self {
            Self::Smtp(mailer) => mailer.send_email(to, subject, message).await,
            Self::Noop => {
                log::info!("Email delivery is disabled. Dropping \"{}\" to {}", subject, to);

                Ok(())
            }
        }
    }
}

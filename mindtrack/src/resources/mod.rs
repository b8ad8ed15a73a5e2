pub mod email_client;
pub mod formio;
pub mod mailer;
pub mod resource;

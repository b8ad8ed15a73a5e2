use crate::app::App;
use crate::errors::MindtrackError;
use actix_web::web;
use bcrypt::{hash, verify};
use charybdis::callbacks::Callbacks;
use charybdis::macros::charybdis_model;
use charybdis::operations::{Find, InsertWithCallbacks};
use charybdis::types::{Boolean, Text, Timestamp, Uuid};
use chrono::Utc;
use email_address::EmailAddress;
use log::error;
use rand::distr::Alphanumeric;
use rand::Rng;
use scylla::client::caching_session::CachingSession;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const BCRYPT_COST: u32 = 6;
const GENERATED_PASSWORD_LEN: usize = 16;

#[derive(Debug, PartialEq, Eq, Clone, Copy, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Employee,
    Client,
}

#[charybdis_model(
    table_name = users,
    partition_keys = [id],
    clustering_keys = [],
    global_secondary_indexes = [email],
)]
#[derive(Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Uuid,

    pub email: Text,

    #[serde(skip_serializing, default)]
    pub password: Text,

    pub first_name: Text,
    pub last_name: Text,
    pub role: Text,

    #[serde(default)]
    pub is_blocked: Boolean,

    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,

    #[charybdis(ignore)]
    #[serde(skip)]
    pub generated_password: Option<Text>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn role(&self) -> Result<UserRole, MindtrackError> {
        UserRole::from_str(&self.role)
            .map_err(|_| MindtrackError::InternalServerError(format!("Unknown user role: {}", self.role)))
    }

    pub async fn verify_password(&self, password: &str) -> Result<bool, MindtrackError> {
        verify(password, &self.password)
            .map_err(|_| MindtrackError::InternalServerError("Could not verify password".to_string()))
    }

    pub async fn seed_admin(app: &web::Data<App>) -> Result<(), MindtrackError> {
        let Some(admin) = &app.config.admin else {
            return Ok(());
        };

        let existing = User::maybe_find_first_by_email(admin.email.clone())
            .execute(&app.db_session)
            .await?;

        if existing.is_some() {
            return Ok(());
        }

        let mut user = User {
            email: admin.email.clone(),
            password: admin.password.clone(),
            first_name: admin.first_name.clone(),
            last_name: admin.last_name.clone(),
            role: UserRole::Employee.to_string(),
            ..Default::default()
        };

        user.insert_cb(app).execute(&app.db_session).await?;

        log::info!("Seeded the admin account {}", admin.email);

        Ok(())
    }

    async fn check_existing_email(&self, db_session: &CachingSession) -> Result<(), MindtrackError> {
        let existing = User::maybe_find_first_by_email(self.email.clone())
            .execute(db_session)
            .await?;

        if existing.is_some() {
            return Err(MindtrackError::ValidationError((
                "email".to_string(),
                "is taken".to_string(),
            )));
        }

        Ok(())
    }

    fn set_defaults(&mut self) {
        let now = Utc::now();

        self.id = Uuid::new_v4();
        self.created_at = Some(now);
        self.updated_at = Some(now);
        self.is_blocked = false;
    }

    fn generate_password(&mut self) {
        let password: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_PASSWORD_LEN)
            .map(char::from)
            .collect();

        self.password = password.clone();
        self.generated_password = Some(password);
    }

    fn set_password(&mut self) -> Result<(), MindtrackError> {
        self.password = hash(&self.password, BCRYPT_COST).map_err(|_| {
            MindtrackError::InternalServerError("There was an error processing the password".to_string())
        })?;

        Ok(())
    }
}

impl Callbacks for User {
    type Extension = web::Data<App>;
    type Error = MindtrackError;

    async fn before_insert(&mut self, db_session: &CachingSession, _app: &web::Data<App>) -> Result<(), MindtrackError> {
        if !EmailAddress::is_valid(&self.email) {
            return Err(MindtrackError::ValidationError((
                "email".to_string(),
                "is invalid".to_string(),
            )));
        }

        self.role()
            .map_err(|_| MindtrackError::ValidationError(("role".to_string(), "is unknown".to_string())))?;

        self.check_existing_email(db_session).await?;
        self.set_defaults();

        if self.password.is_empty() {
            self.generate_password();
        }

        self.set_password()?;

        Ok(())
    }

    async fn after_insert(&mut self, _db_session: &CachingSession, app: &web::Data<App>) -> Result<(), MindtrackError> {
        if let Some(password) = self.generated_password.take() {
            let mailer = app.mailer.clone();
            let to = self.email.clone();
            let name = self.full_name();

            tokio::spawn(async move {
                let _ = mailer
                    .send_account_created_email(to, &name, &password)
                    .await
                    .map_err(|e| error!("Error while sending account email: {}", e));
            });
        }

        Ok(())
    }

    async fn before_update(&mut self, _db_session: &CachingSession, _app: &web::Data<App>) -> Result<(), MindtrackError> {
        self.updated_at = Some(Utc::now());

        Ok(())
    }
}

partial_user!(ShowUser, id, email, first_name, last_name, role, created_at, updated_at);

partial_user!(CurrentUser, id, email, first_name, last_name, role, is_blocked);

impl CurrentUser {
    pub fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_blocked: user.is_blocked,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn role(&self) -> Result<UserRole, MindtrackError> {
        UserRole::from_str(&self.role)
            .map_err(|_| MindtrackError::InternalServerError(format!("Unknown user role: {}", self.role)))
    }

    pub fn ensure_employee(&self) -> Result<(), MindtrackError> {
        if self.role()? != UserRole::Employee {
            return Err(MindtrackError::Forbidden(
                "Only employees can perform this action!".to_string(),
            ));
        }

        Ok(())
    }
}

partial_user!(UpdateProfileUser, id, first_name, last_name, updated_at);

impl Callbacks for UpdateProfileUser {
    type Extension = crate::api::data::RequestData;
    type Error = MindtrackError;

    async fn before_update(
        &mut self,
        _db_session: &CachingSession,
        _data: &crate::api::data::RequestData,
    ) -> Result<(), MindtrackError> {
        self.updated_at = Some(Utc::now());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_from_stored_text() {
        let mut user = User {
            role: UserRole::Client.to_string(),
            ..Default::default()
        };

        assert_eq!(user.role().unwrap(), UserRole::Client);

        user.role = "EMPLOYEE".to_string();
        assert_eq!(user.role().unwrap(), UserRole::Employee);

        user.role = "INTRUDER".to_string();
        assert!(user.role().is_err());
    }

    #[tokio::test]
    async fn hashes_and_verifies_passwords() {
        let mut user = User {
            password: "hunter2hunter2".to_string(),
            ..Default::default()
        };

        user.set_password().unwrap();

        assert_ne!(user.password, "hunter2hunter2");
        assert!(user.verify_password("hunter2hunter2").await.unwrap());
        assert!(!user.verify_password("wrong").await.unwrap());
    }

    #[test]
    fn generates_alphanumeric_passwords() {
        let mut user = User::default();

        user.generate_password();

        let generated = user.generated_password.clone().unwrap();
        assert_eq!(generated.len(), GENERATED_PASSWORD_LEN);
        assert!(generated.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(user.password, generated);
    }

    #[test]
    fn current_user_keeps_the_session_projection() {
        let user = User {
            id: Uuid::new_v4(),
            email: "jo@example.com".to_string(),
            first_name: "Jo".to_string(),
            last_name: "Client".to_string(),
            role: UserRole::Client.to_string(),
            ..Default::default()
        };

        let current_user = CurrentUser::from_user(user.clone());

        assert_eq!(current_user.id, user.id);
        assert_eq!(current_user.full_name(), "Jo Client");
        assert!(current_user.ensure_employee().is_err());
    }
}

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::app::FormioCfg;
use crate::errors::MindtrackError;

const JWT_HEADER: &str = "x-jwt-token";

/// Reauthenticate this long before the token `exp` so in-flight requests never race the engine clock.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Deserialize)]
struct TokenClaims {
    exp: i64,
}

#[derive(Clone)]
pub(crate) struct JwtToken {
    pub(crate) value: String,
    pub(crate) expires_at: DateTime<Utc>,
}

impl JwtToken {
    pub(crate) fn parse(value: String) -> Result<Self, MindtrackError> {
        // The token is opaque to us, we only need its `exp` claim. Formio owns the signature.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode::<TokenClaims>(&value, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| MindtrackError::FormEngine(format!("Could not decode form engine token: {}", e)))?
            .claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| MindtrackError::FormEngine("Form engine token has an invalid exp claim".to_string()))?;

        Ok(Self { value, expires_at })
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(TOKEN_EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

/// Client for the external form engine. Forms and submissions live entirely on the engine,
/// we reference them by opaque string identifiers.
pub struct Formio {
    base_url: String,
    email: String,
    password: String,
    http: reqwest::Client,
    token: RwLock<Option<JwtToken>>,
}

impl Formio {
    pub fn new(cfg: &FormioCfg) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Could not build form engine http client");

        Self {
            base_url: cfg.url.trim_end_matches('/').to_string(),
            email: cfg.email.clone(),
            password: cfg.password.clone(),
            http,
            token: RwLock::new(None),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn ping(&self) -> Result<(), MindtrackError> {
        let res = self.http.get(self.url("status")).send().await?;
        Self::ensure_success(res, "status").await?;

        Ok(())
    }

    pub async fn form(&self, form_id: &str) -> Result<Value, MindtrackError> {
        self.get(&format!("form/{}", form_id)).await
    }

    pub async fn form_exists(&self, form_id: &str) -> Result<bool, MindtrackError> {
        let token = self.token().await?;
        let res = self
            .http
            .get(self.url(&format!("form/{}", form_id)))
            .header(JWT_HEADER, token)
            .send()
            .await?;

        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }

        Self::ensure_success(res, "form").await?;

        Ok(true)
    }

    pub async fn create_submission(&self, form_id: &str, data: &Value) -> Result<Value, MindtrackError> {
        let token = self.token().await?;
        let res = self
            .http
            .post(self.url(&format!("form/{}/submission", form_id)))
            .header(JWT_HEADER, token)
            .json(&json!({ "data": data }))
            .send()
            .await?;

        let res = Self::ensure_success(res, "submission").await?;

        Ok(res.json().await?)
    }

    pub async fn submission(&self, form_id: &str, submission_id: &str) -> Result<Value, MindtrackError> {
        self.get(&format!("form/{}/submission/{}", form_id, submission_id)).await
    }

    pub async fn delete_submission(&self, form_id: &str, submission_id: &str) -> Result<(), MindtrackError> {
        let token = self.token().await?;
        let res = self
            .http
            .delete(self.url(&format!("form/{}/submission/{}", form_id, submission_id)))
            .header(JWT_HEADER, token)
            .send()
            .await?;

        Self::ensure_success(res, "submission").await?;

        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Value, MindtrackError> {
        let token = self.token().await?;
        let res = self.http.get(self.url(path)).header(JWT_HEADER, token).send().await?;
        let res = Self::ensure_success(res, path).await?;

        Ok(res.json().await?)
    }

    async fn token(&self) -> Result<String, MindtrackError> {
        let now = Utc::now();

        if let Some(token) = self.token.read().await.as_ref() {
            if !token.is_expired_at(now) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;

        // another request may have logged in while we waited for the write lock
        if let Some(token) = guard.as_ref() {
            if !token.is_expired_at(now) {
                return Ok(token.value.clone());
            }
        }

        let token = self.login().await?;
        let value = token.value.clone();
        *guard = Some(token);

        Ok(value)
    }

    async fn login(&self) -> Result<JwtToken, MindtrackError> {
        let res = self
            .http
            .post(self.url("user/login"))
            .json(&json!({ "data": { "email": self.email, "password": self.password } }))
            .send()
            .await?;

        let res = Self::ensure_success(res, "user/login").await?;

        let value = res
            .headers()
            .get(JWT_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                MindtrackError::FormEngine("Login response is missing the x-jwt-token header".to_string())
            })?
            .to_string();

        JwtToken::parse(value)
    }

    async fn ensure_success(res: reqwest::Response, path: &str) -> Result<reqwest::Response, MindtrackError> {
        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let snippet = body.chars().take(256).collect::<String>();

        Err(MindtrackError::FormEngine(format!(
            "{} responded with {}: {}",
            path, status, snippet
        )))
    }
}

pub fn submission_id(submission: &Value) -> Result<String, MindtrackError> {
    submission["_id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MindtrackError::FormEngine("Submission response is missing an _id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn formio() -> Formio {
        Formio::new(&FormioCfg {
            url: "http://localhost:3001/".to_string(),
            email: "admin@example.com".to_string(),
            password: "secret".to_string(),
        })
    }

    #[test]
    fn joins_urls_without_double_slashes() {
        let formio = formio();

        assert_eq!(formio.url("status"), "http://localhost:3001/status");
        assert_eq!(formio.url("/form/abc"), "http://localhost:3001/form/abc");
    }

    #[test]
    fn parses_token_expiry() {
        let exp = Utc::now().timestamp() + 3600;
        let token = encode(
            &Header::default(),
            &serde_json::json!({ "exp": exp }),
            &EncodingKey::from_secret(b"not-our-secret"),
        )
        .unwrap();

        let token = JwtToken::parse(token).unwrap();

        assert_eq!(token.expires_at.timestamp(), exp);
        assert!(!token.is_expired_at(Utc::now()));
    }

    #[test]
    fn treats_tokens_within_margin_as_expired() {
        let now = Utc::now();
        let token = JwtToken {
            value: "token".to_string(),
            expires_at: now + TimeDelta::seconds(TOKEN_EXPIRY_MARGIN_SECS - 1),
        };

        assert!(token.is_expired_at(now));
    }

    #[test]
    fn extracts_submission_ids() {
        let submission = serde_json::json!({ "_id": "64f1c0", "data": {} });

        assert_eq!(submission_id(&submission).unwrap(), "64f1c0");
        assert!(submission_id(&serde_json::json!({ "data": {} })).is_err());
    }
}

use crate::utils::logger::log_fatal;
use actix_web::{HttpResponse, ResponseError};
use charybdis::errors::CharybdisError;
use serde_json::json;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum MindtrackError {
    // 400s
    Unauthorized(&'static str),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    ValidationError((String, String)),
    PreconditionFailed(&'static str),
    // 400 | 500
    CharybdisError(CharybdisError),
    // 500
    ClientSessionError(String),
    SerdeError(serde_json::Error),
    FormEngine(String),
    ReqwestError(reqwest::Error),
    EmailError(String),
    ActixError(actix_web::Error),
    InternalServerError(String),
}

impl fmt::Display for MindtrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MindtrackError::Unauthorized(e) => write!(f, "Unauthorized: {}", e),
            MindtrackError::Forbidden(e) => write!(f, "Forbidden: {}", e),
            MindtrackError::NotFound(e) => write!(f, "Not Found: {}", e),
            MindtrackError::Conflict(e) => write!(f, "Conflict: {}", e),
            MindtrackError::ValidationError((field, message)) => {
                write!(f, "Validation Error: {}: {}", field, message)
            }
            MindtrackError::PreconditionFailed(e) => write!(f, "Precondition Failed: {}", e),
            MindtrackError::CharybdisError(e) => write!(f, "Charybdis Error: \n{}", e),
            MindtrackError::ClientSessionError(e) => write!(f, "Session Error: {}", e),
            MindtrackError::SerdeError(e) => write!(f, "Serde Error: \n{}", e),
            MindtrackError::FormEngine(e) => write!(f, "Form Engine Error: {}", e),
            MindtrackError::ReqwestError(e) => write!(f, "Reqwest Error: \n{}", e),
            MindtrackError::EmailError(e) => write!(f, "Email Error: {}", e),
            MindtrackError::ActixError(e) => write!(f, "Actix Error: {}", e),
            MindtrackError::InternalServerError(e) => write!(f, "InternalServerError: \n{}", e),
        }
    }
}

impl Error for MindtrackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MindtrackError::CharybdisError(e) => Some(e),
            MindtrackError::SerdeError(e) => Some(e),
            MindtrackError::ReqwestError(e) => Some(e),
            MindtrackError::ActixError(e) => Some(e),
            _ => None,
        }
    }
}

impl ResponseError for MindtrackError {
    fn error_response(&self) -> HttpResponse {
        match self {
            MindtrackError::Unauthorized(_) => HttpResponse::Unauthorized().json({
                json!({
                    "status": 401,
                    "message": "Unauthorized"
                })
            }),
            MindtrackError::ValidationError((field, message)) => HttpResponse::BadRequest().json(json!({
                "status": 400,
                "message": {field: message}
            })),
            MindtrackError::Forbidden(e) => HttpResponse::Forbidden().json(json!({
                "status": 403,
                "message": e
            })),
            MindtrackError::NotFound(e) => HttpResponse::NotFound().json(json!({
                "status": 404,
                "message": e
            })),
            MindtrackError::Conflict(e) => HttpResponse::Conflict().json(json!({
                "status": 409,
                "message": e
            })),
            MindtrackError::PreconditionFailed(e) => HttpResponse::PreconditionFailed().json(json!({
                "status": 412,
                "message": e
            })),
            MindtrackError::CharybdisError(e) => match e {
                CharybdisError::NotFoundError(e) => HttpResponse::NotFound().json(json!({
                    "status": 404,
                    "message": e.to_string()
                })),
                _ => MindtrackError::InternalServerError(format!("CharybdisError: {}", e)).error_response(),
            },
            _ => {
                log_fatal(self.to_string());

                HttpResponse::InternalServerError().json(json!({
                    "status": 500,
                    "message": self.to_string()
                }))
            }
        }
    }
}

impl From<CharybdisError> for MindtrackError {
    fn from(e: CharybdisError) -> Self {
        MindtrackError::CharybdisError(e)
    }
}

impl From<serde_json::Error> for MindtrackError {
    fn from(e: serde_json::Error) -> Self {
        MindtrackError::SerdeError(e)
    }
}

impl From<reqwest::Error> for MindtrackError {
    fn from(e: reqwest::Error) -> Self {
        MindtrackError::ReqwestError(e)
    }
}

impl From<actix_web::Error> for MindtrackError {
    fn from(e: actix_web::Error) -> Self {
        MindtrackError::ActixError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        let cases = [
            (MindtrackError::Unauthorized("nope"), StatusCode::UNAUTHORIZED),
            (MindtrackError::Forbidden("nope".to_string()), StatusCode::FORBIDDEN),
            (MindtrackError::NotFound("gone".to_string()), StatusCode::NOT_FOUND),
            (MindtrackError::Conflict("done".to_string()), StatusCode::CONFLICT),
            (
                MindtrackError::ValidationError(("email".to_string(), "is taken".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                MindtrackError::PreconditionFailed("deadline"),
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                MindtrackError::FormEngine("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.error_response().status(), status, "{}", error);
        }
    }
}

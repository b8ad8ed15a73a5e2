use actix_web::HttpResponse;

use crate::errors::MindtrackError;

pub type Response = Result<HttpResponse, MindtrackError>;

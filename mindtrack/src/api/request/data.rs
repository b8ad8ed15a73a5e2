use std::future::{ready, Ready};
use std::sync::Arc;

use crate::api::current_user::get_current_user;
use crate::app::App;
use crate::errors::MindtrackError;
use crate::models::user::CurrentUser;
use crate::resources::formio::Formio;
use crate::resources::mailer::Mailer;
use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use scylla::client::caching_session::CachingSession;

/// It contains the data that is required by API endpoints and model callbacks.
#[derive(Clone)]
pub struct RequestData {
    pub app: web::Data<App>,
    pub current_user: CurrentUser,
}

impl RequestData {
    pub fn new(app: web::Data<App>, current_user: CurrentUser) -> Self {
        Self { app, current_user }
    }

    pub fn db_session(&self) -> &CachingSession {
        &self.app.db_session
    }

    pub fn formio(&self) -> &Formio {
        &self.app.formio
    }

    pub fn mailer(&self) -> &Mailer {
        &self.app.mailer
    }

    pub fn mailer_arc(&self) -> Arc<Mailer> {
        self.app.mailer.clone()
    }
}

impl FromRequest for RequestData {
    type Error = MindtrackError;
    type Future = Ready<Result<RequestData, MindtrackError>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let client_session = req.get_session();

        match get_current_user(&client_session) {
            Some(current_user) => {
                let app = req.app_data::<web::Data<App>>();

                match app {
                    Some(app) => {
                        let data = RequestData {
                            app: web::Data::clone(app),
                            current_user,
                        };

                        ready(Ok(data))
                    }
                    None => {
                        let err = MindtrackError::InternalServerError("Could not get app data".to_string());

                        ready(Err(err))
                    }
                }
            }
            None => {
                let error_response =
                    MindtrackError::Unauthorized("You must be logged in to perform this action!");
                ready(Err(error_response))
            }
        }
    }
}

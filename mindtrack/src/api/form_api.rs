use actix_web::{get, web, HttpResponse};

use crate::api::data::RequestData;
use crate::api::types::Response;

#[get("/{form_id}")]
pub async fn get_form(data: RequestData, form_id: web::Path<String>) -> Response {
    let form = data.formio().form(&form_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(form))
}

#[get("/{form_id}/submissions/{submission_id}")]
pub async fn get_form_submission(data: RequestData, path: web::Path<(String, String)>) -> Response {
    data.current_user.ensure_employee()?;

    let (form_id, submission_id) = path.into_inner();
    let submission = data.formio().submission(&form_id, &submission_id).await?;

    Ok(HttpResponse::Ok().json(submission))
}

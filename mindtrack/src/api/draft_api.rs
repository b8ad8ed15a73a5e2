use actix_web::{delete, get, put, web, HttpResponse};
use charybdis::operations::{Delete, Find, InsertWithCallbacks, UpdateWithCallbacks};
use charybdis::types::Uuid;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::api::data::RequestData;
use crate::api::types::Response;
use crate::errors::MindtrackError;
use crate::models::draft::Draft;
use crate::models::task::{Task, TaskState, UpdateStateTask};
use crate::models::traits::Authorization;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraft {
    pub form_id: String,
    pub task_id: Uuid,
    pub payload: serde_json::Value,
}

#[put("")]
pub async fn upsert_draft(data: RequestData, form: web::Json<SaveDraft>) -> Response {
    let form = form.into_inner();

    let task = Task::find_by_id(form.task_id).execute(data.db_session()).await?;

    task.auth_assignee(&data.current_user)?;

    let now = Utc::now();
    task.ensure_accepts_submission_at(now)?;

    if task.form_id != form.form_id {
        return Err(MindtrackError::ValidationError((
            "formId".to_string(),
            "does not match the task".to_string(),
        )));
    }

    let mut draft = Draft {
        form_id: form.form_id,
        user_id: data.current_user.id,
        task_id: task.id,
        payload: form.payload.to_string(),
        created_at: now,
        updated_at: now,
    };

    draft.insert_cb(&data).execute(data.db_session()).await?;

    // the first saved draft marks the task as partially completed
    if task.task_state()? == TaskState::Ready {
        UpdateStateTask {
            id: task.id,
            state: TaskState::PartiallyCompleted.to_string(),
            submission_id: None,
            completed_at: None,
            updated_at: now,
        }
        .update_cb(&data)
        .execute(data.db_session())
        .await?;
    }

    Ok(HttpResponse::Ok().json(draft))
}

#[get("/{form_id}")]
pub async fn get_draft(data: RequestData, form_id: web::Path<String>) -> Response {
    let draft = Draft::find_by_form_id_and_user_id(form_id.into_inner(), data.current_user.id)
        .execute(data.db_session())
        .await?;

    Ok(HttpResponse::Ok().json(draft))
}

#[delete("/{form_id}")]
pub async fn delete_draft(data: RequestData, form_id: web::Path<String>) -> Response {
    Draft {
        form_id: form_id.into_inner(),
        user_id: data.current_user.id,
        ..Default::default()
    }
    .delete()
    .execute(data.db_session())
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Draft deleted" })))
}

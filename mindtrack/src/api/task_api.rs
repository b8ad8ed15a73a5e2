use actix_web::{delete, get, post, put, web, HttpResponse};
use charybdis::operations::{Delete, DeleteWithCallbacks, Find, InsertWithCallbacks, UpdateWithCallbacks};
use charybdis::types::Uuid;
use chrono::Utc;
use futures::StreamExt;
use log::error;
use serde_json::json;

use crate::api::data::RequestData;
use crate::api::types::Response;
use crate::models::draft::Draft;
use crate::models::task::{
    Task, TaskDashboard, TaskState, UpdateAssigneeTask, UpdateDetailsTask, UpdateStateTask,
};
use crate::models::traits::Authorization;
use crate::resources::formio;

#[post("")]
pub async fn create_task(data: RequestData, task: web::Json<Task>) -> Response {
    data.current_user.ensure_employee()?;

    let mut task = task.into_inner();

    task.insert_cb(&data).execute(data.db_session()).await?;

    Ok(HttpResponse::Created().json(task))
}

#[get("/dashboard")]
pub async fn get_dashboard(data: RequestData) -> Response {
    data.current_user.ensure_employee()?;

    let mut tasks = Task::find_by_author_id(data.current_user.id)
        .execute(data.db_session())
        .await?;

    let now = Utc::now();
    let mut dashboard = TaskDashboard::default();

    while let Some(task) = tasks.next().await {
        dashboard.record(&task?, now)?;
    }

    Ok(HttpResponse::Ok().json(dashboard))
}

#[get("/assigned")]
pub async fn get_assigned_tasks(data: RequestData) -> Response {
    let tasks = Task::find_by_assignee_id(data.current_user.id)
        .execute(data.db_session())
        .await?
        .try_collect()
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

#[get("/authored")]
pub async fn get_authored_tasks(data: RequestData) -> Response {
    data.current_user.ensure_employee()?;

    let tasks = Task::find_by_author_id(data.current_user.id)
        .execute(data.db_session())
        .await?
        .try_collect()
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

#[get("/{id}")]
pub async fn get_task(data: RequestData, id: web::Path<Uuid>) -> Response {
    let task = Task::find_by_id(*id).execute(data.db_session()).await?;

    task.auth_view(&data.current_user)?;

    Ok(HttpResponse::Ok().json(task))
}

#[put("/details")]
pub async fn update_details(data: RequestData, task: web::Json<UpdateDetailsTask>) -> Response {
    let mut task = task.into_inner();

    let native = Task::find_by_id(task.id).execute(data.db_session()).await?;

    native.auth_author(&data.current_user)?;
    native.ensure_editable()?;

    // deadlines only have to be in the future when they actually change
    if task.deadline != native.deadline {
        Task::validate_deadline_at(&task.deadline, Utc::now())?;
    }

    task.update_cb(&data).execute(data.db_session()).await?;

    Ok(HttpResponse::Ok().json(task))
}

#[put("/assignee")]
pub async fn update_assignee(data: RequestData, task: web::Json<UpdateAssigneeTask>) -> Response {
    let mut task = task.into_inner();

    let native = Task::find_by_id(task.id).execute(data.db_session()).await?;

    native.auth_author(&data.current_user)?;
    native.ensure_assignable()?;

    task.update_cb(&data).execute(data.db_session()).await?;

    if let Some(assignee) = &task.assignee {
        native.notify_assignee(&data, assignee.clone());
    }

    Ok(HttpResponse::Ok().json(task))
}

#[post("/{id}/submission")]
pub async fn create_submission(
    data: RequestData,
    id: web::Path<Uuid>,
    payload: web::Json<serde_json::Value>,
) -> Response {
    let task = Task::find_by_id(*id).execute(data.db_session()).await?;

    task.auth_assignee(&data.current_user)?;

    let now = Utc::now();
    task.ensure_accepts_submission_at(now)?;

    let submission = data.formio().create_submission(&task.form_id, &payload).await?;
    let submission_id = formio::submission_id(&submission)?;

    let mut update = UpdateStateTask {
        id: task.id,
        state: TaskState::Completed.to_string(),
        submission_id: Some(submission_id),
        completed_at: Some(now),
        updated_at: now,
    };

    update.update_cb(&data).execute(data.db_session()).await?;

    Draft {
        form_id: task.form_id.clone(),
        user_id: data.current_user.id,
        ..Default::default()
    }
    .delete()
    .execute(data.db_session())
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "task": update,
        "submission": submission,
    })))
}

#[get("/{id}/export")]
pub async fn export_task(data: RequestData, id: web::Path<Uuid>) -> Response {
    let task = Task::find_by_id(*id).execute(data.db_session()).await?;

    task.auth_author(&data.current_user)?;

    let submission = match &task.submission_id {
        Some(submission_id) => Some(data.formio().submission(&task.form_id, submission_id).await?),
        None => None,
    };

    Ok(HttpResponse::Ok().json(json!({
        "task": task,
        "submission": submission,
    })))
}

#[delete("/{id}")]
pub async fn delete_task(data: RequestData, id: web::Path<Uuid>) -> Response {
    let mut task = Task::find_by_id(*id).execute(data.db_session()).await?;

    task.auth_author(&data.current_user)?;

    // submission removal on the form engine is best effort, the task row is the source of truth
    if let Some(submission_id) = &task.submission_id {
        let _ = data
            .formio()
            .delete_submission(&task.form_id, submission_id)
            .await
            .map_err(|e| error!("Could not delete submission {}: {}", submission_id, e));
    }

    if let Some(assignee_id) = task.assignee_id {
        Draft {
            form_id: task.form_id.clone(),
            user_id: assignee_id,
            ..Default::default()
        }
        .delete()
        .execute(data.db_session())
        .await?;
    }

    task.delete_cb(&data).execute(data.db_session()).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted" })))
}

use actix_session::Session;
use actix_web::{delete, get, post, put, web, HttpResponse};
use charybdis::operations::{DeleteWithCallbacks, Find, InsertWithCallbacks, UpdateWithCallbacks};
use charybdis::types::Uuid;
use scylla::client::caching_session::CachingSession;
use serde::Deserialize;
use serde_json::json;

use crate::api::current_user::{refresh_current_user, remove_current_user, set_current_user};
use crate::api::data::RequestData;
use crate::api::types::Response;
use crate::errors::MindtrackError;
use crate::models::user::{CurrentUser, ShowUser, UpdateProfileUser, User};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[post("/login")]
pub async fn login(
    client_session: Session,
    db_session: web::Data<CachingSession>,
    login_form: web::Json<LoginForm>,
) -> Response {
    let user = User::maybe_find_first_by_email(login_form.email.clone())
        .execute(&db_session)
        .await?
        .ok_or_else(|| MindtrackError::NotFound("Not found".to_string()))?;

    if user.is_blocked || !user.verify_password(&login_form.password).await? {
        return Err(MindtrackError::NotFound("Not found".to_string()));
    }

    let current_user = CurrentUser::from_user(user);

    set_current_user(&client_session, &current_user)?;

    Ok(HttpResponse::Ok().json(current_user))
}

#[get("/sync")]
pub async fn sync(data: RequestData, client_session: Session) -> Response {
    let current_user = data
        .current_user
        .find_by_primary_key()
        .execute(data.db_session())
        .await?;

    set_current_user(&client_session, &current_user)?;

    Ok(HttpResponse::Ok().json(current_user))
}

#[delete("/logout")]
pub async fn logout(client_session: Session) -> Response {
    client_session.clear();

    Ok(HttpResponse::Ok().finish())
}

#[post("")]
pub async fn create_user(data: RequestData, user: web::Json<User>) -> Response {
    data.current_user.ensure_employee()?;

    let mut user = user.into_inner();

    user.insert_cb(&data.app).execute(data.db_session()).await?;

    Ok(HttpResponse::Created().json(CurrentUser::from_user(user)))
}

#[get("/{id}")]
pub async fn get_user(data: RequestData, id: web::Path<Uuid>) -> Response {
    let user = ShowUser::find_by_id(*id).execute(data.db_session()).await?;

    Ok(HttpResponse::Ok().json(user))
}

#[put("/profile")]
pub async fn update_profile(
    data: RequestData,
    client_session: Session,
    user: web::Json<UpdateProfileUser>,
) -> Response {
    let mut user = user.into_inner();

    if user.id != data.current_user.id {
        return Err(MindtrackError::Unauthorized("Not authorized to update user!"));
    }

    user.update_cb(&data).execute(data.db_session()).await?;

    refresh_current_user(&client_session, data.db_session()).await?;

    Ok(HttpResponse::Ok().json(user))
}

#[delete("/{id}")]
pub async fn delete_user(data: RequestData, id: web::Path<Uuid>, client_session: Session) -> Response {
    let id = id.into_inner();

    if id != data.current_user.id {
        data.current_user.ensure_employee()?;
    }

    let mut user = User::find_by_id(id).execute(data.db_session()).await?;

    user.delete_cb(&data.app).execute(data.db_session()).await?;

    if id == data.current_user.id {
        remove_current_user(&client_session);
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "User deleted" })))
}

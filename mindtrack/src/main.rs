mod api;
mod app;
mod errors;
mod models;
mod resources;
mod tasks;
mod utils;

use actix_web::middleware::Logger;
use actix_web::{web, App as ActixWebApp, HttpServer};
use api::data::RequestData;
use api::*;
use app::App;

#[tokio::main]
async fn main() {
    let app = App::new().await.unwrap_or_else(|e| panic!("Could not initialize app.\n{}", e));
    let port = app.port();

    let app_web_data = web::Data::new(app);
    app_web_data.init().await;

    tasks::deadline_reminder_task(RequestData::new(app_web_data.clone(), Default::default())).await;

    let db_session_web_data = web::Data::from(app_web_data.db_session.clone());

    HttpServer::new(move || {
        ActixWebApp::new()
            .wrap(Logger::new("%a %r %s %b %{Referer}i %{User-Agent}i %T"))
            .wrap(app_web_data.cors())
            .wrap(app_web_data.session_middleware())
            .app_data(app_web_data.clone())
            .app_data(db_session_web_data.clone())
            .service(
                web::scope("/sessions")
                    .service(login)
                    .service(sync)
                    .service(logout),
            )
            .service(
                web::scope("/users")
                    .service(create_user)
                    .service(update_profile)
                    .service(get_user)
                    .service(delete_user),
            )
            .service(
                web::scope("/tasks")
                    .service(get_dashboard)
                    .service(get_assigned_tasks)
                    .service(get_authored_tasks)
                    .service(create_task)
                    .service(update_details)
                    .service(update_assignee)
                    .service(create_submission)
                    .service(export_task)
                    .service(get_task)
                    .service(delete_task),
            )
            .service(
                web::scope("/drafts")
                    .service(upsert_draft)
                    .service(get_draft)
                    .service(delete_draft),
            )
            .service(
                web::scope("/forms")
                    .service(get_form)
                    .service(get_form_submission),
            )
    })
    .bind(("0.0.0.0", port))
    .unwrap_or_else(|e| panic!("Could not bind to port {}.\n{}", port, e))
    .run()
    .await
    .unwrap_or_else(|e| panic!("Could not run server on port {}.\n{}", port, e));
}

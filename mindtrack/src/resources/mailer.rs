use crate::errors::MindtrackError;
use crate::resources::email_client::EmailClient;
use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use std::collections::HashMap;

const TASK_ASSIGNED_EMAIL: &str = "task_assigned_email";
const DEADLINE_REMINDER_EMAIL: &str = "deadline_reminder_email";
const ACCOUNT_CREATED_EMAIL: &str = "account_created_email";

const DUE_AT_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

pub struct Mailer {
    pub templates: Handlebars<'static>,
    pub client_url: String,
    pub email_client: EmailClient,
}

impl Mailer {
    pub fn new(email_client: EmailClient, client_url: String) -> Self {
        let mut templates = Handlebars::new();

        templates
            .register_template_string(TASK_ASSIGNED_EMAIL, include_str!("./mailer/task_assigned_email.html"))
            .expect("Template should be valid");

        templates
            .register_template_string(
                DEADLINE_REMINDER_EMAIL,
                include_str!("./mailer/deadline_reminder_email.html"),
            )
            .expect("Template should be valid");

        templates
            .register_template_string(ACCOUNT_CREATED_EMAIL, include_str!("./mailer/account_created_email.html"))
            .expect("Template should be valid");

        Self {
            templates,
            client_url,
            email_client,
        }
    }

    pub async fn send_task_assigned_email(
        &self,
        to: String,
        assignee_name: &str,
        task_title: &str,
        due_at: Option<DateTime<Utc>>,
    ) -> Result<(), MindtrackError> {
        let tasks_url = format!("{}/tasks", self.client_url);
        let due_at = due_at.map(|due_at| due_at.format(DUE_AT_FORMAT).to_string()).unwrap_or_default();

        let mut ctx = HashMap::<&str, &str>::new();
        ctx.insert("assignee_name", assignee_name);
        ctx.insert("task_title", task_title);
        ctx.insert("tasks_url", &tasks_url);
        ctx.insert("due_at", &due_at);

        let message = self.render(TASK_ASSIGNED_EMAIL, &ctx)?;

        self.email_client
            .send_email(to, "A new questionnaire is waiting for you", message)
            .await
    }

    pub async fn send_deadline_reminder_email(
        &self,
        to: String,
        assignee_name: &str,
        task_title: &str,
        due_at: DateTime<Utc>,
    ) -> Result<(), MindtrackError> {
        let tasks_url = format!("{}/tasks", self.client_url);
        let due_at = due_at.format(DUE_AT_FORMAT).to_string();

        let mut ctx = HashMap::<&str, &str>::new();
        ctx.insert("assignee_name", assignee_name);
        ctx.insert("task_title", task_title);
        ctx.insert("tasks_url", &tasks_url);
        ctx.insert("due_at", &due_at);

        let message = self.render(DEADLINE_REMINDER_EMAIL, &ctx)?;

        self.email_client
            .send_email(to, "A questionnaire is due soon", message)
            .await
    }

    pub async fn send_account_created_email(
        &self,
        to: String,
        name: &str,
        password: &str,
    ) -> Result<(), MindtrackError> {
        let mut ctx = HashMap::<&str, &str>::new();
        ctx.insert("name", name);
        ctx.insert("login_url", &self.client_url);
        ctx.insert("password", password);

        let message = self.render(ACCOUNT_CREATED_EMAIL, &ctx)?;

        self.email_client
            .send_email(to, "Your mindtrack account", message)
            .await
    }

    fn render(&self, template: &str, ctx: &HashMap<&str, &str>) -> Result<String, MindtrackError> {
        self.templates
            .render(template, ctx)
            .map_err(|e| MindtrackError::EmailError(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> Mailer {
        Mailer::new(EmailClient::Noop, "http://localhost:3000".to_string())
    }

    #[tokio::test]
    async fn renders_and_delivers_assignment_email() {
        let mailer = mailer();

        mailer
            .send_task_assigned_email(
                "client@example.com".to_string(),
                "Jo Client",
                "Weekly mood check-in",
                Some(Utc::now()),
            )
            .await
            .unwrap();
    }

    #[test]
    fn renders_reminder_template_with_context() {
        let mailer = mailer();

        let mut ctx = HashMap::<&str, &str>::new();
        ctx.insert("assignee_name", "Jo Client");
        ctx.insert("task_title", "Weekly mood check-in");
        ctx.insert("tasks_url", "http://localhost:3000/tasks");
        ctx.insert("due_at", "2026-01-01 09:00 UTC");

        let message = mailer.render(DEADLINE_REMINDER_EMAIL, &ctx).unwrap();

        assert!(message.contains("Jo Client"));
        assert!(message.contains("Weekly mood check-in"));
        assert!(message.contains("2026-01-01 09:00 UTC"));
    }
}

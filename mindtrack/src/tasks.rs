use crate::api::data::RequestData;
use crate::errors::MindtrackError;
use crate::models::task::{Task, TaskState, UpdateReminderTask};
use charybdis::operations::{Find, Update};
use chrono::{DateTime, TimeDelta, Utc};
use futures::StreamExt;
use log::{error, info};
use std::time::Duration;
use tokio::time;

pub async fn deadline_reminder_task(data: RequestData) {
    let interval_sec = data.app.config.reminder.interval_min * 60;
    let mut reminder_interval = time::interval(Duration::from_secs(interval_sec));

    tokio::spawn(async move {
        loop {
            reminder_interval.tick().await;

            match run_reminder_sweep(&data).await {
                Ok(sent) => info!("Reminder sweep ran, {} reminders sent", sent),
                Err(e) => error!("Reminder sweep failed: {:?}", e),
            }
        }
    });
}

pub(crate) fn needs_reminder(task: &Task, now: DateTime<Utc>, lead_hours: i64) -> bool {
    if task.reminder_sent_at.is_some() {
        return false;
    }

    let Some(deadline) = &task.deadline else {
        return false;
    };

    deadline.due_at > now && deadline.due_at <= now + TimeDelta::hours(lead_hours)
}

async fn run_reminder_sweep(data: &RequestData) -> Result<u32, MindtrackError> {
    let now = Utc::now();
    let lead_hours = data.app.config.reminder.lead_hours;
    let mut sent = 0;

    for state in [TaskState::Ready, TaskState::PartiallyCompleted] {
        let mut tasks = Task::find_by_state(state.to_string())
            .execute(data.db_session())
            .await?;

        while let Some(task) = tasks.next().await {
            let task = task?;

            if !needs_reminder(&task, now, lead_hours) {
                continue;
            }

            let Some(assignee) = &task.assignee else {
                continue;
            };

            let Some(deadline) = &task.deadline else {
                continue;
            };

            {
                let delivery = data
                    .mailer()
                    .send_deadline_reminder_email(assignee.email.clone(), &assignee.name, &task.title, deadline.due_at)
                    .await;

                if let Err(e) = delivery {
                    error!("Could not send reminder for task {}: {}", task.id, e);
                    continue;
                }
            }

            UpdateReminderTask {
                id: task.id,
                reminder_sent_at: Some(now),
                updated_at: now,
            }
            .update()
            .execute(data.db_session())
            .await?;

            sent += 1;
        }
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::udts::Deadline;

    fn open_task(due_in_hours: i64, reminded: bool) -> Task {
        Task {
            state: TaskState::Ready.to_string(),
            deadline: Some(Deadline {
                due_at: Utc::now() + TimeDelta::hours(due_in_hours),
                completable_after: false,
            }),
            reminder_sent_at: reminded.then(Utc::now),
            ..Default::default()
        }
    }

    #[test]
    fn reminds_only_inside_the_lead_window() {
        let now = Utc::now();

        assert!(needs_reminder(&open_task(2, false), now, 24));
        assert!(!needs_reminder(&open_task(48, false), now, 24));
        // already past due, a reminder would be pointless
        assert!(!needs_reminder(&open_task(-1, false), now, 24));
    }

    #[test]
    fn reminds_at_most_once() {
        let now = Utc::now();

        assert!(!needs_reminder(&open_task(2, true), now, 24));
    }

    #[test]
    fn tasks_without_deadlines_are_never_reminded() {
        let task = Task {
            state: TaskState::Ready.to_string(),
            ..Default::default()
        };

        assert!(!needs_reminder(&task, Utc::now(), 24));
    }
}

use crate::api::data::RequestData;
use crate::errors::MindtrackError;
use crate::models::traits::SanitizeDescription;
use crate::models::udts::{Deadline, Profile};
use crate::models::user::{User, UserRole};
use charybdis::callbacks::Callbacks;
use charybdis::errors::CharybdisError;
use charybdis::macros::charybdis_model;
use charybdis::operations::Find;
use charybdis::types::{Frozen, Text, Timestamp, Uuid};
use chrono::{DateTime, Utc};
use log::error;
use macros::Ownership;
use scylla::client::caching_session::CachingSession;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    #[default]
    Uncompleted,
    Ready,
    PartiallyCompleted,
    Completed,
}

impl TaskState {
    pub fn initial(has_assignee: bool) -> Self {
        if has_assignee {
            Self::Ready
        } else {
            Self::Uncompleted
        }
    }

    pub fn can_assign(&self) -> bool {
        matches!(self, Self::Uncompleted | Self::Ready)
    }
}

#[charybdis_model(
    table_name = tasks,
    partition_keys = [id],
    clustering_keys = [],
    global_secondary_indexes = [author_id, assignee_id, state],
)]
#[derive(Serialize, Deserialize, Default, Clone, Ownership)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Uuid,

    pub title: Text,
    pub description: Option<Text>,
    pub form_id: Text,

    #[serde(default)]
    pub state: Text,

    #[serde(default)]
    pub author_id: Uuid,
    pub author: Option<Frozen<Profile>>,

    pub assignee_id: Option<Uuid>,
    pub assignee: Option<Frozen<Profile>>,

    pub deadline: Option<Frozen<Deadline>>,

    pub submission_id: Option<Text>,
    pub completed_at: Option<Timestamp>,
    pub reminder_sent_at: Option<Timestamp>,

    #[serde(default = "chrono::Utc::now")]
    pub created_at: Timestamp,

    #[serde(default = "chrono::Utc::now")]
    pub updated_at: Timestamp,
}

impl Task {
    pub fn task_state(&self) -> Result<TaskState, MindtrackError> {
        TaskState::from_str(&self.state)
            .map_err(|_| MindtrackError::InternalServerError(format!("Unknown task state: {}", self.state)))
    }

    /// Updates of title/description/deadline are off the table once the linked submission exists.
    pub fn ensure_editable(&self) -> Result<(), MindtrackError> {
        if self.task_state()? == TaskState::Completed {
            return Err(MindtrackError::Conflict("Task is already completed".to_string()));
        }

        Ok(())
    }

    pub fn ensure_assignable(&self) -> Result<(), MindtrackError> {
        if !self.task_state()?.can_assign() {
            return Err(MindtrackError::Conflict(
                "Task has already been worked on".to_string(),
            ));
        }

        Ok(())
    }

    /// Guards both draft saves and final submissions. The linked submission id is written
    /// exactly once because a `Completed` task never passes this check again.
    pub fn ensure_accepts_submission_at(&self, now: DateTime<Utc>) -> Result<(), MindtrackError> {
        match self.task_state()? {
            TaskState::Completed => {
                return Err(MindtrackError::Conflict("Task is already completed".to_string()));
            }
            TaskState::Uncompleted => {
                return Err(MindtrackError::PreconditionFailed("Task is not assigned yet"));
            }
            TaskState::Ready | TaskState::PartiallyCompleted => {}
        }

        if let Some(deadline) = &self.deadline {
            if !deadline.accepts_submission_at(now) {
                return Err(MindtrackError::PreconditionFailed("Task deadline has passed"));
            }
        }

        Ok(())
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        if matches!(self.task_state(), Ok(TaskState::Completed)) {
            return false;
        }

        match &self.deadline {
            Some(deadline) => deadline.is_past_due(now),
            None => false,
        }
    }

    pub(crate) fn validate_deadline_at(
        deadline: &Option<Frozen<Deadline>>,
        now: DateTime<Utc>,
    ) -> Result<(), MindtrackError> {
        if let Some(deadline) = deadline {
            if deadline.due_at <= now {
                return Err(MindtrackError::ValidationError((
                    "deadline".to_string(),
                    "must be in the future".to_string(),
                )));
            }
        }

        Ok(())
    }

    pub(crate) async fn assignee_user(
        db_session: &CachingSession,
        assignee_id: Uuid,
    ) -> Result<User, MindtrackError> {
        let user = match User::find_by_id(assignee_id).execute(db_session).await {
            Ok(user) => user,
            Err(CharybdisError::NotFoundError(_)) => {
                return Err(MindtrackError::ValidationError((
                    "assigneeId".to_string(),
                    "does not exist".to_string(),
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if user.role()? != UserRole::Client {
            return Err(MindtrackError::ValidationError((
                "assigneeId".to_string(),
                "must be a client account".to_string(),
            )));
        }

        Ok(user)
    }

    pub(crate) fn notify_assignee(&self, data: &RequestData, assignee: Profile) {
        let mailer = data.mailer_arc();
        let title = self.title.clone();
        let due_at = self.deadline.as_ref().map(|deadline| deadline.due_at);

        tokio::spawn(async move {
            let _ = mailer
                .send_task_assigned_email(assignee.email.clone(), &assignee.name, &title, due_at)
                .await
                .map_err(|e| error!("Error while sending assignment email: {}", e));
        });
    }
}

impl Callbacks for Task {
    type Extension = RequestData;
    type Error = MindtrackError;

    async fn before_insert(&mut self, db_session: &CachingSession, data: &RequestData) -> Result<(), MindtrackError> {
        let now = Utc::now();

        self.id = Uuid::new_v4();
        self.created_at = now;
        self.updated_at = now;
        self.author_id = data.current_user.id;
        self.author = Some(Profile::init_from_current_user(&data.current_user));
        self.submission_id = None;
        self.completed_at = None;
        self.reminder_sent_at = None;

        if self.title.trim().is_empty() {
            return Err(MindtrackError::ValidationError((
                "title".to_string(),
                "can't be blank".to_string(),
            )));
        }

        self.description.sanitize()?;
        Self::validate_deadline_at(&self.deadline, now)?;

        if !data.formio().form_exists(&self.form_id).await? {
            return Err(MindtrackError::ValidationError((
                "formId".to_string(),
                "does not exist on the form engine".to_string(),
            )));
        }

        match self.assignee_id {
            Some(assignee_id) => {
                let assignee = Self::assignee_user(db_session, assignee_id).await?;
                self.assignee = Some(Profile::init(&assignee));
            }
            None => self.assignee = None,
        }

        self.state = TaskState::initial(self.assignee_id.is_some()).to_string();

        Ok(())
    }

    async fn after_insert(&mut self, _db_session: &CachingSession, data: &RequestData) -> Result<(), MindtrackError> {
        if let Some(assignee) = &self.assignee {
            self.notify_assignee(data, assignee.clone());
        }

        Ok(())
    }
}

partial_task!(UpdateDetailsTask, id, title, description, deadline, updated_at);

impl Callbacks for UpdateDetailsTask {
    type Extension = RequestData;
    type Error = MindtrackError;

    async fn before_update(&mut self, _db_session: &CachingSession, _data: &RequestData) -> Result<(), MindtrackError> {
        self.updated_at = Utc::now();

        if self.title.trim().is_empty() {
            return Err(MindtrackError::ValidationError((
                "title".to_string(),
                "can't be blank".to_string(),
            )));
        }

        self.description.sanitize()?;

        Ok(())
    }
}

partial_task!(UpdateAssigneeTask, id, assignee_id, assignee, state, updated_at);

impl Callbacks for UpdateAssigneeTask {
    type Extension = RequestData;
    type Error = MindtrackError;

    async fn before_update(&mut self, db_session: &CachingSession, _data: &RequestData) -> Result<(), MindtrackError> {
        self.updated_at = Utc::now();

        let assignee_id = self.assignee_id.ok_or_else(|| {
            MindtrackError::ValidationError(("assigneeId".to_string(), "can't be blank".to_string()))
        })?;

        let assignee = Task::assignee_user(db_session, assignee_id).await?;

        self.assignee = Some(Profile::init(&assignee));
        self.state = TaskState::Ready.to_string();

        Ok(())
    }
}

partial_task!(UpdateStateTask, id, state, submission_id, completed_at, updated_at);

impl Callbacks for UpdateStateTask {
    type Extension = RequestData;
    type Error = MindtrackError;

    async fn before_update(&mut self, _db_session: &CachingSession, _data: &RequestData) -> Result<(), MindtrackError> {
        self.updated_at = Utc::now();

        Ok(())
    }
}

partial_task!(UpdateReminderTask, id, reminder_sent_at, updated_at);

#[derive(Serialize, Default, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TaskDashboard {
    pub total: u32,
    pub uncompleted: u32,
    pub ready: u32,
    pub partially_completed: u32,
    pub completed: u32,
    pub overdue: u32,
}

impl TaskDashboard {
    pub fn record(&mut self, task: &Task, now: DateTime<Utc>) -> Result<(), MindtrackError> {
        self.total += 1;

        match task.task_state()? {
            TaskState::Uncompleted => self.uncompleted += 1,
            TaskState::Ready => self.ready += 1,
            TaskState::PartiallyCompleted => self.partially_completed += 1,
            TaskState::Completed => self.completed += 1,
        }

        if task.is_overdue_at(now) {
            self.overdue += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn task(state: TaskState, deadline: Option<Deadline>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Weekly mood check-in".to_string(),
            form_id: "moodCheckIn".to_string(),
            state: state.to_string(),
            deadline,
            ..Default::default()
        }
    }

    fn past_deadline(completable_after: bool) -> Deadline {
        Deadline {
            due_at: Utc::now() - TimeDelta::hours(2),
            completable_after,
        }
    }

    fn future_deadline() -> Deadline {
        Deadline {
            due_at: Utc::now() + TimeDelta::hours(2),
            completable_after: false,
        }
    }

    #[test]
    fn states_round_trip_through_storage_text() {
        for state in [
            TaskState::Uncompleted,
            TaskState::Ready,
            TaskState::PartiallyCompleted,
            TaskState::Completed,
        ] {
            assert_eq!(TaskState::from_str(&state.to_string()).unwrap(), state);
        }

        assert_eq!(TaskState::PartiallyCompleted.to_string(), "PARTIALLY_COMPLETED");
        assert!(task(TaskState::Ready, None).task_state().is_ok());
    }

    #[test]
    fn initial_state_depends_on_assignment() {
        assert_eq!(TaskState::initial(false), TaskState::Uncompleted);
        assert_eq!(TaskState::initial(true), TaskState::Ready);
    }

    #[test]
    fn assignment_is_only_possible_before_any_work() {
        assert!(task(TaskState::Uncompleted, None).ensure_assignable().is_ok());
        assert!(task(TaskState::Ready, None).ensure_assignable().is_ok());
        assert!(task(TaskState::PartiallyCompleted, None).ensure_assignable().is_err());
        assert!(task(TaskState::Completed, None).ensure_assignable().is_err());
    }

    #[test]
    fn submissions_require_an_assigned_open_task() {
        let now = Utc::now();

        assert!(matches!(
            task(TaskState::Uncompleted, None).ensure_accepts_submission_at(now),
            Err(MindtrackError::PreconditionFailed(_))
        ));
        assert!(matches!(
            task(TaskState::Completed, None).ensure_accepts_submission_at(now),
            Err(MindtrackError::Conflict(_))
        ));
        assert!(task(TaskState::Ready, None).ensure_accepts_submission_at(now).is_ok());
        assert!(task(TaskState::PartiallyCompleted, None)
            .ensure_accepts_submission_at(now)
            .is_ok());
    }

    #[test]
    fn deadlines_block_late_submissions_unless_flagged() {
        let now = Utc::now();

        assert!(matches!(
            task(TaskState::Ready, Some(past_deadline(false))).ensure_accepts_submission_at(now),
            Err(MindtrackError::PreconditionFailed(_))
        ));
        assert!(task(TaskState::Ready, Some(past_deadline(true)))
            .ensure_accepts_submission_at(now)
            .is_ok());
        assert!(task(TaskState::Ready, Some(future_deadline()))
            .ensure_accepts_submission_at(now)
            .is_ok());
    }

    #[test]
    fn completed_tasks_reject_edits() {
        assert!(task(TaskState::Completed, None).ensure_editable().is_err());
        assert!(task(TaskState::PartiallyCompleted, None).ensure_editable().is_ok());
    }

    #[test]
    fn new_deadlines_must_be_in_the_future() {
        let now = Utc::now();

        assert!(Task::validate_deadline_at(&Some(future_deadline()), now).is_ok());
        assert!(Task::validate_deadline_at(&Some(past_deadline(true)), now).is_err());
        assert!(Task::validate_deadline_at(&None, now).is_ok());
    }

    #[test]
    fn overdue_tracks_open_tasks_past_due() {
        let now = Utc::now();

        assert!(task(TaskState::Ready, Some(past_deadline(false))).is_overdue_at(now));
        assert!(task(TaskState::PartiallyCompleted, Some(past_deadline(true))).is_overdue_at(now));
        assert!(!task(TaskState::Completed, Some(past_deadline(false))).is_overdue_at(now));
        assert!(!task(TaskState::Ready, Some(future_deadline())).is_overdue_at(now));
        assert!(!task(TaskState::Ready, None).is_overdue_at(now));
    }

    #[test]
    fn dashboard_counts_states_and_overdue() {
        let now = Utc::now();
        let mut dashboard = TaskDashboard::default();

        dashboard.record(&task(TaskState::Uncompleted, None), now).unwrap();
        dashboard.record(&task(TaskState::Ready, Some(past_deadline(false))), now).unwrap();
        dashboard
            .record(&task(TaskState::PartiallyCompleted, None), now)
            .unwrap();
        dashboard
            .record(&task(TaskState::Completed, Some(past_deadline(false))), now)
            .unwrap();

        assert_eq!(
            dashboard,
            TaskDashboard {
                total: 4,
                uncompleted: 1,
                ready: 1,
                partially_completed: 1,
                completed: 1,
                overdue: 1,
            }
        );
    }
}

use charybdis::macros::charybdis_udt_model;
use charybdis::types::{Boolean, Timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Default, Clone, PartialEq)]
#[charybdis_udt_model(type_name = deadline)]
#[serde(rename_all = "camelCase")]
pub struct Deadline {
    pub due_at: Timestamp,
    pub completable_after: Boolean,
}

impl Deadline {
    /// Whether a submission may still be accepted at `now`.
    pub fn accepts_submission_at(&self, now: DateTime<Utc>) -> bool {
        self.completable_after || now <= self.due_at
    }

    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        now > self.due_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn accepts_submissions_until_due() {
        let now = Utc::now();
        let deadline = Deadline {
            due_at: now + TimeDelta::hours(1),
            completable_after: false,
        };

        assert!(deadline.accepts_submission_at(now));
        assert!(!deadline.is_past_due(now));
    }

    #[test]
    fn rejects_late_submissions_unless_flagged() {
        let now = Utc::now();
        let due_at = now - TimeDelta::hours(1);

        let strict = Deadline {
            due_at,
            completable_after: false,
        };
        let lenient = Deadline {
            due_at,
            completable_after: true,
        };

        assert!(!strict.accepts_submission_at(now));
        assert!(lenient.accepts_submission_at(now));
        assert!(strict.is_past_due(now));
        assert!(lenient.is_past_due(now));
    }
}

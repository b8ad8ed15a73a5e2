use crate::api::data::RequestData;
use crate::errors::MindtrackError;
use charybdis::callbacks::Callbacks;
use charybdis::macros::charybdis_model;
use charybdis::types::{Text, Timestamp, Uuid};
use chrono::Utc;
use scylla::client::caching_session::CachingSession;
use serde::{Deserialize, Serialize};

/// In-progress form payload, one row per (form, user). Saving is an upsert,
/// submitting or an explicit delete removes the row.
#[charybdis_model(
    table_name = drafts,
    partition_keys = [form_id],
    clustering_keys = [user_id],
)]
#[derive(Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub form_id: Text,

    #[serde(default)]
    pub user_id: Uuid,

    #[serde(default)]
    pub task_id: Uuid,

    pub payload: Text,

    #[serde(default = "chrono::Utc::now")]
    pub created_at: Timestamp,

    #[serde(default = "chrono::Utc::now")]
    pub updated_at: Timestamp,
}

impl Callbacks for Draft {
    type Extension = RequestData;
    type Error = MindtrackError;

    async fn before_insert(&mut self, _db_session: &CachingSession, data: &RequestData) -> Result<(), MindtrackError> {
        let now = Utc::now();

        self.user_id = data.current_user.id;
        self.created_at = now;
        self.updated_at = now;

        serde_json::from_str::<serde_json::Value>(&self.payload).map_err(|_| {
            MindtrackError::ValidationError(("payload".to_string(), "is not valid JSON".to_string()))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let draft = Draft {
            form_id: "moodCheckIn".to_string(),
            user_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            payload: r#"{"mood":7}"#.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&draft).unwrap();

        assert_eq!(json["formId"], "moodCheckIn");
        assert_eq!(json["payload"], r#"{"mood":7}"#);
        assert!(json.get("form_id").is_none());
    }
}

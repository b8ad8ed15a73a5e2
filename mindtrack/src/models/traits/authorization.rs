use crate::errors::MindtrackError;
use crate::models::user::CurrentUser;
use charybdis::types::Uuid;

/// Field accessors are implemented with the `Ownership` derive macro.
pub trait OwnershipFields {
    fn author_id(&self) -> Uuid;

    fn assignee_id(&self) -> Option<Uuid>;
}

pub trait Authorization: OwnershipFields {
    fn auth_author(&self, current_user: &CurrentUser) -> Result<(), MindtrackError> {
        if self.author_id() != current_user.id {
            return Err(MindtrackError::Unauthorized(
                "You are not allowed to perform this action!",
            ));
        }

        Ok(())
    }

    fn auth_assignee(&self, current_user: &CurrentUser) -> Result<(), MindtrackError> {
        if self.assignee_id() != Some(current_user.id) {
            return Err(MindtrackError::Unauthorized(
                "You are not allowed to perform this action!",
            ));
        }

        Ok(())
    }

    fn auth_view(&self, current_user: &CurrentUser) -> Result<(), MindtrackError> {
        self.auth_author(current_user)
            .or_else(|_| self.auth_assignee(current_user))
    }
}

impl<T: OwnershipFields> Authorization for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use macros::Ownership;

    #[derive(Ownership)]
    #[allow(dead_code)]
    struct Row {
        author_id: Uuid,
        assignee_id: Option<Uuid>,
    }

    fn current_user(id: Uuid) -> CurrentUser {
        CurrentUser {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn authorizes_author_and_assignee() {
        let author_id = Uuid::new_v4();
        let assignee_id = Uuid::new_v4();
        let row = Row {
            author_id,
            assignee_id: Some(assignee_id),
        };

        assert!(row.auth_author(&current_user(author_id)).is_ok());
        assert!(row.auth_author(&current_user(assignee_id)).is_err());

        assert!(row.auth_assignee(&current_user(assignee_id)).is_ok());
        assert!(row.auth_assignee(&current_user(author_id)).is_err());
    }

    #[test]
    fn view_is_allowed_for_both_sides_only() {
        let author_id = Uuid::new_v4();
        let assignee_id = Uuid::new_v4();
        let row = Row {
            author_id,
            assignee_id: Some(assignee_id),
        };

        assert!(row.auth_view(&current_user(author_id)).is_ok());
        assert!(row.auth_view(&current_user(assignee_id)).is_ok());
        assert!(row.auth_view(&current_user(Uuid::new_v4())).is_err());
    }

    #[test]
    fn unassigned_rows_have_no_assignee_access() {
        let row = Row {
            author_id: Uuid::new_v4(),
            assignee_id: None,
        };

        assert!(row.auth_assignee(&current_user(Uuid::new_v4())).is_err());
    }
}

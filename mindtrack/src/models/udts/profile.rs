use crate::models::user::{CurrentUser, User};
use charybdis::macros::charybdis_udt_model;
use charybdis::types::{Text, Uuid};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Default, Clone)]
#[charybdis_udt_model(type_name = profile)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: Text,
    pub email: Text,
}

impl Profile {
    pub fn init(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.full_name(),
            email: user.email.clone(),
        }
    }

    pub fn init_from_current_user(current_user: &CurrentUser) -> Profile {
        Profile {
            id: current_user.id,
            name: current_user.full_name(),
            email: current_user.email.clone(),
        }
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Owner on whose behalf the current request runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl CurrentUser {
    pub const GUEST_USERNAME: &'static str = "guest";

    pub fn guest(id: i64) -> Self {
        Self {
            id,
            username: Self::GUEST_USERNAME.to_string(),
        }
    }
}

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
    pub exp: u64,
}

use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::domain::Role;

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// None until the identity provider assigns a marketplace role
    pub role: Option<Role>,
}

pub async fn get_me(auth: RequireAuth) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: auth.user_id,
        email: auth.email.clone(),
        role: auth.role,
    })
}

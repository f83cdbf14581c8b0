//! Demo endpoints showing the envelope and the error taxonomy.
//!
//! The user table is a fixed in-memory list; there is no real authentication.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    routing::{get, post},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{AppError, AppResult, OptionExt};
use crate::loader::{ApiRouter, LoadContext};
use crate::types::ApiResponse;

pub fn router(_ctx: &LoadContext<'_>) -> AppResult<ApiRouter> {
    Ok(ApiRouter::new("/demo")
        .with_tag("demo")
        .route("/success", get(success_demo))
        .route("/login", post(login))
        .route("/admin/users", get(list_users)))
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub user_id: u32,
    pub username: &'static str,
    pub role: &'static str,
}

struct DemoUser {
    info: UserInfo,
    password: &'static str,
}

const ROLES: &[&str] = &["admin", "user"];

fn users() -> [DemoUser; 2] {
    [
        DemoUser { info: UserInfo { user_id: 1, username: "admin", role: "admin" }, password: "admin123" },
        DemoUser { info: UserInfo { user_id: 2, username: "user", role: "user" }, password: "user123" },
    ]
}

#[derive(Debug, Default, Deserialize)]
pub struct SuccessQuery {
    pub data_type: Option<String>,
}

pub async fn success_demo(
    query: Result<Query<SuccessQuery>, QueryRejection>,
) -> AppResult<ApiResponse<Value>> {
    let Query(q) = query.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    let data_type = q.data_type.as_deref().unwrap_or("object");
    info!(data_type, "Success demo");

    let data = match data_type {
        "object" => json!({ "id": 1, "name": "demo object" }),
        "list" => json!([{ "id": 1, "name": "item 1" }, { "id": 2, "name": "item 2" }]),
        "string" => json!("a plain string"),
        "number" => json!(42),
        _ => Value::Null,
    };
    Ok(ApiResponse::ok(data))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    fn validate(&self) -> AppResult<()> {
        if !(3..=20).contains(&self.username.chars().count()) {
            return Err(AppError::InvalidArgument("username must be 3 to 20 characters".into()));
        }
        if !(6..=20).contains(&self.password.chars().count()) {
            return Err(AppError::InvalidArgument("password must be 6 to 20 characters".into()));
        }
        Ok(())
    }
}

pub async fn login(body: Result<Json<LoginRequest>, JsonRejection>) -> AppResult<ApiResponse<UserInfo>> {
    let Json(req) = body.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    req.validate()?;
    info!(username = %req.username, "Demo login");

    let user = users()
        .into_iter()
        .find(|u| u.info.username == req.username)
        .ok_or_not_found(&format!("user {}", req.username))?;
    if user.password != req.password {
        return Err(AppError::Forbidden("wrong password".into()));
    }
    Ok(ApiResponse::ok(user.info))
}

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
    /// Stand-in for the caller's role.
    pub current_role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<UserInfo>,
}

pub async fn list_users(query: Result<Query<UsersQuery>, QueryRejection>) -> AppResult<ApiResponse<UserList>> {
    let Query(q) = query.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    if q.current_role.as_deref() != Some("admin") {
        return Err(AppError::Forbidden("only admins may list users".into()));
    }
    if let Some(role) = q.role.as_deref() {
        if !ROLES.contains(&role) {
            return Err(AppError::InvalidArgument(format!("invalid role: {}", role)));
        }
    }

    let users = users()
        .into_iter()
        .map(|u| u.info)
        .filter(|u| q.role.as_deref().map_or(true, |r| u.role == r))
        .collect();
    Ok(ApiResponse::ok(UserList { users }))
}

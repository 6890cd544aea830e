use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::config::SecurityConfig;
use crate::database::models::Account;
use crate::database::{DatabaseError, Store};
use crate::services::error::{ServiceError, ServiceResult};
use crate::types::require_name;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub username: String,
    pub user_id: String,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self { username: account.username.clone(), user_id: account.login.clone() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: AccountSummary,
}

fn require_password(raw: Option<String>) -> ServiceResult<String> {
    match raw {
        Some(password) if !password.is_empty() => Ok(password),
        _ => Err(ServiceError::invalid_field("password", "password is required")),
    }
}

/// Accounts are global, so this works on the raw store rather than an owner scope.
pub async fn register(store: &dyn Store, security: &SecurityConfig, request: RegisterRequest) -> ServiceResult<Account> {
    let username = require_name("username", request.username.as_deref())?;
    let login = require_name("userId", request.user_id.as_deref())?;
    let password = require_password(request.password)?;

    let password_hash = auth::hash_password(&password, security.password_cost)?;
    let account = Account {
        id: Uuid::new_v4(),
        username,
        login,
        password_hash,
        created_at: Utc::now(),
    };

    match store.insert_account(&account).await {
        Ok(()) => {}
        Err(DatabaseError::Conflict(_)) => {
            return Err(ServiceError::Conflict(format!("User ID '{}' is already taken", account.login)))
        }
        Err(e) => return Err(e.into()),
    }

    info!("Registered account {} ({})", account.login, account.id);
    Ok(account)
}

/// A stored hash bcrypt cannot parse never matches
fn password_matches(account: &Account, password: &str) -> bool {
    auth::verify_password(password, &account.password_hash).unwrap_or_else(|e| {
        error!("Unreadable password hash for {}: {}", account.login, e);
        false
    })
}

pub async fn login(store: &dyn Store, security: &SecurityConfig, request: LoginRequest) -> ServiceResult<LoginResponse> {
    let login = require_name("userId", request.user_id.as_deref())?;
    let password = require_password(request.password)?;

    let account = match store.find_account_by_login(&login).await? {
        Some(account) if password_matches(&account, &password) => account,
        _ => {
            warn!("Failed login for {}", login);
            return Err(ServiceError::Unauthorized("Invalid credentials".into()));
        }
    };

    let claims = Claims::new(&account, security.jwt_expiry_hours)?;
    let token = auth::generate_jwt(security, &claims)?;

    Ok(LoginResponse {
        message: "Login successful".into(),
        token,
        user: AccountSummary::from(&account),
    })
}

pub async fn whoami(store: &dyn Store, owner_id: Uuid) -> ServiceResult<Account> {
    store
        .find_account(owner_id)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("Account no longer exists".into()))
}

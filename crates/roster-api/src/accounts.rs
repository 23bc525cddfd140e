use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use tracing::error;

use roster_crypto::hash_credentials;
use roster_types::api::{
    AccountIdResponse, AccountResponse, CreateAccountRequest, LoginRequest, UpdateAccountRequest,
};
use roster_types::models::{Account, AccountId, AccountUpdate};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    /// Answer 404 instead of `null` when the account does not exist.
    #[serde(default)]
    pub strict: bool,
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_name(&req.name)?;
    validate_password(&req.password)?;
    let data = decode_data(req.data.as_deref())?;

    let password_hash = hash_credentials(&req.password, &req.name).map_err(internal)?;

    let record = state
        .storage
        .accounts()
        .add_account(&req.name, password_hash, data)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse::from(Account::from(record))),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .storage
        .accounts()
        .authenticate(&req.name, &req.password)
        .await?
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "invalid name or password"))?;

    Ok(Json(account.into()))
}

pub async fn allocate_account_id(
    State(state): State<AppState>,
) -> Result<Json<AccountIdResponse>, ApiError> {
    let id = state.storage.accounts().allocate_account_id().await?;
    Ok(Json(AccountIdResponse { id }))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Option<AccountResponse>>, ApiError> {
    let account = state
        .storage
        .accounts()
        .get_account_by_id(id, query.strict)
        .await?;

    Ok(Json(account.map(Into::into)))
}

pub async fn get_account_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Option<AccountResponse>>, ApiError> {
    let account = state
        .storage
        .accounts()
        .get_account_by_name(&name, query.strict)
        .await?;

    Ok(Json(account.map(Into::into)))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if req.clear_data && req.data.is_some() {
        return Err(ApiError::bad_request("data and clear_data are exclusive"));
    }

    let mut update = AccountUpdate::new();
    if let Some(password) = req.password {
        validate_password(&password)?;
        update = update.password(password);
    }
    if req.clear_data {
        update = update.data(None);
    } else if let Some(data) = req.data.as_deref() {
        update = update.data(decode_data(Some(data))?);
    }

    let account = state.storage.accounts().update_account(id, update).await?;
    Ok(Json(account.into()))
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    let len = name.chars().count();
    if !(3..=32).contains(&len) {
        return Err(ApiError::bad_request("name must be 3 to 32 characters"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }
    Ok(())
}

fn decode_data(data: Option<&str>) -> Result<Option<Vec<u8>>, ApiError> {
    data.map(|d| B64.decode(d))
        .transpose()
        .map_err(|_| ApiError::bad_request("data must be base64"))
}

fn internal(e: anyhow::Error) -> ApiError {
    error!("Credential hashing failed: {}", e);
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

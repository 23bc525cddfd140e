use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use roster_types::api::{FriendListResponse, SetFriendListRequest};
use roster_types::models::AccountId;

use crate::AppState;
use crate::error::ApiError;

pub async fn get_friend_list(
    State(state): State<AppState>,
    Path(owner): Path<AccountId>,
) -> Result<Json<FriendListResponse>, ApiError> {
    let list = state.storage.friends().get_friend_list(owner).await?;
    Ok(Json(list.into()))
}

/// Replace the owner's friends and received invitations wholesale.
pub async fn set_friend_list(
    State(state): State<AppState>,
    Path(owner): Path<AccountId>,
    Json(req): Json<SetFriendListRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .storage
        .friends()
        .replace_friend_list(owner, req.friends, req.inviters)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub mod accounts;
pub mod error;
pub mod friends;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use roster_db::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub storage: Storage,
}

/// All account and friend-list routes, bound to `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/login", post(accounts::login))
        .route("/accounts/ids", post(accounts::allocate_account_id))
        .route("/accounts/by-name/{name}", get(accounts::get_account_by_name))
        .route(
            "/accounts/{id}",
            get(accounts::get_account).patch(accounts::update_account),
        )
        .route(
            "/accounts/{id}/friends",
            get(friends::get_friend_list).put(friends::set_friend_list),
        )
        .with_state(state)
}

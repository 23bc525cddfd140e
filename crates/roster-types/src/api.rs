use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};

use crate::models::{Account, AccountId, FriendInvitation, FriendListRecord};

// -- Accounts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAccountRequest {
    pub name: String,
    pub password: String,
    /// Base64-encoded opaque payload.
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// Partial update. `data` replaces the payload; `clear_data` removes it.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub password: Option<String>,
    pub data: Option<String>,
    #[serde(default)]
    pub clear_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub name: String,
    pub data: Option<String>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            data: account.data.map(|d| B64.encode(d)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountIdResponse {
    pub id: AccountId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- Friends --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetFriendListRequest {
    #[serde(default)]
    pub friends: Vec<AccountId>,
    #[serde(default)]
    pub inviters: Vec<AccountId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationResponse {
    pub inviter: AccountResponse,
    pub invitee: AccountResponse,
}

impl From<FriendInvitation> for InvitationResponse {
    fn from(invitation: FriendInvitation) -> Self {
        Self {
            inviter: invitation.inviter.into(),
            invitee: invitation.invitee.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendListResponse {
    pub friends: Vec<AccountResponse>,
    pub invitations: Vec<InvitationResponse>,
}

impl From<FriendListRecord> for FriendListResponse {
    fn from(record: FriendListRecord) -> Self {
        Self {
            friends: record.friends.into_iter().map(|f| f.account.into()).collect(),
            invitations: record.invitations.into_iter().map(Into::into).collect(),
        }
    }
}

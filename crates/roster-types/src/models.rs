use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Length of a password hash in bytes.
pub const HASH_LEN: usize = 32;
/// Length of a password salt in bytes.
pub const SALT_LEN: usize = 16;

/// Database-assigned account identifier. Travels as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AccountId(i64);

impl AccountId {
    /// Returned by id allocation. SQLite AUTOINCREMENT starts at 1, so no
    /// stored account ever carries it.
    pub const PLACEHOLDER: AccountId = AccountId(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(AccountId)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> String {
        id.to_string()
    }
}

impl TryFrom<String> for AccountId {
    type Error = ParseIntError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A password hash together with the random salt used to compute it.
#[derive(Clone, PartialEq, Eq)]
pub struct SaltedPasswordHash {
    pub hash: [u8; HASH_LEN],
    pub salt: [u8; SALT_LEN],
}

impl fmt::Debug for SaltedPasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaltedPasswordHash").finish_non_exhaustive()
    }
}

/// The account as persisted, credentials included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: AccountId,
    pub name: String,
    pub password_hash: SaltedPasswordHash,
    pub data: Option<Vec<u8>>,
}

/// Public account snapshot. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub data: Option<Vec<u8>>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            data: record.data,
        }
    }
}

impl From<&AccountRecord> for Account {
    fn from(record: &AccountRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            data: record.data.clone(),
        }
    }
}

/// Requested changes to an account. Fields left untouched are not written.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    password: Option<String>,
    data: Option<Option<Vec<u8>>>,
}

impl AccountUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a new plaintext password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Replace the account data. `None` clears it.
    pub fn data(mut self, data: Option<Vec<u8>>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_password_changed(&self) -> bool {
        self.password.is_some()
    }

    pub fn is_data_changed(&self) -> bool {
        self.data.is_some()
    }

    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The replacement data, if data changed. The inner `None` means "clear".
    pub fn new_data(&self) -> Option<Option<&[u8]>> {
        self.data.as_ref().map(|d| d.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendInfo {
    pub account: Account,
}

/// An invitation addressed to `invitee`, sent by `inviter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendInvitation {
    pub inviter: Account,
    pub invitee: Account,
}

/// Friends of one account plus the invitations it has received.
/// Assembled on read, never stored as such.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendListRecord {
    pub friends: Vec<FriendInfo>,
    pub invitations: Vec<FriendInvitation>,
}

impl FriendListRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_friend(&mut self, account: Account) {
        self.friends.push(FriendInfo { account });
    }

    pub fn add_invitation(&mut self, inviter: Account, invitee: Account) {
        self.invitations.push(FriendInvitation { inviter, invitee });
    }

    pub fn friend_ids(&self) -> Vec<AccountId> {
        self.friends.iter().map(|f| f.account.id).collect()
    }

    pub fn inviter_ids(&self) -> Vec<AccountId> {
        self.invitations.iter().map(|i| i.inviter.id).collect()
    }
}

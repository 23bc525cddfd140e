use rusqlite::types::Value;
use rusqlite::{Connection, params};
use roster_types::models::{Account, AccountId, FriendListRecord};
use tracing::debug;

use crate::accounts::query_account;
use crate::error::is_constraint_violation;
use crate::executor::QueryExecutor;
use crate::models::{AccountRow, account_columns};
use crate::{Result, StoreError};

const SELECT_FRIENDS: &str = concat!(
    "SELECT ",
    account_columns!(),
    " FROM accounts INNER JOIN friends ON accounts.id = friends.friend",
    " WHERE friends.owner = ?1 ORDER BY accounts.id"
);
const SELECT_OWNER: &str = concat!("SELECT ", account_columns!(), " FROM accounts WHERE id = ?1");
const SELECT_INVITERS: &str = concat!(
    "SELECT ",
    account_columns!(),
    " FROM accounts INNER JOIN invitations ON accounts.id = invitations.sender",
    " WHERE invitations.receiver = ?1 ORDER BY accounts.id"
);

/// Friend lists and pending invitations, keyed by owning account.
#[derive(Clone)]
pub struct FriendStore {
    exec: QueryExecutor,
}

impl FriendStore {
    pub fn new(exec: QueryExecutor) -> Self {
        Self { exec }
    }

    /// Assemble the owner's friends and the invitations addressed to them.
    pub async fn get_friend_list(&self, owner: AccountId) -> Result<FriendListRecord> {
        debug!(%owner, "Reading friend list");
        self.exec.read(move |conn| read_friend_list(conn, owner)).await
    }

    /// Replace the owner's friends and received invitations with those in `record`.
    pub async fn set_friend_list(&self, owner: AccountId, record: &FriendListRecord) -> Result<()> {
        self.replace_friend_list(owner, record.friend_ids(), record.inviter_ids())
            .await
    }

    /// Delete-then-reinsert of both tables in one transaction. Any failing
    /// step rolls back, leaving the previous list in place.
    pub async fn replace_friend_list(
        &self,
        owner: AccountId,
        friend_ids: Vec<AccountId>,
        inviter_ids: Vec<AccountId>,
    ) -> Result<()> {
        debug!(
            %owner,
            friends = friend_ids.len(),
            inviters = inviter_ids.len(),
            "Replacing friend list"
        );

        self.exec
            .write(move |conn| {
                let tx = conn.transaction()?;

                tx.execute("DELETE FROM friends WHERE owner = ?1", [owner.get()])?;
                tx.execute("DELETE FROM invitations WHERE receiver = ?1", [owner.get()])?;

                {
                    let mut insert_friend = tx.prepare_cached(
                        "INSERT OR IGNORE INTO friends (owner, friend) VALUES (?1, ?2)",
                    )?;
                    for friend in &friend_ids {
                        insert_friend
                            .execute(params![owner.get(), friend.get()])
                            .map_err(|e| unknown_account(e, owner, *friend))?;
                    }

                    let mut insert_invitation = tx.prepare_cached(
                        "INSERT OR IGNORE INTO invitations (sender, receiver) VALUES (?1, ?2)",
                    )?;
                    for inviter in &inviter_ids {
                        insert_invitation
                            .execute(params![inviter.get(), owner.get()])
                            .map_err(|e| unknown_account(e, owner, *inviter))?;
                    }
                }

                tx.commit()?;
                Ok(())
            })
            .await
    }
}

/// All three queries run inside one deferred read transaction, so a replace
/// committing mid-read cannot mix the old and new lists.
fn read_friend_list(conn: &Connection, owner: AccountId) -> Result<FriendListRecord> {
    let tx = conn.unchecked_transaction()?;
    let mut list = FriendListRecord::new();
    let key = Value::Integer(owner.get());

    for account in query_accounts(&tx, SELECT_FRIENDS, key.clone())? {
        list.add_friend(account);
    }

    let owner_account = query_account(&tx, SELECT_OWNER, key.clone())?
        .map(Account::from)
        .ok_or_else(|| StoreError::not_found_id(owner))?;

    for inviter in query_accounts(&tx, SELECT_INVITERS, key)? {
        list.add_invitation(inviter, owner_account.clone());
    }

    tx.commit()?;
    Ok(list)
}

fn query_accounts(conn: &Connection, sql: &str, key: Value) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt
        .query_map([key], AccountRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|row| row.into_record().map(Account::from))
        .collect()
}

/// Foreign key failures on insert mean the referenced account is missing.
/// The owner is included since it may be the missing one.
fn unknown_account(e: rusqlite::Error, owner: AccountId, other: AccountId) -> StoreError {
    if is_constraint_violation(&e) {
        StoreError::UnknownAccount(format!("{} or {}", owner, other))
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use roster_types::models::{HASH_LEN, SALT_LEN, SaltedPasswordHash};

    use crate::Storage;

    use super::*;

    async fn seed(storage: &Storage, names: &[&str]) -> Vec<AccountId> {
        let mut ids = Vec::new();
        for name in names {
            let hash = SaltedPasswordHash {
                hash: [1; HASH_LEN],
                salt: [2; SALT_LEN],
            };
            let record = storage.accounts().add_account(name, hash, None).await.unwrap();
            ids.push(record.id);
        }
        ids
    }

    fn ids(list: &[AccountId]) -> BTreeSet<AccountId> {
        list.iter().copied().collect()
    }

    #[tokio::test]
    async fn set_then_get_returns_same_ids() {
        let storage = Storage::open_in_memory().unwrap();
        let seeded = seed(&storage, &["alice", "bob", "carol", "dave"]).await;
        let (alice, bob, carol, dave) = (seeded[0], seeded[1], seeded[2], seeded[3]);
        let friends = storage.friends();

        friends
            .replace_friend_list(alice, vec![carol, bob], vec![dave])
            .await
            .unwrap();

        let list = friends.get_friend_list(alice).await.unwrap();
        assert_eq!(ids(&list.friend_ids()), ids(&[bob, carol]));
        assert_eq!(list.inviter_ids(), vec![dave]);

        let names: BTreeSet<_> = list.friends.iter().map(|f| f.account.name.as_str()).collect();
        assert_eq!(names, BTreeSet::from(["bob", "carol"]));

        let invitation = &list.invitations[0];
        assert_eq!(invitation.inviter.name, "dave");
        assert_eq!(invitation.invitee.id, alice);
        assert_eq!(invitation.invitee.name, "alice");
    }

    #[tokio::test]
    async fn set_friend_list_from_record() {
        let storage = Storage::open_in_memory().unwrap();
        let seeded = seed(&storage, &["alice", "bob", "carol"]).await;
        let friends = storage.friends();

        friends
            .replace_friend_list(seeded[0], vec![seeded[1]], vec![seeded[2]])
            .await
            .unwrap();
        let list = friends.get_friend_list(seeded[0]).await.unwrap();

        // Writing a list back unchanged is a no-op.
        friends.set_friend_list(seeded[0], &list).await.unwrap();
        assert_eq!(friends.get_friend_list(seeded[0]).await.unwrap(), list);
    }

    #[tokio::test]
    async fn empty_replace_clears_only_that_owner() {
        let storage = Storage::open_in_memory().unwrap();
        let seeded = seed(&storage, &["alice", "bob", "carol"]).await;
        let (alice, bob, carol) = (seeded[0], seeded[1], seeded[2]);
        let friends = storage.friends();

        friends.replace_friend_list(alice, vec![bob], vec![carol]).await.unwrap();
        friends.replace_friend_list(bob, vec![alice, carol], vec![]).await.unwrap();

        friends.replace_friend_list(alice, vec![], vec![]).await.unwrap();

        let list = friends.get_friend_list(alice).await.unwrap();
        assert!(list.friends.is_empty());
        assert!(list.invitations.is_empty());

        let list = friends.get_friend_list(bob).await.unwrap();
        assert_eq!(ids(&list.friend_ids()), ids(&[alice, carol]));
    }

    #[tokio::test]
    async fn replace_drops_previous_entries() {
        let storage = Storage::open_in_memory().unwrap();
        let seeded = seed(&storage, &["alice", "bob", "carol", "dave"]).await;
        let friends = storage.friends();

        friends
            .replace_friend_list(seeded[0], vec![seeded[1], seeded[2]], vec![seeded[3]])
            .await
            .unwrap();
        friends
            .replace_friend_list(seeded[0], vec![seeded[3]], vec![seeded[1]])
            .await
            .unwrap();

        let list = friends.get_friend_list(seeded[0]).await.unwrap();
        assert_eq!(list.friend_ids(), vec![seeded[3]]);
        assert_eq!(list.inviter_ids(), vec![seeded[1]]);
    }

    #[tokio::test]
    async fn duplicate_ids_collapse() {
        let storage = Storage::open_in_memory().unwrap();
        let seeded = seed(&storage, &["alice", "bob"]).await;
        let friends = storage.friends();

        friends
            .replace_friend_list(seeded[0], vec![seeded[1], seeded[1]], vec![seeded[1], seeded[1]])
            .await
            .unwrap();

        let list = friends.get_friend_list(seeded[0]).await.unwrap();
        assert_eq!(list.friends.len(), 1);
        assert_eq!(list.invitations.len(), 1);
    }

    #[tokio::test]
    async fn failed_replace_rolls_back() {
        let storage = Storage::open_in_memory().unwrap();
        let seeded = seed(&storage, &["alice", "bob", "carol"]).await;
        let friends = storage.friends();

        friends
            .replace_friend_list(seeded[0], vec![seeded[1]], vec![seeded[2]])
            .await
            .unwrap();

        let err = friends
            .replace_friend_list(seeded[0], vec![seeded[2], AccountId::new(404)], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownAccount(_)));

        let list = friends.get_friend_list(seeded[0]).await.unwrap();
        assert_eq!(list.friend_ids(), vec![seeded[1]]);
        assert_eq!(list.inviter_ids(), vec![seeded[2]]);
    }

    #[tokio::test]
    async fn missing_owner_is_not_found() {
        let storage = Storage::open_in_memory().unwrap();
        let err = storage
            .friends()
            .get_friend_list(AccountId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AccountNotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn read_sees_one_committed_list() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("roster.db")).unwrap();
        let seeded = seed(&storage, &["alice", "bob", "carol"]).await;
        let (alice, bob, carol) = (seeded[0], seeded[1], seeded[2]);

        storage
            .friends()
            .replace_friend_list(alice, vec![bob], vec![carol])
            .await
            .unwrap();

        // Alternate between two lists that swap bob and carol.
        let writer = {
            let storage = storage.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    let (friend, inviter) = if i % 2 == 0 { (carol, bob) } else { (bob, carol) };
                    storage
                        .friends()
                        .replace_friend_list(alice, vec![friend], vec![inviter])
                        .await
                        .unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let list = storage.friends().get_friend_list(alice).await.unwrap();
            let pair = (list.friend_ids(), list.inviter_ids());
            assert!(
                pair == (vec![bob], vec![carol]) || pair == (vec![carol], vec![bob]),
                "mixed friend list read: {:?}",
                pair
            );
        }
        writer.await.unwrap();
    }
}

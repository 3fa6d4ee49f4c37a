use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::database::{ModelError, Org, Store, User};
use crate::security::Codec;

/// What a caller may do, from least to most
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeLevel {
    User,
    Org,
    Root,
}

/// Ids of the platform operator's org and user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootIds {
    pub org: String,
    pub user: String,
}

/// A resolved caller. Only ever built from an active user in an active org.
#[derive(Debug, Clone)]
pub struct Session {
    pub org: Org,
    pub user: User,
    pub privilege: PrivilegeLevel,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Missing caller identity")]
    MissingIdentity,

    #[error("Caller not found")]
    UserNotFound,

    #[error("Caller is not active")]
    UserInactive,

    #[error("Caller org not found")]
    OrgNotFound,

    #[error("Caller org is not active")]
    OrgInactive,

    #[error(transparent)]
    Store(ModelError),
}

/// Root is checked first: the root user also owns the root org.
pub fn classify(user: &User, org: &Org, root: &RootIds) -> PrivilegeLevel {
    if user.id == root.user && org.id == root.org {
        PrivilegeLevel::Root
    } else if org.owner == user.id {
        PrivilegeLevel::Org
    } else {
        PrivilegeLevel::User
    }
}

/// Turn a claimed caller id into a Session.
///
/// Reads go to a replica; a lagging replica can only make a caller look
/// missing or inactive, never grant more than the writer would.
pub async fn resolve(
    store: &Store,
    codec: &Codec,
    root: &RootIds,
    caller_id: Option<&str>,
) -> Result<Session, SessionError> {
    let caller_id = caller_id
        .filter(|id| !id.is_empty())
        .ok_or(SessionError::MissingIdentity)?;

    let user = match User::read(store.random_replica(), codec, caller_id).await {
        Ok(user) => user,
        Err(ModelError::NotFound) => return Err(SessionError::UserNotFound),
        Err(e) => return Err(SessionError::Store(e)),
    };
    if !user.is_active() {
        return Err(SessionError::UserInactive);
    }

    let org = match Org::read(store.random_replica(), &user.org).await {
        Ok(org) => org,
        Err(ModelError::NotFound) => return Err(SessionError::OrgNotFound),
        Err(e) => return Err(SessionError::Store(e)),
    };
    if !org.is_active() {
        return Err(SessionError::OrgInactive);
    }

    let privilege = classify(&user, &org, root);
    debug!(user_id = %user.id, org_id = %org.id, ?privilege, "Resolved session");

    Ok(Session {
        org,
        user,
        privilege,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::new_org_owner;
    use crate::database::models::fixtures;
    use crate::database::Status;

    #[tokio::test]
    async fn classifies_root_org_and_user() {
        let store = fixtures::store().await;
        let codec = fixtures::codec();

        let (root_org, root_user) = new_org_owner(&store, &codec, "root", "Root", "root@example.com")
            .await
            .unwrap();
        let root = RootIds {
            org: root_org.id.clone(),
            user: root_user.id.clone(),
        };

        let (org, owner) = new_org_owner(&store, &codec, "acme", "Owner", "owner@example.com")
            .await
            .unwrap();
        let mut member = User::new(&codec, "Member", "member@example.com", &org.id, "pw").unwrap();
        member.meta.status = Status::Active;
        member.insert(store.writer()).await.unwrap();

        let s = resolve(&store, &codec, &root, Some(&root_user.id)).await.unwrap();
        assert_eq!(s.privilege, PrivilegeLevel::Root);

        let s = resolve(&store, &codec, &root, Some(&owner.id)).await.unwrap();
        assert_eq!(s.privilege, PrivilegeLevel::Org);
        assert_eq!(s.org.id, org.id);

        let s = resolve(&store, &codec, &root, Some(&member.id)).await.unwrap();
        assert_eq!(s.privilege, PrivilegeLevel::User);
    }

    #[tokio::test]
    async fn rejects_missing_unknown_and_inactive_callers() {
        let store = fixtures::store().await;
        let codec = fixtures::codec();
        let root = RootIds {
            org: "r".to_string(),
            user: "r".to_string(),
        };

        assert!(matches!(
            resolve(&store, &codec, &root, None).await,
            Err(SessionError::MissingIdentity)
        ));
        assert!(matches!(
            resolve(&store, &codec, &root, Some("")).await,
            Err(SessionError::MissingIdentity)
        ));
        assert!(matches!(
            resolve(&store, &codec, &root, Some("nobody")).await,
            Err(SessionError::UserNotFound)
        ));

        let (mut org, mut owner) = new_org_owner(&store, &codec, "acme", "Owner", "o@example.com")
            .await
            .unwrap();

        org.update_status(store.writer(), Status::Inactive).await.unwrap();
        assert!(matches!(
            resolve(&store, &codec, &root, Some(&owner.id)).await,
            Err(SessionError::OrgInactive)
        ));

        owner.update_status(store.writer(), Status::Inactive).await.unwrap();
        assert!(matches!(
            resolve(&store, &codec, &root, Some(&owner.id)).await,
            Err(SessionError::UserInactive)
        ));
    }

    #[tokio::test]
    async fn missing_org_is_reported() {
        let store = fixtures::store().await;
        let codec = fixtures::codec();
        let root = RootIds {
            org: "r".to_string(),
            user: "r".to_string(),
        };
        let (org, owner) = new_org_owner(&store, &codec, "acme", "Owner", "o@example.com")
            .await
            .unwrap();
        sqlx::query("delete from orgs where id = $1")
            .bind(&org.id)
            .execute(store.writer())
            .await
            .unwrap();
        assert!(matches!(
            resolve(&store, &codec, &root, Some(&owner.id)).await,
            Err(SessionError::OrgNotFound)
        ));
    }

    #[test]
    fn privilege_ordering() {
        assert!(PrivilegeLevel::Root > PrivilegeLevel::Org);
        assert!(PrivilegeLevel::Org > PrivilegeLevel::User);
    }
}

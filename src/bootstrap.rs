use tracing::info;
use uuid::Uuid;

use crate::auth::RootIds;
use crate::config::RootConfig;
use crate::database::{ModelError, Org, Status, Store, User};
use crate::security::Codec;

/// Root identity the server runs with. `api_secret` is only known when
/// the identity was created by this process.
#[derive(Debug, Clone)]
pub struct RootIdentity {
    pub org: String,
    pub user: String,
    pub api_secret: Option<String>,
}

impl RootIdentity {
    pub fn ids(&self) -> RootIds {
        RootIds {
            org: self.org.clone(),
            user: self.user.clone(),
        }
    }
}

/// Create an active org with an active owner. The owner gets a random
/// password; callers that need to log in use the api secret.
pub async fn new_org_owner(
    store: &Store,
    codec: &Codec,
    org_name: &str,
    display_name: &str,
    email: &str,
) -> Result<(Org, User), ModelError> {
    let mut org = Org::new(org_name)?;
    org.meta.status = Status::Active;
    org.insert(store.writer()).await?;

    let password = codec.derive_password(&Uuid::new_v4().to_string())?;
    let mut owner = User::new(codec, display_name, email, &org.id, &password)?;
    owner.meta.status = Status::Active;
    owner.insert(store.writer()).await?;

    org.update_owner(store.writer(), &owner.id).await?;
    Ok((org, owner))
}

/// Use the configured root ids, or create a fresh root org and user
pub async fn ensure_root(
    store: &Store,
    codec: &Codec,
    config: &RootConfig,
) -> Result<RootIdentity, ModelError> {
    if let (Some(org), Some(user)) = (&config.org_id, &config.user_id) {
        // Both must exist; the root user must still be the root org's member.
        let root_org = Org::read(store.writer(), org).await?;
        let root_user = User::read(store.writer(), codec, user).await?;
        if root_user.org != root_org.id {
            return Err(ModelError::RelatedUser);
        }
        info!(org_id = %org, user_id = %user, "Using configured root identity");
        return Ok(RootIdentity {
            org: org.clone(),
            user: user.clone(),
            api_secret: None,
        });
    }

    let suffix = Uuid::new_v4().simple().to_string();
    let (org, user) = new_org_owner(
        store,
        codec,
        &format!("root-{suffix}"),
        "root",
        &format!("root-{suffix}@orgkeep.local"),
    )
    .await?;
    info!(org_id = %org.id, user_id = %user.id, "Bootstrapped root identity");

    Ok(RootIdentity {
        org: org.id,
        user: user.id,
        api_secret: Some(user.api_secret),
    })
}

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::{AnyPool, Row};
use tracing::debug;
use uuid::Uuid;

use super::{
    check_schema_version, expect_one, insert_error, now, update_column, ColumnValue, Meta,
    ModelError, Status, SCHEMA_VERSION,
};
use crate::database::schema::USERS_TABLE;
use crate::security::{digest, safe_str, Codec};

/// A member of exactly one org.
///
/// Api secret, display name and email are held in cleartext here and
/// encrypted at rest. Each has a digest column for equality lookups. `password` is always an
/// already-derived credential, never plaintext.
#[derive(Clone)]
pub struct User {
    pub id: String,
    pub org: String,
    pub api_secret: String,
    pub api_secret_digest: String,
    pub display_name: String,
    pub display_name_digest: String,
    pub email: String,
    pub email_digest: String,
    pub password: String,
    pub meta: Meta,
    sealed: Sealed,
}

/// Ciphertexts as written to (or read from) the store
#[derive(Clone, Default)]
struct Sealed {
    api_secret: String,
    display_name: String,
    email: String,
}

/// What callers other than the user themselves get to see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub org: String,
    pub display_name: String,
    pub email: String,
    pub meta: Meta,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("org", &self.org)
            .field("email_digest", &self.email_digest)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl User {
    /// New unconfirmed user with a fresh api secret. Sensitive fields are
    /// encrypted immediately; nothing is persisted.
    pub fn new(
        codec: &Codec,
        display_name: &str,
        email: &str,
        org: &str,
        password: &str,
    ) -> Result<Self, ModelError> {
        for (field, value) in [
            ("display_name", display_name),
            ("email", email),
            ("org", org),
            ("password", password),
        ] {
            if !safe_str(value) {
                return Err(ModelError::Malformed(field));
            }
        }

        let api_secret = Uuid::new_v4().to_string();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            org: org.to_string(),
            api_secret_digest: digest(&api_secret),
            api_secret: api_secret.clone(),
            display_name: display_name.to_string(),
            display_name_digest: digest(display_name),
            email: email.to_string(),
            email_digest: digest(email),
            password: password.to_string(),
            meta: Meta::with_status(Status::Unconfirmed),
            sealed: Sealed {
                api_secret: codec.encrypt(&api_secret)?,
                display_name: codec.encrypt(display_name)?,
                email: codec.encrypt(email)?,
            },
        })
    }

    pub fn is_active(&self) -> bool {
        self.meta.status == Status::Active
    }

    pub fn redacted(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            org: self.org.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            meta: self.meta,
        }
    }

    /// Persist a new user. The org must exist and be active at insert time.
    pub async fn insert(&mut self, pool: &AnyPool) -> Result<(), ModelError> {
        if self.meta.status == Status::None {
            return Err(ModelError::DisallowedValue("status"));
        }

        let mut tx = pool.begin().await?;

        let orgs: i64 = sqlx::query_scalar("select count(*) from orgs where id = $1 and status = $2")
            .bind(&self.org)
            .bind(Status::Active.as_i64())
            .fetch_one(&mut *tx)
            .await?;
        if orgs != 1 {
            return Err(ModelError::RelatedOrg);
        }

        let ts = now();
        let result = sqlx::query(
            "insert into users (id, api_secret, api_secret_digest, display_name, \
             display_name_digest, email, email_digest, org, password, schema_version, \
             status, ctime, mtime) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(&self.id)
        .bind(&self.sealed.api_secret)
        .bind(&self.api_secret_digest)
        .bind(&self.sealed.display_name)
        .bind(&self.display_name_digest)
        .bind(&self.sealed.email)
        .bind(&self.email_digest)
        .bind(&self.org)
        .bind(&self.password)
        .bind(self.meta.schema_version)
        .bind(self.meta.status.as_i64())
        .bind(ts)
        .bind(ts)
        .execute(&mut *tx)
        .await
        .map_err(insert_error)?;
        expect_one(result.rows_affected())?;

        tx.commit().await?;

        self.meta.ctime = ts;
        self.meta.mtime = ts;
        debug!(user_id = %self.id, org_id = %self.org, "Inserted user");
        Ok(())
    }

    pub async fn read(pool: &AnyPool, codec: &Codec, id: &str) -> Result<Self, ModelError> {
        let row = sqlx::query(
            "select id, api_secret, api_secret_digest, display_name, display_name_digest, \
             email, email_digest, org, password, schema_version, status, ctime, mtime \
             from users where id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ModelError::NotFound)?;

        check_schema_version(row.try_get("schema_version")?)?;

        let sealed = Sealed {
            api_secret: row.try_get("api_secret")?,
            display_name: row.try_get("display_name")?,
            email: row.try_get("email")?,
        };

        Ok(Self {
            id: row.try_get("id")?,
            org: row.try_get("org")?,
            api_secret: codec.decrypt(&sealed.api_secret)?,
            api_secret_digest: row.try_get("api_secret_digest")?,
            display_name: codec.decrypt(&sealed.display_name)?,
            display_name_digest: row.try_get("display_name_digest")?,
            email: codec.decrypt(&sealed.email)?,
            email_digest: row.try_get("email_digest")?,
            password: row.try_get("password")?,
            meta: Meta {
                ctime: row.try_get("ctime")?,
                mtime: row.try_get("mtime")?,
                schema_version: SCHEMA_VERSION,
                status: Status::try_from(row.try_get::<i64, _>("status")?)?,
            },
            sealed,
        })
    }

    /// Ciphertext and digest change together in one statement
    pub async fn update_display_name(
        &mut self,
        pool: &AnyPool,
        codec: &Codec,
        display_name: &str,
    ) -> Result<(), ModelError> {
        if !safe_str(display_name) {
            return Err(ModelError::Malformed("display_name"));
        }

        let sealed = codec.encrypt(display_name)?;
        let name_digest = digest(display_name);
        let ts = now();

        let result = sqlx::query(
            "update users set display_name = $1, display_name_digest = $2, mtime = $3 where id = $4",
        )
        .bind(&sealed)
        .bind(&name_digest)
        .bind(ts)
        .bind(&self.id)
        .execute(pool)
        .await?;
        expect_one(result.rows_affected())?;

        self.display_name = display_name.to_string();
        self.display_name_digest = name_digest;
        self.sealed.display_name = sealed;
        self.meta.mtime = ts;
        Ok(())
    }

    /// `password` must already be derived
    pub async fn update_password(&mut self, pool: &AnyPool, password: &str) -> Result<(), ModelError> {
        if !safe_str(password) {
            return Err(ModelError::Malformed("password"));
        }
        self.meta.mtime = update_column(
            pool,
            USERS_TABLE,
            &self.id,
            "password",
            ColumnValue::Text(password.to_string()),
        )
        .await?;
        self.password = password.to_string();
        Ok(())
    }

    pub async fn update_status(&mut self, pool: &AnyPool, status: Status) -> Result<(), ModelError> {
        if status == Status::None {
            return Err(ModelError::DisallowedValue("status"));
        }
        self.meta.mtime = update_column(
            pool,
            USERS_TABLE,
            &self.id,
            "status",
            ColumnValue::Int(status.as_i64()),
        )
        .await?;
        self.meta.status = status;
        Ok(())
    }
}

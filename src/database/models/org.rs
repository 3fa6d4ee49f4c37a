use serde::{Deserialize, Serialize};
use sqlx::{AnyPool, Row};
use tracing::debug;
use uuid::Uuid;

use super::{
    check_schema_version, expect_one, insert_error, now, update_column, ColumnValue, Meta,
    ModelError, Status, SCHEMA_VERSION,
};
use crate::database::schema::ORGS_TABLE;
use crate::security::safe_str;

/// Owner placeholder for an org that has not been assigned one yet
pub const OWNER_NONE: &str = "OWNER.NONE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub meta: Meta,
}

impl Org {
    /// New unconfirmed org with no owner. Nothing is persisted.
    pub fn new(name: &str) -> Result<Self, ModelError> {
        if !safe_str(name) {
            return Err(ModelError::Malformed("name"));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner: OWNER_NONE.to_string(),
            meta: Meta::with_status(Status::Unconfirmed),
        })
    }

    pub fn has_owner(&self) -> bool {
        self.owner != OWNER_NONE
    }

    pub fn is_active(&self) -> bool {
        self.meta.status == Status::Active
    }

    /// Persist a new org. A preset owner must already be an active member
    /// of this org, checked in the same transaction as the insert.
    pub async fn insert(&mut self, pool: &AnyPool) -> Result<(), ModelError> {
        if self.meta.status == Status::None {
            return Err(ModelError::DisallowedValue("status"));
        }

        let mut tx = pool.begin().await?;

        if self.has_owner() {
            let owners: i64 = sqlx::query_scalar(
                "select count(*) from users where id = $1 and org = $2 and status = $3",
            )
            .bind(&self.owner)
            .bind(&self.id)
            .bind(Status::Active.as_i64())
            .fetch_one(&mut *tx)
            .await?;
            if owners != 1 {
                return Err(ModelError::RelatedUser);
            }
        }

        let ts = now();
        let result = sqlx::query(
            "insert into orgs (id, name, owner, schema_version, status, ctime, mtime) \
             values ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&self.id)
        .bind(&self.name)
        .bind(&self.owner)
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
        debug!(org_id = %self.id, "Inserted org");
        Ok(())
    }

    pub async fn read(pool: &AnyPool, id: &str) -> Result<Self, ModelError> {
        let row = sqlx::query(
            "select id, name, owner, schema_version, status, ctime, mtime from orgs where id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ModelError::NotFound)?;

        check_schema_version(row.try_get("schema_version")?)?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            owner: row.try_get("owner")?,
            meta: Meta {
                ctime: row.try_get("ctime")?,
                mtime: row.try_get("mtime")?,
                schema_version: SCHEMA_VERSION,
                status: Status::try_from(row.try_get::<i64, _>("status")?)?,
            },
        })
    }

    /// Hand the org to `owner`, who must be an active user of this org.
    ///
    /// Validation and write are one conditional statement, so a user who is
    /// deactivated or moved concurrently can never become owner.
    pub async fn update_owner(&mut self, pool: &AnyPool, owner: &str) -> Result<(), ModelError> {
        let mut tx = pool.begin().await?;
        let ts = now();

        let result = sqlx::query(
            "update orgs set owner = $1, mtime = $2 where id = $3 and exists \
             (select 1 from users where users.id = $1 and users.org = $3 and users.status = $4)",
        )
        .bind(owner)
        .bind(ts)
        .bind(&self.id)
        .bind(Status::Active.as_i64())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: i64 = sqlx::query_scalar("select count(*) from orgs where id = $1")
                .bind(&self.id)
                .fetch_one(&mut *tx)
                .await?;
            return Err(if exists == 0 {
                ModelError::NotFound
            } else {
                ModelError::RelatedUser
            });
        }
        expect_one(result.rows_affected())?;

        tx.commit().await?;

        self.owner = owner.to_string();
        self.meta.mtime = ts;
        Ok(())
    }

    pub async fn update_status(&mut self, pool: &AnyPool, status: Status) -> Result<(), ModelError> {
        if status == Status::None {
            return Err(ModelError::DisallowedValue("status"));
        }
        self.meta.mtime = update_column(
            pool,
            ORGS_TABLE,
            &self.id,
            "status",
            ColumnValue::Int(status.as_i64()),
        )
        .await?;
        self.meta.status = status;
        Ok(())
    }
}

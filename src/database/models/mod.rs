pub mod org;
pub mod user;

pub use org::{Org, OWNER_NONE};
pub use user::{User, UserView};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{Any, Executor};
use thiserror::Error;

use crate::security::CryptError;

/// Version of the row layout this build understands. Rows carrying any
/// other value are refused rather than guessed at.
pub const SCHEMA_VERSION: i64 = 0;

/// Errors from the org and user store adapters
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Malformed value for {0}")]
    Malformed(&'static str),

    #[error("Uniqueness conflict")]
    Conflict,

    #[error("Related user is missing, inactive, or in another org")]
    RelatedUser,

    #[error("Related org is missing or inactive")]
    RelatedOrg,

    #[error("Value not allowed for {0}")]
    DisallowedValue(&'static str),

    #[error("Row has schema version {found}, expected {expected}")]
    ModelMigrate { found: i64, expected: i64 },

    #[error("Not found")]
    NotFound,

    #[error("Unexpected rows affected: {0}")]
    RowsAffected(u64),

    #[error("Unknown status value: {0}")]
    UnknownStatus(i64),

    #[error(transparent)]
    Crypt(#[from] CryptError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Lifecycle state shared by orgs and users.
///
/// `None` is the zero value of an unset field. It is never accepted from
/// external input and never written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    None,
    Unconfirmed,
    Active,
    Inactive,
}

impl Status {
    pub fn as_i64(self) -> i64 {
        match self {
            Status::None => -1,
            Status::Unconfirmed => 0,
            Status::Active => 1,
            Status::Inactive => 2,
        }
    }
}

impl TryFrom<i64> for Status {
    type Error = ModelError;

    /// Only the three storable states decode; -1 is rejected too.
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Unconfirmed),
            1 => Ok(Status::Active),
            2 => Ok(Status::Inactive),
            other => Err(ModelError::UnknownStatus(other)),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Status::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Bookkeeping columns carried by every entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Meta {
    pub ctime: i64,
    pub mtime: i64,
    pub schema_version: i64,
    pub status: Status,
}

impl Meta {
    pub(crate) fn with_status(status: Status) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            status,
            ..Default::default()
        }
    }
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.kind() == sqlx::error::ErrorKind::UniqueViolation)
}

/// Map an insert failure, turning unique-constraint hits into Conflict
pub(crate) fn insert_error(err: sqlx::Error) -> ModelError {
    if is_unique_violation(&err) {
        ModelError::Conflict
    } else {
        ModelError::Database(err)
    }
}

/// Single-row writes must touch exactly one row
pub(crate) fn expect_one(rows_affected: u64) -> Result<(), ModelError> {
    match rows_affected {
        1 => Ok(()),
        0 => Err(ModelError::NotFound),
        n => Err(ModelError::RowsAffected(n)),
    }
}

pub(crate) fn check_schema_version(found: i64) -> Result<(), ModelError> {
    if found != SCHEMA_VERSION {
        return Err(ModelError::ModelMigrate {
            found,
            expected: SCHEMA_VERSION,
        });
    }
    Ok(())
}

pub(crate) enum ColumnValue {
    Text(String),
    Int(i64),
}

/// Set one column and bump mtime on the row with `id`. Returns the new mtime.
pub(crate) async fn update_column<'e, E>(
    executor: E,
    table: &'static str,
    id: &str,
    column: &'static str,
    value: ColumnValue,
) -> Result<i64, ModelError>
where
    E: Executor<'e, Database = Any>,
{
    let mtime = now();
    let sql = format!("update {table} set {column} = $1, mtime = $2 where id = $3");
    let query = sqlx::query(&sql);
    let query = match value {
        ColumnValue::Text(s) => query.bind(s),
        ColumnValue::Int(i) => query.bind(i),
    };
    let result = query.bind(mtime).bind(id).execute(executor).await?;
    expect_one(result.rows_affected())?;
    Ok(mtime)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::database::Store;
    use crate::security::{Argon2Config, Codec, Key};

    pub fn codec() -> Codec {
        Codec::new(
            Key::random(),
            Argon2Config {
                memory_kib: 8 * 1024,
                iterations: 1,
                parallelism: 1,
            },
        )
    }

    pub async fn store() -> Store {
        Store::in_memory().await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(Status::None.as_i64(), -1);
        assert_eq!(Status::Unconfirmed.as_i64(), 0);
        assert_eq!(Status::Active.as_i64(), 1);
        assert_eq!(Status::Inactive.as_i64(), 2);
        assert_eq!(Status::default(), Status::None);
    }

    #[test]
    fn status_decoding_rejects_none_and_unknown() {
        assert_eq!(Status::try_from(1).unwrap(), Status::Active);
        assert!(matches!(Status::try_from(-1), Err(ModelError::UnknownStatus(-1))));
        assert!(matches!(Status::try_from(7), Err(ModelError::UnknownStatus(7))));
    }

    #[test]
    fn status_serde() {
        assert_eq!(serde_json::to_string(&Status::Inactive).unwrap(), "2");
        let s: Status = serde_json::from_str("0").unwrap();
        assert_eq!(s, Status::Unconfirmed);
        assert!(serde_json::from_str::<Status>("-1").is_err());
        assert!(serde_json::from_str::<Status>("\"active\"").is_err());
    }

    #[test]
    fn rows_affected() {
        assert!(expect_one(1).is_ok());
        assert!(matches!(expect_one(0), Err(ModelError::NotFound)));
        assert!(matches!(expect_one(2), Err(ModelError::RowsAffected(2))));
    }
}

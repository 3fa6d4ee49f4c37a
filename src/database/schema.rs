// DDL shared by Postgres and SQLite. Production schemas are migrated
// outside the service; this is the baseline layout the adapters expect.

pub const ORGS_TABLE: &str = "orgs";
pub const USERS_TABLE: &str = "users";

pub const APP_CREATE: &[&str] = &[
    r#"
    create table if not exists orgs (
        id text primary key,
        name text unique not null,
        owner text not null,
        schema_version bigint not null default 0,
        status bigint not null,
        ctime bigint not null,
        mtime bigint not null
    )
    "#,
    r#"
    create table if not exists users (
        id text primary key,
        api_secret text unique not null,
        api_secret_digest text unique not null,
        display_name text not null,
        display_name_digest text not null,
        email text not null,
        email_digest text not null,
        org text not null,
        password text not null,
        schema_version bigint not null default 0,
        status bigint not null,
        ctime bigint not null,
        mtime bigint not null
    )
    "#,
    "create unique index if not exists users_email_org on users (email_digest, org)",
];

// handlers/protected/mod.rs - Handlers behind a verified bearer token
//
// Every handler here takes the `Authenticated` extractor, then asks the
// authorization table before touching the store.

pub mod org;
pub mod status;
pub mod user;

pub use org::{org_get, org_post, org_put};
pub use status::{status_get, whoami_get};
pub use user::{self_put, user_get, user_post, user_put};

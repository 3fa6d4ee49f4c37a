pub mod manager;
pub mod models;
pub mod schema;

pub use manager::{DatabaseError, Store};
pub use models::{ModelError, Org, Status, User, UserView, OWNER_NONE};

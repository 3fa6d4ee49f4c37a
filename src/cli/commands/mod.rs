pub mod org;
pub mod session;
pub mod user;

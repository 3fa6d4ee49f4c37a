pub mod authorize;
pub mod session;
pub mod token;

pub use authorize::{authorize, can_perform, Decision, Forbidden, Operation};
pub use session::{classify, resolve, PrivilegeLevel, RootIds, Session, SessionError};
pub use token::{Claims, Token, TokenError, TokenService};

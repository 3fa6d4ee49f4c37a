pub mod response;
pub mod session;

pub use response::{ApiResponse, ApiResult};
pub use session::{header_str, Authenticated, ID_HEADER, TOKEN_REQUEST_HEADER};

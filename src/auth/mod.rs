//! Admin authentication: one configured credential pair, cookie-carried
//! session ids, and sliding session expiry.

pub mod cookie;
pub mod session;

pub use cookie::{expired_session_cookie, extract_cookie, session_cookie};
pub use session::SessionManager;

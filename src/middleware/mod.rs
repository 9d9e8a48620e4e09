pub mod auth;
pub mod error_handling;
pub mod login_limiter;

pub use auth::*;
pub use error_handling::*;
pub use login_limiter::*;

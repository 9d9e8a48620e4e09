pub mod inquiry;
pub mod user;

pub use inquiry::*;
pub use user::*;

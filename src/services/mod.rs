pub mod auth_service;
pub mod export_service;
pub mod inquiry_service;

pub use auth_service::*;
pub use export_service::*;
pub use inquiry_service::*;

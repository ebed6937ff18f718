pub mod config;
pub mod driver;
pub mod error;
pub mod export;
pub mod overlay;
pub mod session;
pub mod tasks;
pub mod video;

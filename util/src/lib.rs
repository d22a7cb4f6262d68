pub mod config;
pub mod state;

pub use config::AppConfig;

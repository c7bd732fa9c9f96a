pub mod check_config;
pub mod serve;

// Re-export command functions for convenience
pub use check_config::check_config;
pub use serve::{serve, ServeParams};

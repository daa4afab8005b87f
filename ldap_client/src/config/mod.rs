mod env;
mod error;
mod file_config;
mod params;
mod resolve;

pub use env::*;
pub use error::*;
pub use file_config::*;
pub use params::*;
pub use resolve::*;

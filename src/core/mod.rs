pub mod config;
pub mod error;
pub mod request;


pub use config::*;
pub use error::*;
pub use request::*;

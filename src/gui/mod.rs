pub mod app;
pub mod state;

#[cfg(test)]
mod app_test;

pub use app::*;

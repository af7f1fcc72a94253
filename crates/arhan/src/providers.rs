pub mod base;
pub mod configs;
pub mod errors;
pub mod openrouter;
pub mod utils;

#[cfg(test)]
pub mod mock;

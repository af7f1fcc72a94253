pub mod agent;
pub mod confirm;
pub mod developer;
pub mod dispatch;
pub mod errors;
pub mod history;
pub mod interface;
pub mod models;
pub mod narration;
pub mod prompt_template;
pub mod providers;
pub mod stream;
pub mod tools;

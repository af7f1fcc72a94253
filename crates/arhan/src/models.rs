//! These models represent the objects passed around by the agent
//!
//! The same structs are used for three things: the conversation held in memory,
//! the request body sent to the chat-completion endpoint, and the history file
//! written after each iteration. Keeping them in the OpenAI message shape means
//! a conversation loaded from disk can be sent to the model without conversion.
pub mod message;
pub mod role;
pub mod tool;

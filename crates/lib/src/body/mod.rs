//! Reusable job bodies.

mod cmd;
pub mod placeholder;

pub use cmd::CommandBody;

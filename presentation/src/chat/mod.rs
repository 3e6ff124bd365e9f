//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface over the session store.

mod command;
mod repl;

pub use command::ReplCommand;
pub use repl::ChatRepl;

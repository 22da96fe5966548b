//! walknet CLI library.
//!
//! Argument types, command handlers and text rendering for the `walknet-cli`
//! binary. Everything that touches the network goes through
//! [`walknet_lib::WalkEngine`].

pub mod args;
pub mod commands;
pub mod output;
pub mod terminal;

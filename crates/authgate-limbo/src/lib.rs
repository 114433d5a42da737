//! Limbo: where players wait until they log in or register.
//!
//! A player who is not restored from a session is placed in limbo: their
//! inventory is hidden, they cannot be hurt, their screen may be blacked
//! out, and a timeout starts. Limbo ends when the login or registration
//! flow releases them, or when the timeout kicks them.
//!
//! # Key types
//!
//! - [`LimboPlayer`]: the protective state held for one waiting player
//! - [`LimboRegistry`]: at most one `LimboPlayer` per name
//! - [`LimboService`]: admits players (applying the protections in
//!   order) and releases them
//! - [`CommandRunner`] / [`JoinCommands`]: commands run on admission
//!
//! Everything here runs on the main thread. Nothing is `async` and nothing
//! locks.

mod commands;
mod error;
mod player;
mod registry;
mod service;

pub use commands::{CommandRunner, JoinCommands, NoCommands};
pub use error::LimboError;
pub use player::{LimboKind, LimboPlayer};
pub use registry::LimboRegistry;
pub use service::{AdmitRequest, BLINDNESS_FALLBACK_TICKS, LimboService, LimboSettings};

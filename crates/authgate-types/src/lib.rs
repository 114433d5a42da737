//! Shared types for authgate.
//!
//! This crate defines the vocabulary every other layer speaks:
//!
//! - **Identity** ([`PlayerName`], [`Identity`]): who is connecting and
//!   from where.
//! - **Permissions** ([`AuthGroup`], [`Capability`]): the group labels the
//!   gate assigns and the capabilities it checks.
//! - **Messages** ([`MessageKey`]): every user-visible text the gate can
//!   send or kick with.
//! - **Host** ([`World`], [`PlayerHandle`]): the narrow view of the game
//!   server the gate is allowed to touch, and only from the main thread.
//!
//! # Architecture
//!
//! ```text
//! authgate (pipeline)  ← decides what happens to a connecting player
//!     ↕
//! session / limbo / scheduler  ← state machines and thread discipline
//!     ↕
//! Types (this crate)  ← identities, messages, host traits
//! ```

mod error;
mod host;
mod identity;
mod message;
mod permission;

pub use error::IdentityError;
pub use host::{
    BLINDNESS_AMPLIFIER, GameMode, PlayerHandle, TICKS_PER_SECOND, World,
    secs_to_ticks,
};
pub use identity::{Identity, PlayerName};
pub use message::MessageKey;
pub use permission::{AuthGroup, Capability};

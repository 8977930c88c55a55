//! Wire protocol and domain types shared between the capture-game client and its authority.

pub mod domain;
pub mod error;
pub mod protocol;

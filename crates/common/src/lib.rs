//! Common types shared across the presenter room crates.

#![warn(clippy::pedantic)]

/// Identifier types for rooms, participants and tracks
pub mod types;

/// Secret types that prevent accidental logging
pub mod secret;

/// Room-join JWT claims and signing helpers
pub mod jwt;

//! Token Service Library
//!
//! Signaling-trust service for the presenter client. It exchanges a
//! `(roomName, participantName)` pair for a short-lived HS256 token that
//! the media engine accepts as a room-join grant.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod routes;

//! Room session state machine.
//!
//! - `SessionController`: the actor owning the join attempt and connection
//! - `SessionHandle`: cloneable front end used by the UI layer
//! - `SessionPhase`: observable phase of the session

pub mod controller;
pub mod messages;

pub use controller::{SessionController, SessionHandle};
pub use messages::SessionPhase;

//! Pointcheval-Sanders signatures over a pairing, with signing of messages
//! that are only known through a commitment, and blinding of signatures so
//! that they can be shown without being linkable.
mod errors;
mod known_message;
mod public;
mod secret;
mod signature;
mod unknown_message;

pub use errors::*;
pub use known_message::*;
pub use public::*;
pub use secret::*;
pub use signature::*;
pub use unknown_message::*;

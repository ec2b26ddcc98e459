//! Inbound push messages.

mod message_parser;
mod messages_model;

pub use message_parser::{decode_message, parse_envelope, parse_positions_message};
pub use messages_model::*;

//! FIX Message Model
//!
//! Field maps, message types and tag constants shared by the request
//! builders, the inbound views and the dispatcher.

mod message;
pub mod tags;

pub use message::{FieldMap, FixMessage, MsgType};
pub use tags::Tag;

//! Record types persisted by the stores
//!
//! Records validate their inputs in their constructors; a value of `Item` or
//! `Transcription` is always fit to be inserted.

mod item;
mod transcription;

pub use item::{discount_percent, Item, NewItem};
pub use transcription::{NewTranscription, Transcription, PENDING_TRANSCRIPTION_TEXT};

#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod player;
pub mod time;

pub use error::Error;
pub use player::{PlayerSnapshot, PlayerState, QuestionBadge, TickOutcome, TryoutPlayer};
pub use time::Clock;

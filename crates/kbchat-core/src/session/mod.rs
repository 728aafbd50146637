mod core;

pub use self::core::{ChatSession, SessionEvent, TurnOutcome, TurnState};

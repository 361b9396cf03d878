//! Small internal utilities.
pub mod devlog;

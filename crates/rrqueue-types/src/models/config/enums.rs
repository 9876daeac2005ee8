//! Configuration enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// When a round-robin connection moves its rotation index forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Read the index, forward the call, then store the next index.
    /// Concurrent callers may land on the same backend.
    #[default]
    AfterDispatch,
    /// Atomically claim the slot before forwarding the call.
    /// A failed backend call still consumes its slot.
    Reserve,
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::AfterDispatch => write!(f, "after_dispatch"),
            Self::Reserve => write!(f, "reserve"),
        }
    }
}

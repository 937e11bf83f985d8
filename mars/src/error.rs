use core::fmt;

use corewar_engine::EmulatorError;
use redcode_parser::AssembleError;

/// Failures that can occur while assembling, loading, or running a battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarsError {
    /// Assembly of source text failed; see the contained error for the line
    /// and reason.
    AssembleFailed(AssembleError),
    /// Loading a warrior was requested after the core's warrior capacity
    /// (fixed at [`crate::Mars::new`]) was already full.
    TooManyWarriors,
    /// A warrior's compiled program has more instructions than
    /// [`crate::MarsProperties::max_length`] allows.
    WarriorTooLong,
    /// The underlying emulator reported an error.
    Emulator(EmulatorError),
    /// An operation referenced a [`crate::WarriorId`] that this `Mars`
    /// never assigned via [`crate::Mars::load`]. A dead warrior's id remains
    /// known — its P-space stays addressable after it dies.
    UnknownWarrior,
}

impl fmt::Display for MarsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssembleFailed(err) => write!(f, "assembly failed: {err}"),
            Self::TooManyWarriors => {
                write!(f, "no warrior capacity remaining in this core")
            }
            Self::WarriorTooLong => {
                write!(f, "warrior program exceeds the configured max_length")
            }
            Self::Emulator(err) => write!(f, "emulator error: {err}"),
            Self::UnknownWarrior => {
                write!(f, "no loaded warrior has this id")
            }
        }
    }
}

impl std::error::Error for MarsError {}

impl From<EmulatorError> for MarsError {
    fn from(err: EmulatorError) -> Self {
        Self::Emulator(err)
    }
}

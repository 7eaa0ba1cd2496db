//! Revision state machine
//!
//! ```text
//! Resolving -> Transforming -> Persisting -> Succeeded(id)
//!     |             |              |
//!     +-------------+--------------+----> Failed { phase, reason }
//! ```
//!
//! Strictly sequential; the only branch is early exit on failure.
//! Terminal states never transition again.

use std::fmt;

use crate::store::VariantId;

/// Non-terminal phase of a revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionPhase {
    Resolving,
    Transforming,
    Persisting,
}

impl RevisionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionPhase::Resolving => "resolving",
            RevisionPhase::Transforming => "transforming",
            RevisionPhase::Persisting => "persisting",
        }
    }

    fn next(self) -> Option<RevisionPhase> {
        match self {
            RevisionPhase::Resolving => Some(RevisionPhase::Transforming),
            RevisionPhase::Transforming => Some(RevisionPhase::Persisting),
            RevisionPhase::Persisting => None,
        }
    }
}

impl fmt::Display for RevisionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionState {
    Running(RevisionPhase),
    Succeeded(VariantId),
    Failed { phase: RevisionPhase, reason: String },
}

impl RevisionState {
    /// Initial state
    pub fn start() -> Self {
        RevisionState::Running(RevisionPhase::Resolving)
    }

    /// Move to the next phase. Returns the new phase, or `None` if the state
    /// is terminal or already persisting.
    pub fn advance(&mut self) -> Option<RevisionPhase> {
        let next = match self {
            RevisionState::Running(phase) => phase.next()?,
            _ => return None,
        };
        *self = RevisionState::Running(next);
        Some(next)
    }

    /// Persisting -> Succeeded. Returns false from any other state.
    pub fn succeed(&mut self, id: VariantId) -> bool {
        if *self != RevisionState::Running(RevisionPhase::Persisting) {
            return false;
        }
        *self = RevisionState::Succeeded(id);
        true
    }

    /// Running -> Failed in the current phase. Returns the failed phase.
    pub fn fail(&mut self, reason: impl Into<String>) -> Option<RevisionPhase> {
        let phase = self.phase()?;
        *self = RevisionState::Failed {
            phase,
            reason: reason.into(),
        };
        Some(phase)
    }

    /// Current phase while running
    pub fn phase(&self) -> Option<RevisionPhase> {
        match self {
            RevisionState::Running(phase) => Some(*phase),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RevisionState::Running(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = RevisionState::start();
        assert_eq!(state.phase(), Some(RevisionPhase::Resolving));
        assert_eq!(state.advance(), Some(RevisionPhase::Transforming));
        assert_eq!(state.advance(), Some(RevisionPhase::Persisting));
        assert_eq!(state.advance(), None);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_cannot_succeed_before_persisting() {
        let mut state = RevisionState::start();
        state.advance();
        assert_eq!(state.fail("transformer down"), Some(RevisionPhase::Transforming));
        assert!(state.is_terminal());
        assert_eq!(state.advance(), None);
        assert_eq!(state.fail("again"), None);
    }

    #[test]
    fn test_failed_keeps_phase_and_reason() {
        let mut state = RevisionState::start();
        state.fail("not found");
        assert_eq!(
            state,
            RevisionState::Failed {
                phase: RevisionPhase::Resolving,
                reason: "not found".to_string()
            }
        );
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RevisionPhase::Resolving.to_string(), "resolving");
        assert_eq!(RevisionPhase::Persisting.as_str(), "persisting");
    }
}

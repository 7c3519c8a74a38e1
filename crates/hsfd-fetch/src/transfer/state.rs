use std::fmt;

/// States of the chunked transfer loop.
///
/// Transfers move through these states in order:
/// Idle → AwaitingLink → Connecting → Streaming → Completed
///
/// `AwaitingLink`, `Connecting` and `Streaming` may instead move to `Failed`.
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    /// Task created, nothing started.
    #[default]
    Idle,

    /// Blocked on the link readiness gate.
    AwaitingLink,

    /// Opening the secure session and the output sink.
    Connecting,

    /// Moving chunks from the session to the sink.
    Streaming,

    /// End of stream reached and everything finalized.
    Completed,

    /// Aborted; all acquired resources have been released.
    Failed,
}

impl TransferState {
    /// Whether `self → next` is an edge of the state machine.
    #[must_use]
    pub fn can_advance_to(self, next: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, next),
            (Idle, AwaitingLink)
                | (AwaitingLink, Connecting)
                | (AwaitingLink, Failed)
                | (Connecting, Streaming)
                | (Connecting, Failed)
                | (Streaming, Completed)
                | (Streaming, Failed)
        )
    }

    /// Take the edge `self → next`, or report it as illegal.
    pub fn advance(self, next: TransferState) -> Result<TransferState, IllegalTransition> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(IllegalTransition { from: self, to: next })
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool { matches!(self, TransferState::Completed | TransferState::Failed) }
}

/// An edge that is not part of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: TransferState,
    pub to:   TransferState,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferState::Idle => write!(f, "Idle"),
            TransferState::AwaitingLink => write!(f, "AwaitingLink"),
            TransferState::Connecting => write!(f, "Connecting"),
            TransferState::Streaming => write!(f, "Streaming"),
            TransferState::Completed => write!(f, "Completed"),
            TransferState::Failed => write!(f, "Failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransferState::*;

    const ALL: [TransferState; 6] = [Idle, AwaitingLink, Connecting, Streaming, Completed, Failed];

    #[test]
    fn test_happy_path_edges() {
        assert!(Idle.can_advance_to(AwaitingLink));
        assert!(AwaitingLink.can_advance_to(Connecting));
        assert!(Connecting.can_advance_to(Streaming));
        assert!(Streaming.can_advance_to(Completed));
    }

    #[test]
    fn test_failure_edges() {
        assert!(AwaitingLink.can_advance_to(Failed));
        assert!(Connecting.can_advance_to(Failed));
        assert!(Streaming.can_advance_to(Failed));
        assert!(!Idle.can_advance_to(Failed));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for next in ALL {
            assert!(!Completed.can_advance_to(next));
            assert!(!Failed.can_advance_to(next));
        }
        assert!(Completed.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Streaming.is_terminal());
    }

    #[test]
    fn test_advance_checks_every_edge() {
        for from in ALL {
            for to in ALL {
                match from.advance(to) {
                    Ok(next) => {
                        assert!(from.can_advance_to(to));
                        assert_eq!(next, to);
                    }
                    Err(e) => {
                        assert!(!from.can_advance_to(to));
                        assert_eq!(e, IllegalTransition { from, to });
                    }
                }
            }
        }
        assert_eq!(
            Idle.advance(Streaming).unwrap_err().to_string(),
            "illegal transition Idle -> Streaming"
        );
    }

    #[test]
    fn test_no_skipping_the_gate() {
        assert!(!Idle.can_advance_to(Connecting));
        assert!(!Idle.can_advance_to(Streaming));
        assert!(!AwaitingLink.can_advance_to(Streaming));
        assert!(!Connecting.can_advance_to(Completed));
    }
}

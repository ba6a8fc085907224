//! Per-run lifecycle state machine.

/// Lifecycle of a single script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    /// Request received, nothing started.
    #[default]
    Idle,
    /// Opening the script and spawning the interpreter.
    Launching,
    /// Child process is running.
    Running,
    /// Child exited on its own.
    Completed,
    /// Child was killed after exceeding its timeout.
    TimedOut,
    /// Child could not be spawned or waited on.
    LaunchFailed,
    /// Result has been assembled for the caller.
    ResultReady,
}

impl ExecutionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Idle -> Launching
    /// - Launching -> Running | LaunchFailed
    /// - Running -> Completed | TimedOut | LaunchFailed
    /// - Completed | TimedOut | LaunchFailed -> ResultReady
    pub fn can_transition_to(&self, target: ExecutionState) -> bool {
        use ExecutionState::*;
        matches!(
            (*self, target),
            (Idle, Launching)
                | (Launching, Running)
                | (Launching, LaunchFailed)
                | (Running, Completed)
                | (Running, TimedOut)
                | (Running, LaunchFailed)
                | (Completed, ResultReady)
                | (TimedOut, ResultReady)
                | (LaunchFailed, ResultReady)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: ExecutionState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            tracing::debug!(from = ?*self, to = ?target, "execution state transition");
            *self = target;
            Ok(())
        } else {
            Err(crate::error::RunnerError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Whether the child process has finished one way or another.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::TimedOut | ExecutionState::LaunchFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = ExecutionState::Idle;
        assert!(state.transition_to(ExecutionState::Launching).is_ok());
        assert!(state.transition_to(ExecutionState::Running).is_ok());
        assert!(state.transition_to(ExecutionState::Completed).is_ok());
        assert!(state.is_terminal());
        assert!(state.transition_to(ExecutionState::ResultReady).is_ok());
        assert_eq!(state, ExecutionState::ResultReady);
    }

    #[test]
    fn test_timeout_path() {
        let mut state = ExecutionState::Running;
        assert!(state.transition_to(ExecutionState::TimedOut).is_ok());
        assert!(state.transition_to(ExecutionState::ResultReady).is_ok());
    }

    #[test]
    fn test_launch_failure_path() {
        let mut state = ExecutionState::Launching;
        assert!(state.transition_to(ExecutionState::LaunchFailed).is_ok());
        assert!(state.transition_to(ExecutionState::ResultReady).is_ok());
    }

    #[test]
    fn test_no_retry_after_failure() {
        let mut state = ExecutionState::LaunchFailed;
        assert!(state.transition_to(ExecutionState::Launching).is_err());
        assert_eq!(state, ExecutionState::LaunchFailed);
    }

    #[test]
    fn test_cannot_skip_launch() {
        let mut state = ExecutionState::Idle;
        assert!(state.transition_to(ExecutionState::Running).is_err());
        assert!(state.transition_to(ExecutionState::Completed).is_err());
        assert_eq!(state, ExecutionState::Idle);
    }

    #[test]
    fn test_result_ready_is_final() {
        let mut state = ExecutionState::ResultReady;
        assert!(state.transition_to(ExecutionState::Idle).is_err());
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_default() {
        assert_eq!(ExecutionState::default(), ExecutionState::Idle);
    }
}

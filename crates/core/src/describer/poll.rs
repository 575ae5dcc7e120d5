//! Poll state machine for asynchronous description jobs.
//!
//! `Submitted → Polling { attempts } → Complete | Failed`. Each poll failure
//! (service error or still-in-progress) increments the attempt counter;
//! exceeding the budget terminates in `Failed`.

use super::types::DescribeError;

/// One observation from polling the job endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Completed(String),
    Failed(String),
    InProgress,
}

/// State of an asynchronous description job.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Submitted { job_id: String },
    Polling { job_id: String, attempts: u32 },
    Complete { text: String },
    Failed { reason: String },
}

impl PollState {
    pub fn new(job_id: impl Into<String>) -> Self {
        PollState::Submitted {
            job_id: job_id.into(),
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            PollState::Submitted { job_id } | PollState::Polling { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Complete { .. } | PollState::Failed { .. })
    }

    /// Advance on a poll observation.
    pub fn advance(
        self,
        observation: Result<JobStatus, DescribeError>,
        max_attempts: u32,
    ) -> PollState {
        let (job_id, attempts) = match self {
            PollState::Submitted { job_id } => (job_id, 0),
            PollState::Polling { job_id, attempts } => (job_id, attempts),
            terminal => return terminal,
        };

        match observation {
            Ok(JobStatus::Completed(text)) => PollState::Complete { text },
            Ok(JobStatus::Failed(reason)) => PollState::Failed { reason },
            Ok(JobStatus::InProgress) | Err(_) => {
                let attempts = attempts + 1;
                if attempts >= max_attempts {
                    PollState::Failed {
                        reason: format!("job {} exceeded {} poll attempts", job_id, max_attempts),
                    }
                } else {
                    PollState::Polling { job_id, attempts }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_on_completed_observation() {
        let state = PollState::new("job-1")
            .advance(Ok(JobStatus::InProgress), 5)
            .advance(Ok(JobStatus::Completed("a cat".to_string())), 5);

        assert_eq!(
            state,
            PollState::Complete {
                text: "a cat".to_string()
            }
        );
    }

    #[test]
    fn test_fails_on_failed_observation() {
        let state = PollState::new("job-1").advance(Ok(JobStatus::Failed("nsfw".to_string())), 5);
        assert!(matches!(state, PollState::Failed { .. }));
    }

    #[test]
    fn test_attempts_exhaustion_fails() {
        let mut state = PollState::new("job-1");
        for _ in 0..3 {
            state = state.advance(Ok(JobStatus::InProgress), 3);
        }
        assert!(matches!(state, PollState::Failed { .. }));
    }

    #[test]
    fn test_poll_errors_count_as_attempts() {
        let mut state = PollState::new("job-1");
        state = state.advance(
            Err(DescribeError::Http("connection reset".to_string())),
            2,
        );
        assert_eq!(
            state,
            PollState::Polling {
                job_id: "job-1".to_string(),
                attempts: 1
            }
        );

        state = state.advance(Err(DescribeError::Http("again".to_string())), 2);
        assert!(matches!(state, PollState::Failed { .. }));
    }

    #[test]
    fn test_terminal_states_absorb() {
        let complete = PollState::Complete {
            text: "done".to_string(),
        };
        let after = complete.clone().advance(Ok(JobStatus::InProgress), 5);
        assert_eq!(after, complete);
    }

    #[test]
    fn test_job_id_accessor() {
        assert_eq!(PollState::new("j").job_id(), Some("j"));
        assert_eq!(
            PollState::Failed {
                reason: "r".to_string()
            }
            .job_id(),
            None
        );
    }
}

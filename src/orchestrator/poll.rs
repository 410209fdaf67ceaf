//! The job polling state machine.
//!
//! Polling is modeled as a pure transition function so the attempt
//! accounting can be tested without timers or a server. The caller performs
//! the effects: issuing requests, sleeping, and delivering the result.
//!
//! ```text
//!            NotReady, attempt < max
//!          ┌──────────── Wait ─────────────┐
//!          ▼                               │
//!   Polling { attempt } ───────────────────┘
//!          │                    │
//!    Ready │                    │ NotReady, attempt == max
//!          ▼                    ▼
//!   Completed { attempt }   TimedOut { attempts }
//! ```

/// Where a polling loop stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Poll request number `attempt` is due or in flight. Attempts start at 1.
    Polling { attempt: u32 },
    /// The job produced its result on `attempt`.
    Completed { attempt: u32 },
    /// The ceiling was reached without a result.
    TimedOut { attempts: u32 },
}

impl PollState {
    pub fn start() -> Self {
        PollState::Polling { attempt: 1 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling { .. })
    }
}

/// The answer to one poll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent<T> {
    Ready(T),
    NotReady,
}

/// What the caller must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEffect<T> {
    /// Hand the result on; polling is over.
    Deliver(T),
    /// Sleep for the poll interval, then issue `next_attempt`.
    Wait { next_attempt: u32 },
    /// Give up after `attempts` requests.
    GiveUp { attempts: u32 },
    /// The state was already terminal; nothing to do.
    Ignore,
}

/// Advances the polling state by one response.
pub fn transition<T>(
    state: PollState,
    event: PollEvent<T>,
    max_attempts: u32,
) -> (PollState, PollEffect<T>) {
    let attempt = match state {
        PollState::Polling { attempt } => attempt,
        terminal => return (terminal, PollEffect::Ignore),
    };

    match event {
        PollEvent::Ready(value) => (PollState::Completed { attempt }, PollEffect::Deliver(value)),
        PollEvent::NotReady if attempt >= max_attempts => (
            PollState::TimedOut { attempts: attempt },
            PollEffect::GiveUp { attempts: attempt },
        ),
        PollEvent::NotReady => (
            PollState::Polling {
                attempt: attempt + 1,
            },
            PollEffect::Wait {
                next_attempt: attempt + 1,
            },
        ),
    }
}

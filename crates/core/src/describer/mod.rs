//! Accessibility description generation.
//!
//! Talks to an AltText-style description service. Generation is always
//! best-effort: a timeout, API error, or exhausted poll budget produces a
//! `Description` with `Failed` status, never an error that could block a
//! publish.

mod client;
mod poll;
mod types;

pub use client::AltTextClient;
pub use poll::{JobStatus, PollState};
pub use types::{
    DescribeError, Describer, Description, DescriptionStatus, Sleep, TokioSleep,
};

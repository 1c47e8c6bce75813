//! Veno domain engine: CBT test sessions and activity streaks.
//!
//! Pure application logic with no I/O. Callers supply the clock
//! (`DateTime<Utc>` / `NaiveDate` arguments), which keeps every
//! transition deterministic and testable.

pub mod streaks;
pub mod test_session;

pub use streaks::StreakTracker;
pub use test_session::{
    Question, QuestionOutcome, SessionError, TestConfig, TestPhase, TestResult, TestSession,
};

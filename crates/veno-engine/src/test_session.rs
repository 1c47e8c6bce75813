//! CBT test-session state machine.
//!
//! One session walks `NotStarted → InProgress → Submitted | Expired`.
//! The deadline is checked on every mutating call: once it passes, the
//! session expires and whatever was answered is graded. Callers pass
//! `now` explicitly.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;
use veno_common::AttemptId;

/// A multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct: usize,
}

#[derive(Debug, Clone)]
pub struct TestConfig {
    pub duration_secs: u64,
    pub shuffle_questions: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            duration_secs: 1200,
            shuffle_questions: true,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("test has not been started")]
    NotStarted,

    #[error("test already started")]
    AlreadyStarted,

    #[error("test is over")]
    Finished,

    #[error("no question at index {0}")]
    QuestionOutOfRange(usize),

    #[error("choice {choice} is out of range for question {index}")]
    ChoiceOutOfRange { index: usize, choice: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    NotStarted,
    InProgress,
    Submitted,
    Expired,
}

/// Per-question grading outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub selected: Option<usize>,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub attempt_id: AttemptId,
    pub score: u32,
    pub total: u32,
    pub outcomes: Vec<QuestionOutcome>,
}

/// A single test attempt.
pub struct TestSession {
    attempt_id: AttemptId,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    config: TestConfig,
    phase: TestPhase,
    deadline: Option<DateTime<Utc>>,
    current: usize,
    result: Option<TestResult>,
}

impl TestSession {
    pub fn new(questions: Vec<Question>, config: TestConfig) -> Self {
        let count = questions.len();
        Self {
            attempt_id: AttemptId::new(),
            questions,
            answers: vec![None; count],
            config,
            phase: TestPhase::NotStarted,
            deadline: None,
            current: 0,
            result: None,
        }
    }

    pub fn attempt_id(&self) -> &AttemptId {
        &self.attempt_id
    }

    pub fn phase(&self) -> TestPhase {
        self.phase
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Grading outcome, available once the session is submitted or expired.
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    /// Begin the attempt: fixes the deadline and, when configured,
    /// shuffles question order.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.phase != TestPhase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        if self.config.shuffle_questions {
            self.questions.shuffle(&mut rand::thread_rng());
        }
        self.deadline = Some(now + Duration::seconds(self.config.duration_secs as i64));
        self.phase = TestPhase::InProgress;
        debug!(attempt_id = %self.attempt_id, questions = self.questions.len(), "test started");
        Ok(())
    }

    /// Time left on the clock. Full duration before start, zero after the
    /// session finishes.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        match (self.phase, self.deadline) {
            (TestPhase::InProgress, Some(deadline)) => (deadline - now).max(Duration::zero()),
            (TestPhase::NotStarted, _) => Duration::seconds(self.config.duration_secs as i64),
            _ => Duration::zero(),
        }
    }

    /// Record the chosen option for a question, replacing any prior choice.
    pub fn select_answer(
        &mut self,
        index: usize,
        choice: usize,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.expire_if_due(now);
        self.require_in_progress()?;

        let question = self
            .questions
            .get(index)
            .ok_or(SessionError::QuestionOutOfRange(index))?;
        if choice >= question.options.len() {
            return Err(SessionError::ChoiceOutOfRange { index, choice });
        }
        self.answers[index] = Some(choice);
        Ok(())
    }

    /// Jump to a question.
    pub fn goto(&mut self, index: usize, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.expire_if_due(now);
        self.require_in_progress()?;
        if index >= self.questions.len() {
            return Err(SessionError::QuestionOutOfRange(index));
        }
        self.current = index;
        Ok(())
    }

    /// Advance to the next question, clamping at the last.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let last = self.questions.len().saturating_sub(1);
        let target = (self.current + 1).min(last);
        self.goto(target, now)
    }

    /// Step back to the previous question, clamping at the first.
    pub fn previous(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let target = self.current.saturating_sub(1);
        self.goto(target, now)
    }

    /// Submit the attempt and grade it.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<TestResult, SessionError> {
        self.expire_if_due(now);
        self.require_in_progress()?;

        let result = self.grade();
        self.phase = TestPhase::Submitted;
        debug!(
            attempt_id = %self.attempt_id,
            score = result.score,
            total = result.total,
            "test submitted"
        );
        self.result = Some(result.clone());
        Ok(result)
    }

    fn require_in_progress(&self) -> Result<(), SessionError> {
        match self.phase {
            TestPhase::InProgress => Ok(()),
            TestPhase::NotStarted => Err(SessionError::NotStarted),
            TestPhase::Submitted | TestPhase::Expired => Err(SessionError::Finished),
        }
    }

    fn expire_if_due(&mut self, now: DateTime<Utc>) {
        if self.phase != TestPhase::InProgress {
            return;
        }
        let Some(deadline) = self.deadline else {
            return;
        };
        if now >= deadline {
            let result = self.grade();
            debug!(
                attempt_id = %self.attempt_id,
                score = result.score,
                "test expired, graded as-is"
            );
            self.result = Some(result);
            self.phase = TestPhase::Expired;
        }
    }

    fn grade(&self) -> TestResult {
        let outcomes: Vec<QuestionOutcome> = self
            .questions
            .iter()
            .zip(&self.answers)
            .map(|(question, answer)| QuestionOutcome {
                question_id: question.id.clone(),
                selected: *answer,
                correct: *answer == Some(question.correct),
            })
            .collect();
        let score = outcomes.iter().filter(|o| o.correct).count() as u32;
        TestResult {
            attempt_id: self.attempt_id.clone(),
            score,
            total: self.questions.len() as u32,
            outcomes,
        }
    }
}

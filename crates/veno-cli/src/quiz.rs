//! Interactive quiz runner for the terminal.

use std::io::{self, BufRead, Write};

use chrono::Utc;
use veno_api::QuestionDto;
use veno_common::VenoError;
use veno_engine::{Question, SessionError, TestConfig, TestSession};

fn to_question(dto: QuestionDto) -> Question {
    Question {
        id: dto.id,
        text: dto.text,
        options: dto.options,
        correct: dto.correct_index,
    }
}

/// Load questions from `file` and run one attempt over stdin.
pub fn run(file: &str, duration_secs: u64, shuffle: bool) -> Result<(), VenoError> {
    let raw = std::fs::read_to_string(file)?;
    let dtos: Vec<QuestionDto> = serde_json::from_str(&raw)
        .map_err(|e| VenoError::Other(format!("failed to parse {file}: {e}")))?;
    if dtos.is_empty() {
        return Err(VenoError::Other(format!("{file} contains no questions")));
    }

    let questions: Vec<Question> = dtos.into_iter().map(to_question).collect();
    let mut session = TestSession::new(
        questions,
        TestConfig {
            duration_secs,
            shuffle_questions: shuffle,
        },
    );
    session
        .start(Utc::now())
        .map_err(|e| VenoError::Session(e.to_string()))?;

    println!(
        "{} questions, {} minutes. Answer with the option number, or press Enter to skip.\n",
        session.question_count(),
        duration_secs / 60
    );

    let stdin = io::stdin();
    let total = session.question_count();
    'questions: for index in 0..total {
        if session.goto(index, Utc::now()).is_err() {
            break;
        }
        let question = session
            .current_question()
            .expect("index is in range")
            .clone();

        println!("[{}/{}] {}", index + 1, total, question.text);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }

        loop {
            print!("> ");
            let _ = io::stdout().flush();
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break 'questions;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break; // skipped
            }
            let Ok(number) = trimmed.parse::<usize>() else {
                println!("enter a number between 1 and {}", question.options.len());
                continue;
            };
            match session.select_answer(index, number.wrapping_sub(1), Utc::now()) {
                Ok(()) => break,
                Err(SessionError::ChoiceOutOfRange { .. }) => {
                    println!("enter a number between 1 and {}", question.options.len());
                }
                Err(_) => break 'questions, // time ran out
            }
        }
    }

    let result = match session.submit(Utc::now()) {
        Ok(result) => result,
        Err(_) => {
            println!("\nTime up — grading what you answered.");
            session
                .result()
                .cloned()
                .ok_or_else(|| VenoError::Session("no result after expiry".into()))?
        }
    };

    println!("\nScore: {}/{}", result.score, result.total);
    for outcome in &result.outcomes {
        let mark = if outcome.correct { "✓" } else { "✗" };
        println!("  {mark} {}", outcome.question_id);
    }
    Ok(())
}

//! Line-oriented terminal front end for a quiz attempt.

use std::fmt::{self, Write as _};

use quiz_core::model::{OptionId, QuizId};
use quiz_core::{CellStatus, SessionCommand};
use services::quiz_sessions::{
    NavigationScreen, QuestionScreen, Screen, SubmissionState, SummaryScreen,
};
use services::{ActiveQuiz, AttemptSnapshot, Award, CommandOutcome, QuizSessionService};
use tokio::io::{AsyncBufReadExt, BufReader};

const GRID_WIDTH: usize = 5;

const HELP: &str = "\
Commands:
  <label>     select an option (e.g. A)
  check       check the selected option
  next        go to the next question (finishes the quiz on the last one)
  back        go to the previous question
  grid        show all questions
  jump <n>    go to question n (from the grid)
  close       close the grid
  retake      start over (from the summary)
  retry       resend a score that failed to submit
  help        show this help
  quit        leave; progress is kept";

//
// ─── INPUT ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Select(String),
    Session(SessionCommand),
    Retry,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Empty,
    MissingJumpTarget,
    InvalidJumpTarget(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "empty input"),
            InputError::MissingJumpTarget => write!(f, "jump requires a question number"),
            InputError::InvalidJumpTarget(raw) => write!(f, "invalid question number: {raw}"),
        }
    }
}

impl std::error::Error for InputError {}

/// Parse one line of user input. Anything that is not a keyword is an option label.
pub fn parse_input(line: &str) -> Result<Input, InputError> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err(InputError::Empty);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "check" => SessionCommand::CheckAnswer,
        "next" => SessionCommand::Advance,
        "back" => SessionCommand::Retreat,
        "grid" => SessionCommand::OpenNavigation,
        "close" => SessionCommand::CloseNavigation,
        "retake" => SessionCommand::Retake,
        "jump" => {
            let raw = parts.next().ok_or(InputError::MissingJumpTarget)?;
            let number = raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| InputError::InvalidJumpTarget(raw.to_owned()))?;
            SessionCommand::JumpTo(number - 1)
        }
        "retry" => return Ok(Input::Retry),
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" => return Ok(Input::Quit),
        _ => return Ok(Input::Select(head.to_owned())),
    };
    Ok(Input::Session(command))
}

/// Match a typed label against the current question's options, ignoring case.
fn resolve_option(active: &ActiveQuiz, label: &str) -> OptionId {
    active
        .session()
        .current_question()
        .options()
        .iter()
        .find(|option| option.id().as_str().eq_ignore_ascii_case(label))
        .map_or_else(|| OptionId::from(label), |option| option.id().clone())
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

pub fn render(snapshot: &AttemptSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== {} ==  ({} of {} points)",
        snapshot.title, snapshot.running_points, snapshot.max_score
    );
    match &snapshot.screen {
        Screen::Question(screen) => render_question(&mut out, screen),
        Screen::Navigation(screen) => render_grid(&mut out, screen),
        Screen::Summary(screen) => render_summary(&mut out, screen),
    }
    out
}

fn render_question(out: &mut String, screen: &QuestionScreen) {
    let _ = writeln!(
        out,
        "Question {}/{}  [{} pt]",
        screen.number(),
        screen.total,
        screen.point_value
    );
    let _ = writeln!(out, "{}", screen.text);
    for option in &screen.options {
        let mark = if option.selected { "x" } else { " " };
        let verdict = match option.is_correct {
            Some(true) => "  <- correct",
            Some(false) if option.selected => "  <- your answer",
            _ => "",
        };
        let _ = writeln!(out, "  [{mark}] {}. {}{verdict}", option.id, option.text);
    }
    match screen.answered_correctly {
        Some(true) => {
            let _ = writeln!(out, "Correct!");
        }
        Some(false) => {
            let _ = writeln!(out, "Not quite.");
        }
        None => {}
    }

    let mut hints = Vec::new();
    if screen.can_check {
        hints.push("check");
    }
    if screen.can_advance {
        hints.push(if screen.is_last { "next (finish)" } else { "next" });
    }
    if screen.can_retreat {
        hints.push("back");
    }
    hints.push("grid");
    let _ = writeln!(out, "> {}", hints.join(" | "));
}

fn render_grid(out: &mut String, screen: &NavigationScreen) {
    let grid = &screen.grid;
    let _ = writeln!(
        out,
        "Answered {} of {}",
        grid.answered_count(),
        grid.cells().len()
    );
    for row in grid.rows(GRID_WIDTH) {
        let line: Vec<String> = row
            .iter()
            .map(|cell| {
                let status = match cell.status {
                    CellStatus::Unanswered => ' ',
                    CellStatus::Correct => '+',
                    CellStatus::Incorrect => '-',
                };
                let current = if cell.is_current { '>' } else { ' ' };
                format!("{current}{:>2}{status}", cell.number())
            })
            .collect();
        let _ = writeln!(out, "{}", line.join(" "));
    }
    if let Some(index) = grid.first_unanswered() {
        let _ = writeln!(out, "First unanswered: {}", index + 1);
    }
    let _ = writeln!(out, "> jump <n> | close");
}

fn render_summary(out: &mut String, screen: &SummaryScreen) {
    let report = &screen.report;
    let _ = writeln!(
        out,
        "Finished: {}/{} correct ({}%), {} of {} points",
        report.correct_count,
        report.total_questions,
        report.percentage,
        report.total_score,
        report.max_score
    );
    if report.is_perfect() {
        let _ = writeln!(out, "Perfect score!");
    }
    let status = match screen.submission {
        SubmissionState::Settled(done) => match done.award {
            Award::Submitted { points } => format!("Submitted {points} points."),
            Award::NotFirstAttempt => {
                "No points earned: this quiz was already attempted.".to_owned()
            }
        },
        SubmissionState::SubmissionFailed(_) => {
            "Your score could not be submitted. Type `retry` to try again.".to_owned()
        }
        SubmissionState::ClearFailed(_) => {
            "Score saved, but local progress could not be cleared. Type `retry`.".to_owned()
        }
        SubmissionState::Pending => String::new(),
    };
    if !status.is_empty() {
        let _ = writeln!(out, "{status}");
    }
    let _ = writeln!(out, "> retake | grid | quit");
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

/// Play `quiz_id` interactively on stdin/stdout until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if the attempt cannot start or stdin cannot be read. Errors
/// from individual commands are printed and the loop continues.
pub async fn play(
    service: &QuizSessionService,
    quiz_id: QuizId,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut active = service.start(quiz_id).await?;
    if active.was_restored() {
        println!("Resuming your previous attempt.");
    }
    println!("{}", render(&AttemptSnapshot::of(&active)));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(InputError::Empty) => continue,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };

        let result = match input {
            Input::Quit => break,
            Input::Help => {
                println!("{HELP}");
                continue;
            }
            Input::Retry => service
                .retry_submission(&mut active)
                .await
                .map(CommandOutcome::Finalized),
            Input::Select(label) => {
                let option = resolve_option(&active, &label);
                service
                    .apply(&mut active, SessionCommand::SelectOption(option))
                    .await
            }
            Input::Session(command) => service.apply(&mut active, command).await,
        };

        if let Err(err) = result {
            eprintln!("{err}");
        }
        println!("{}", render(&AttemptSnapshot::of(&active)));
    }

    Ok(())
}

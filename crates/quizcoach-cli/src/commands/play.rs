//! The `quizcoach play` command: an interactive session in the terminal.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use quizcoach_core::courses::find_course;
use quizcoach_core::error::GenerationFailure;
use quizcoach_core::gateway::LlmGateway;
use quizcoach_core::ingest::ingest_files;
use quizcoach_core::model::Difficulty;
use quizcoach_core::scoring::ScoreBand;
use quizcoach_core::session::{
    Advance, Cue, Intake, QuizProgress, SessionController, SessionObserver, SessionResults,
    SessionState, Stage,
};
use quizcoach_providers::config::load_config_from;
use quizcoach_providers::create_provider;

const OPTION_LETTERS: [char; 4] = ['a', 'b', 'c', 'd'];

pub struct PlayArgs {
    pub name: String,
    pub difficulty: Difficulty,
    pub files: Vec<PathBuf>,
    pub course: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub config: Option<PathBuf>,
    pub mute: bool,
}

/// Prints session activity to the terminal.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_stage_changed(&self, _from: Stage, to: Stage) {
        match to {
            Stage::GeneratingQuiz => println!("\nWriting your quiz, hang tight..."),
            Stage::AnalyzingResults => println!("\nThe coach is reviewing your answers..."),
            _ => {}
        }
    }

    fn on_tick(&self, _question_id: u32, remaining: u32) {
        if remaining == 10 || remaining == 5 {
            println!("  {remaining}s left");
        }
    }

    fn on_question_timed_out(&self, _question_id: u32) {
        println!("  Time's up! Press Enter for the next question.");
    }

    fn on_generation_failed(&self, error: &GenerationFailure) {
        println!("\nCould not generate the quiz: {error}");
    }

    fn on_cue(&self, cue: Cue) {
        match cue {
            Cue::Intro => println!("\u{266a} Let's play!"),
            Cue::Win => {
                // Terminal bell
                print!("\x07");
                let _ = std::io::stdout().flush();
            }
            Cue::Click => {}
        }
    }
}

/// One line of learner input during the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Answer(usize),
    Next,
    Quit,
    ToggleMute,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let input = line.trim().to_ascii_lowercase();
    match input.as_str() {
        "" | "n" | "next" => Command::Next,
        "q" | "quit" => Command::Quit,
        "m" | "mute" => Command::ToggleMute,
        "a" | "1" => Command::Answer(0),
        "b" | "2" => Command::Answer(1),
        "c" | "3" => Command::Answer(2),
        "d" | "4" => Command::Answer(3),
        _ => Command::Unknown(input),
    }
}

enum Input {
    Event(Option<quizcoach_core::session::SessionEvent>),
    Line(Option<String>),
}

enum QuizExit {
    Completed,
    Aborted,
    InputClosed,
}

pub async fn execute(args: PlayArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let provider_name = args
        .provider
        .clone()
        .unwrap_or_else(|| config.default_provider.clone());
    let provider = create_provider(&config.provider_config(&provider_name)?)
        .with_context(|| format!("failed to set up provider '{provider_name}'"))?;

    let content = load_content(&args.files, args.course.as_deref()).await?;

    let settings = config.gateway_settings(args.model.as_deref());
    tracing::info!(provider = %provider_name, model = %settings.model, "starting session");
    let gateway = Arc::new(LlmGateway::new(provider, settings));

    let mut session_settings = config.session_settings();
    session_settings.muted |= args.mute;

    let mut controller = SessionController::new(gateway.clone(), gateway)
        .with_observer(Arc::new(ConsoleObserver))
        .with_settings(session_settings);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        controller.start(Intake {
            name: args.name.clone(),
            difficulty: args.difficulty,
            content: content.clone(),
        })?;
        controller.await_gateway().await;

        if controller.stage() == Stage::Onboarding {
            if ask(&mut lines, "Try again? [y/N] ").await? {
                continue;
            }
            anyhow::bail!("no quiz could be generated");
        }

        match run_quiz(&mut controller, &mut lines).await? {
            QuizExit::Completed => {
                controller.await_gateway().await;
                if let SessionState::Results(results) = controller.state() {
                    print_results(results);
                }
            }
            QuizExit::Aborted => println!("\nQuiz abandoned."),
            QuizExit::InputClosed => return Ok(()),
        }

        if !ask(&mut lines, "\nPlay again? [y/N] ").await? {
            break;
        }
        controller.restart();
    }

    Ok(())
}

/// Corpus from a built-in course or from study files.
async fn load_content(files: &[PathBuf], course: Option<&str>) -> Result<String> {
    match course {
        Some(course) => {
            let course = find_course(course)?;
            println!("Course: {}", course.title);
            Ok(course.corpus())
        }
        None => {
            let corpus = ingest_files(files).await?;
            println!(
                "Loaded {} file(s), {} characters of study material.",
                files.len(),
                corpus.chars().count()
            );
            Ok(corpus)
        }
    }
}

async fn run_quiz<R>(controller: &mut SessionController, lines: &mut Lines<R>) -> Result<QuizExit>
where
    R: AsyncBufRead + Unpin,
{
    println!("Answer with a-d, Enter for the next question, q to quit, m to toggle sound.");
    let mut shown = None;

    loop {
        let SessionState::Quiz(progress) = controller.state() else {
            return Ok(QuizExit::Completed);
        };
        if shown != Some(progress.current_index()) {
            print_question(progress);
            shown = Some(progress.current_index());
        }

        let input = tokio::select! {
            event = controller.next_event() => Input::Event(event),
            line = lines.next_line() => Input::Line(line?),
        };

        let line = match input {
            Input::Event(Some(event)) => {
                controller.handle_event(event);
                continue;
            }
            Input::Event(None) => anyhow::bail!("session event channel closed"),
            Input::Line(None) => {
                controller.abort()?;
                return Ok(QuizExit::InputClosed);
            }
            Input::Line(Some(line)) => line,
        };

        match parse_command(&line) {
            Command::Answer(option) => match controller.select_option(option) {
                Ok(true) => println!("  Correct!"),
                Ok(false) => {
                    if let SessionState::Quiz(progress) = controller.state() {
                        let question = progress.current_question();
                        println!(
                            "  Wrong. The answer was {}) {}",
                            OPTION_LETTERS[question.correct],
                            question.correct_option()
                        );
                    }
                }
                Err(e) => println!("  {e}"),
            },
            Command::Next => match controller.advance() {
                Ok(Advance::Completed) => return Ok(QuizExit::Completed),
                Ok(Advance::NextQuestion(_)) => {}
                Err(e) => println!("  {e}"),
            },
            Command::Quit => {
                controller.abort()?;
                return Ok(QuizExit::Aborted);
            }
            Command::ToggleMute => {
                let muted = controller.toggle_mute();
                println!("  Sound {}", if muted { "off" } else { "on" });
            }
            Command::Unknown(input) => {
                println!("  '{input}' is not a command. Use a-d, Enter, q or m.")
            }
        }
    }
}

fn print_question(progress: &QuizProgress) {
    let question = progress.current_question();
    println!(
        "\nQuestion {}/{} ({}s)",
        progress.current_index() + 1,
        progress.quiz().len(),
        progress.remaining_secs()
    );
    println!("{}", question.text);
    for (letter, option) in OPTION_LETTERS.iter().zip(&question.options) {
        println!("  {letter}) {option}");
    }
}

fn verdict(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Low => "Needs work",
        ScoreBand::Medium => "Getting there",
        ScoreBand::High => "Strong",
    }
}

fn print_results(results: &SessionResults) {
    let outcome = &results.outcome;

    let mut table = Table::new();
    table.set_header(vec!["Learner", "Level", "Score", "Percent", "Timed out", "Verdict"]);
    table.add_row(vec![
        Cell::new(results.profile.name()),
        Cell::new(results.profile.difficulty()),
        Cell::new(format!("{}/{}", outcome.score, outcome.total)),
        Cell::new(format!("{}%", outcome.percentage())),
        Cell::new(outcome.unanswered()),
        Cell::new(verdict(outcome.band())),
    ]);
    println!("\nThe verdict\n{table}");
    println!("\nCoach: \"{}\"", results.feedback.feedback);

    if !outcome.wrong_answers.is_empty() {
        let mut mistakes = Table::new();
        mistakes.set_header(vec!["#", "Question", "Your answer", "Right answer"]);
        for wrong in &outcome.wrong_answers {
            mistakes.add_row(vec![
                Cell::new(wrong.question.id),
                Cell::new(&wrong.question.text),
                Cell::new(wrong.selected_option().unwrap_or("(time's up)")),
                Cell::new(wrong.question.correct_option()),
            ]);
        }
        println!("\nMistakes\n{mistakes}");
    }

    if results.feedback.flashcards.is_empty() {
        if outcome.wrong_answers.is_empty() {
            println!("\nNo revision needed. You're a machine! (Or you cheated.)");
        }
        return;
    }
    println!("\nFlashcards ({})", results.feedback.flashcards.len());
    for (i, card) in results.feedback.flashcards.iter().enumerate() {
        println!("  [{}] {}\n      -> {}", i + 1, card.front, card.back);
    }
}

/// Ask a yes/no question; end of input counts as no.
async fn ask<R>(lines: &mut Lines<R>, prompt: &str) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    print!("{prompt}");
    std::io::stdout().flush()?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command("a"), Command::Answer(0));
        assert_eq!(parse_command(" D "), Command::Answer(3));
        assert_eq!(parse_command("2"), Command::Answer(1));
        assert_eq!(parse_command(""), Command::Next);
        assert_eq!(parse_command("n"), Command::Next);
        assert_eq!(parse_command("Q"), Command::Quit);
        assert_eq!(parse_command("m"), Command::ToggleMute);
        assert_eq!(parse_command("e"), Command::Unknown("e".into()));
    }

    #[tokio::test]
    async fn ask_accepts_yes_and_treats_eof_as_no() {
        let mut lines = BufReader::new(&b"Yes\nnope\n"[..]).lines();
        assert!(ask(&mut lines, "").await.unwrap());
        assert!(!ask(&mut lines, "").await.unwrap());
        assert!(!ask(&mut lines, "").await.unwrap());
    }

    #[tokio::test]
    async fn course_content_is_loaded_by_slug() {
        let content = load_content(&[], Some("remote-work-1")).await.unwrap();
        assert!(content.contains("INTRODUCTION AU TÉLÉTRAVAIL"));
        assert!(load_content(&[], Some("nope")).await.is_err());
        assert!(load_content(&[], None).await.is_err());
    }

    #[test]
    fn verdicts_cover_every_band() {
        assert_eq!(verdict(ScoreBand::Low), "Needs work");
        assert_eq!(verdict(ScoreBand::High), "Strong");
    }
}

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{QuizId, UserId};
use services::remote::{AttemptHistory, QuizCatalog, ScoreSubmitter};
use services::{
    ApiConfig, ConfigError, EngineConfig, HttpLearningApi, InMemoryQuizCatalog,
    InMemoryScoreboard, QuizSessionService,
};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod terminal;

/// User id for offline play against a local quiz file.
const OFFLINE_USER_ID: &str = "local";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuizId { raw: String },
    InvalidDbUrl { raw: String },
    MissingQuizSource,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingQuizSource => write!(
                f,
                "no quiz to play: pass --quiz-file, or --quiz-id with QUIZ_API_BASE_URL set"
            ),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play  [--db <sqlite_url>] [--quiz-file <path>] [--quiz-id <id>]");
    eprintln!("                            [--user-id <id>] [--namespace <name>]");
    eprintln!("  cargo run -p app -- reset --quiz-id <id> [--db <sqlite_url>] [--namespace <name>]");
    eprintln!();
    eprintln!("Defaults for play:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --quiz-id first quiz in --quiz-file");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_USER_ID, QUIZ_STORE_NAMESPACE,");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_API_TOKEN, QUIZ_API_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    db_url: String,
    quiz_file: Option<PathBuf>,
    quiz_id: Option<QuizId>,
    user_id: Option<String>,
    namespace: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or_else(|| normalize_sqlite_url("sqlite:quiz.sqlite3".into()), normalize_sqlite_url),
            user_id: std::env::var(services::config::USER_ID_VAR).ok(),
            namespace: std::env::var(services::config::NAMESPACE_VAR).ok(),
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--quiz-file" => {
                    parsed.quiz_file = Some(PathBuf::from(require_value(args, "--quiz-file")?));
                }
                "--quiz-id" => {
                    let value = require_value(args, "--quiz-id")?;
                    let id = value
                        .parse::<QuizId>()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: value.clone() })?;
                    parsed.quiz_id = Some(id);
                }
                "--user-id" => parsed.user_id = Some(require_value(args, "--user-id")?),
                "--namespace" => parsed.namespace = Some(require_value(args, "--namespace")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Remote collaborators wired either to the HTTP API or to local stand-ins.
struct Collaborators {
    catalog: Arc<dyn QuizCatalog>,
    history: Arc<dyn AttemptHistory>,
    submitter: Arc<dyn ScoreSubmitter>,
    online: bool,
}

fn collaborators(
    api: Option<ApiConfig>,
    local: Option<InMemoryQuizCatalog>,
) -> Result<Collaborators, ConfigError> {
    match (api, local) {
        (Some(config), local) => {
            let http = Arc::new(HttpLearningApi::new(config)?);
            let catalog: Arc<dyn QuizCatalog> = match local {
                Some(local) => Arc::new(local),
                None => http.clone(),
            };
            Ok(Collaborators {
                catalog,
                history: http.clone(),
                submitter: http,
                online: true,
            })
        }
        (None, local) => {
            let scoreboard = Arc::new(InMemoryScoreboard::new());
            Ok(Collaborators {
                catalog: Arc::new(local.unwrap_or_default()),
                history: scoreboard.clone(),
                submitter: scoreboard,
                online: false,
            })
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    tracing::debug!(db = %parsed.db_url, "attempt store ready");

    let local = parsed
        .quiz_file
        .as_deref()
        .map(InMemoryQuizCatalog::from_json_file)
        .transpose()?;
    let quiz_id = parsed
        .quiz_id
        .or_else(|| local.as_ref().and_then(|c| c.quiz_ids().first().copied()))
        .ok_or(ArgsError::MissingQuizSource)?;

    let api = ApiConfig::from_env()?;
    let remote = collaborators(api, local)?;

    let user_id = match parsed.user_id {
        Some(id) if !id.trim().is_empty() => UserId::new(id.trim()),
        _ if remote.online => {
            return Err(ConfigError::Missing {
                key: services::config::USER_ID_VAR,
            }
            .into());
        }
        _ => UserId::new(OFFLINE_USER_ID),
    };
    let config = EngineConfig::new(user_id).with_namespace(parsed.namespace);
    tracing::info!(quiz_id = %quiz_id, online = remote.online, "quiz engine configured");

    let service = QuizSessionService::new(
        remote.catalog,
        remote.history,
        remote.submitter,
        storage.attempts,
        config,
    );

    match cmd {
        Command::Play => terminal::play(&service, quiz_id).await,
        Command::Reset => {
            service.reset(quiz_id).await?;
            eprintln!("cleared stored attempt for quiz {quiz_id}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_owned());
        Args::parse(&mut iter)
    }

    #[test]
    fn parses_play_flags() {
        let args = parse(&[
            "--db",
            "sqlite::memory:",
            "--quiz-file",
            "quizzes.json",
            "--quiz-id",
            "7",
            "--user-id",
            "u-1",
            "--namespace",
            "tab-2",
        ])
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.quiz_file, Some(PathBuf::from("quizzes.json")));
        assert_eq!(args.quiz_id, Some(QuizId::new(7)));
        assert_eq!(args.user_id.as_deref(), Some("u-1"));
        assert_eq!(args.namespace.as_deref(), Some("tab-2"));
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(matches!(
            parse(&["--quiz-id", "seven"]),
            Err(ArgsError::InvalidQuizId { .. })
        ));
        assert!(matches!(
            parse(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(parse(&["--wat"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }
}

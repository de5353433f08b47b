#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod navigation;
pub mod scoring;
pub mod session;
pub mod time;

pub use error::Error;
pub use navigation::{CellStatus, GridCell, NavigationGrid};
pub use scoring::ScoreReport;
pub use session::{Effect, QuizSession, SessionCommand, TransitionError};
pub use time::Clock;

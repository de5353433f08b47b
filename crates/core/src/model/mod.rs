mod answer;
mod attempt;
mod ids;
mod question;
mod quiz;

pub use answer::{Answer, AnswerError};
pub use attempt::{AttemptState, AttemptView};
pub use ids::{OptionId, ParseIdError, QuestionId, QuizId, UserId};
pub use question::{AnswerOption, Question, QuestionDraft, QuestionError};
pub use quiz::{Quiz, QuizDraft, QuizError, QuizVariant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use quiz_core::model::{Quiz, QuizDraft, QuizId, UserId};

use super::{AttemptHistory, QuizCatalog, ScoreSubmission, ScoreSubmitter};
use crate::config::ApiConfig;
use crate::error::RemoteError;

/// reqwest client for the learning platform API.
#[derive(Clone)]
pub struct HttpLearningApi {
    client: Client,
    config: ApiConfig,
}

impl HttpLearningApi {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the TLS backend cannot be initialized.
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl QuizCatalog for HttpLearningApi {
    async fn fetch_quiz(&self, quiz_id: QuizId) -> Result<Quiz, RemoteError> {
        let url = self.endpoint(&format!("quizzes/{quiz_id}"));
        let response = self.authorized(self.client.get(url)).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(quiz_id));
        }
        if !status.is_success() {
            return Err(RemoteError::HttpStatus(status));
        }

        let body = response.bytes().await?;
        let draft: QuizDraft = serde_json::from_slice(&body)?;
        let quiz = draft.validate()?;
        if quiz.id() != quiz_id {
            return Err(RemoteError::QuizIdMismatch {
                requested: quiz_id,
                received: quiz.id(),
            });
        }
        Ok(quiz)
    }
}

#[async_trait]
impl ScoreSubmitter for HttpLearningApi {
    async fn submit_score(&self, submission: &ScoreSubmission) -> Result<(), RemoteError> {
        let url = self.endpoint("scores");
        let response = self
            .authorized(self.client.post(url))
            .json(submission)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::HttpStatus(response.status()));
        }

        let body: SubmitResponse = response.json().await?;
        if body.success {
            Ok(())
        } else {
            Err(RemoteError::Rejected)
        }
    }
}

#[async_trait]
impl AttemptHistory for HttpLearningApi {
    async fn is_first_attempt(
        &self,
        user_id: &UserId,
        quiz_id: QuizId,
    ) -> Result<bool, RemoteError> {
        let url = self.endpoint(&format!("quizzes/{quiz_id}/first-attempt"));
        let response = self
            .authorized(self.client.get(url))
            .query(&[("userId", user_id.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::HttpStatus(response.status()));
        }

        let body: FirstAttemptResponse = response.json().await?;
        Ok(body.first_attempt)
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirstAttemptResponse {
    first_attempt: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuizVariant;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> HttpLearningApi {
        HttpLearningApi::new(ApiConfig::new(server.uri()).with_token("test-token")).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_validates_quiz() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "id": 12,
            "title": "Module 3",
            "variant": "final",
            "questions": [
                {"id": 1, "text": "2 + 2?", "pointValue": 2, "options": [
                    {"id": "A", "text": "4", "isCorrect": true},
                    {"id": "B", "text": "5", "isCorrect": false}
                ]}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/quizzes/12"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let quiz = api(&server).fetch_quiz(QuizId::new(12)).await.unwrap();
        assert_eq!(quiz.title(), "Module 3");
        assert_eq!(quiz.variant(), QuizVariant::Final);
        assert_eq!(quiz.max_score(), 2);
    }

    #[tokio::test]
    async fn missing_quiz_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quizzes/99"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = api(&server).fetch_quiz(QuizId::new(99)).await.unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(id) if id == QuizId::new(99)));
    }

    #[tokio::test]
    async fn empty_quiz_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quizzes/5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": 5, "questions": []})),
            )
            .mount(&server)
            .await;

        let err = api(&server).fetch_quiz(QuizId::new(5)).await.unwrap_err();
        assert!(matches!(err, RemoteError::InvalidQuiz(_)));
    }

    #[tokio::test]
    async fn quiz_with_other_id_is_rejected() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "id": 8,
            "questions": [
                {"id": 1, "text": "2 + 2?", "options": [
                    {"id": "A", "text": "4", "isCorrect": true}
                ]}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/quizzes/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let err = api(&server).fetch_quiz(QuizId::new(7)).await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::QuizIdMismatch { requested, received }
                if requested == QuizId::new(7) && received == QuizId::new(8)
        ));
    }

    #[tokio::test]
    async fn submits_score_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scores"))
            .and(body_json(serde_json::json!({"userId": "u-7", "points": 3, "quizId": 12})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let submission = ScoreSubmission {
            user_id: UserId::new("u-7"),
            points: 3,
            quiz_id: QuizId::new(12),
        };
        api(&server).submit_score(&submission).await.unwrap();
    }

    #[tokio::test]
    async fn unsuccessful_submission_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scores"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})))
            .mount(&server)
            .await;

        let submission = ScoreSubmission {
            user_id: UserId::new("u-7"),
            points: 1,
            quiz_id: QuizId::new(1),
        };
        let err = api(&server).submit_score(&submission).await.unwrap_err();
        assert!(matches!(err, RemoteError::Rejected));
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scores"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let submission = ScoreSubmission {
            user_id: UserId::new("u-7"),
            points: 1,
            quiz_id: QuizId::new(1),
        };
        let err = api(&server).submit_score(&submission).await.unwrap_err();
        assert!(
            matches!(err, RemoteError::HttpStatus(status) if status == StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[tokio::test]
    async fn asks_for_first_attempt_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quizzes/12/first-attempt"))
            .and(query_param("userId", "u-7"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"firstAttempt": false})),
            )
            .mount(&server)
            .await;

        let first = api(&server)
            .is_first_attempt(&UserId::new("u-7"), QuizId::new(12))
            .await
            .unwrap();
        assert!(!first);
    }
}

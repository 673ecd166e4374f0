use async_trait::async_trait;

use crate::*;

/// Sends one request and hands back the raw response.
///
/// Implementations include cookies with every request; non-2xx answers are
/// responses, not errors.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    /// The first attempt failed and the retry after re-authenticating worked.
    AcceptedAfterRetry,
    Dropped,
}

impl Submission {
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedAfterRetry)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreClient<T> {
    transport: T,
}

impl<T: Transport> ScoreClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current user, refreshing the session once if it expired. Any failure
    /// means signed out.
    pub async fn authenticate(&self) -> Option<User> {
        let mut response = match self.transport.send(&ApiRequest::Me).await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("Could not reach the session endpoint: {}", err);
                return None;
            }
        };

        if response.is_unauthorized() {
            log::debug!("session expired, refreshing");
            match self.transport.send(&ApiRequest::Refresh).await {
                Ok(refresh) if refresh.is_success() => {}
                Ok(refresh) => {
                    log::debug!("refresh rejected with status {}", refresh.status);
                    return None;
                }
                Err(err) => {
                    log::warn!("Could not refresh the session: {}", err);
                    return None;
                }
            }
            response = match self.transport.send(&ApiRequest::Me).await {
                Ok(response) => response,
                Err(err) => {
                    log::warn!("Could not reach the session endpoint: {}", err);
                    return None;
                }
            };
        }

        match response.json::<User>() {
            Ok(user) => Some(user),
            Err(ApiError::Status(status)) => {
                log::debug!("not signed in (status {})", status);
                None
            }
            Err(err) => {
                log::warn!("Unexpected session response: {}", err);
                None
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        let response = self.transport.send(&ApiRequest::Logout).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status(response.status))
        }
    }

    async fn try_submit(&self, request: &ApiRequest) -> Result<()> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status(response.status))
        }
    }

    /// Submits a score, retrying once after re-authenticating.
    pub async fn submit_score(&self, submission: ScoreSubmission) -> Submission {
        let request = ApiRequest::SubmitScore(submission);
        let Err(err) = self.try_submit(&request).await else {
            log::debug!("submitted {} for {}", submission.score, submission.game);
            return Submission::Accepted;
        };

        log::warn!("Failed to submit score for {}: {}", submission.game, err);
        self.authenticate().await;
        match self.try_submit(&request).await {
            Ok(()) => Submission::AcceptedAfterRetry,
            Err(err) => {
                log::warn!("Dropping score for {}: {}", submission.game, err);
                Submission::Dropped
            }
        }
    }

    /// One leaderboard page, empty when anything goes wrong.
    pub async fn scores(&self, query: ScoreQuery) -> Vec<ScoreEntry> {
        let request = ApiRequest::ScoresByGame(query);
        match self.transport.send(&request).await.and_then(|response| response.json::<ScorePage>()) {
            Ok(page) => page.content,
            Err(err) => {
                log::warn!("Error fetching scores for {}: {}", query.game, err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Replays canned responses in order and records what was sent.
    #[derive(Default)]
    struct Scripted {
        replies: RefCell<VecDeque<Result<ApiResponse>>>,
        sent: RefCell<Vec<ApiRequest>>,
    }

    impl Scripted {
        fn new(replies: impl IntoIterator<Item = Result<ApiResponse>>) -> Self {
            Self {
                replies: RefCell::new(replies.into_iter().collect()),
                sent: RefCell::default(),
            }
        }

        fn sent(&self) -> Vec<ApiRequest> {
            self.sent.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl Transport for Scripted {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
            self.sent.borrow_mut().push(request.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Network("no more replies".to_string())))
        }
    }

    fn ok(body: &str) -> Result<ApiResponse> {
        Ok(ApiResponse::new(200, body))
    }

    fn status(status: u16) -> Result<ApiResponse> {
        Ok(ApiResponse::new(status, ""))
    }

    const ME: &str = r#"{"username":"dana"}"#;

    #[tokio::test]
    async fn authenticate_with_live_session() {
        let client = ScoreClient::new(Scripted::new([ok(ME)]));
        assert_eq!(client.authenticate().await.unwrap().username, "dana");
        assert_eq!(client.transport().sent(), vec![ApiRequest::Me]);
    }

    #[tokio::test]
    async fn authenticate_refreshes_expired_session() {
        let client = ScoreClient::new(Scripted::new([status(401), ok(""), ok(ME)]));
        assert_eq!(client.authenticate().await.unwrap().username, "dana");
        assert_eq!(
            client.transport().sent(),
            vec![ApiRequest::Me, ApiRequest::Refresh, ApiRequest::Me]
        );
    }

    #[tokio::test]
    async fn failed_refresh_signs_out() {
        let client = ScoreClient::new(Scripted::new([status(401), status(403)]));
        assert_eq!(client.authenticate().await, None);
        assert_eq!(client.transport().sent().len(), 2);
    }

    #[tokio::test]
    async fn other_failures_sign_out_without_refresh() {
        let client = ScoreClient::new(Scripted::new([status(500)]));
        assert_eq!(client.authenticate().await, None);
        assert_eq!(client.transport().sent(), vec![ApiRequest::Me]);

        let client = ScoreClient::new(Scripted::new([ok("garbage")]));
        assert_eq!(client.authenticate().await, None);
    }

    #[tokio::test]
    async fn submission_accepted_first_time() {
        let client = ScoreClient::new(Scripted::new([ok("")]));
        let submission = ScoreSubmission::new(GameId::Snake, 7);
        assert_eq!(client.submit_score(submission).await, Submission::Accepted);
        assert_eq!(
            client.transport().sent(),
            vec![ApiRequest::SubmitScore(submission)]
        );
    }

    #[tokio::test]
    async fn submission_retries_once_after_reauth() {
        let client = ScoreClient::new(Scripted::new([status(401), ok(ME), ok("")]));
        let submission = ScoreSubmission::new(GameId::Twenty48, 2048);
        let outcome = client.submit_score(submission).await;
        assert_eq!(outcome, Submission::AcceptedAfterRetry);
        assert!(outcome.is_accepted());
        assert_eq!(
            client.transport().sent(),
            vec![
                ApiRequest::SubmitScore(submission),
                ApiRequest::Me,
                ApiRequest::SubmitScore(submission),
            ]
        );
    }

    #[tokio::test]
    async fn submission_dropped_after_second_failure() {
        let client = ScoreClient::new(Scripted::new([
            Err(ApiError::Network("offline".to_string())),
            status(401),
            status(401),
            status(500),
        ]));
        let submission = ScoreSubmission::new(GameId::Sorting, 300);
        assert_eq!(client.submit_score(submission).await, Submission::Dropped);
        // submit, me, refresh, submit
        assert_eq!(client.transport().sent().len(), 4);
    }

    #[tokio::test]
    async fn scores_are_empty_on_failure() {
        let query = ScoreQuery::first_page(GameId::Pathfinding);
        let body = r#"{"content":[{"username":"eve","score":42,"timestamp":"2025-01-01T00:00:00Z"}]}"#;
        let client = ScoreClient::new(Scripted::new([ok(body), status(502), ok("{]")]));

        let scores = client.scores(query).await;
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 42);
        assert!(client.scores(query).await.is_empty());
        assert!(client.scores(query).await.is_empty());
    }

    #[tokio::test]
    async fn logout_reports_status() {
        let client = ScoreClient::new(Scripted::new([ok(""), status(500)]));
        assert_eq!(client.logout().await, Ok(()));
        assert_eq!(client.logout().await, Err(ApiError::Status(500)));
    }
}

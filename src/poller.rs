use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::api::ApiClient;
use crate::error::{PollError, PollResult};
use crate::homework;
use crate::notifier::Notifier;

/// What a single poll cycle ended with.
#[derive(Debug)]
pub enum CycleOutcome {
    /// A status change was found and handed to the notifier.
    Notified { message: String, delivered: bool },
    /// The API reported no changes in the window.
    NoUpdates,
    /// The cycle was aborted; the error has already been logged.
    Failed(PollError),
}

/// Fixed-period poll loop. Owns the time window and the notifier.
pub struct Poller {
    api: ApiClient,
    notifier: Notifier,
    period: Duration,
    window: i64,
}

impl Poller {
    pub fn new(api: ApiClient, notifier: Notifier, period: Duration) -> Self {
        let now = Utc::now().timestamp();
        let window = i64::try_from(period.as_secs())
            .ok()
            .and_then(|secs| now.checked_sub(secs))
            .map_or(0, |start| start.max(0));
        Self {
            api,
            notifier,
            period,
            window,
        }
    }

    pub fn window(&self) -> i64 {
        self.window
    }

    /// Run forever. Each cycle is followed by the same fixed sleep, whatever its outcome.
    pub async fn run(mut self) {
        info!(
            "Polling {} every {}s",
            self.api.endpoint(),
            self.period.as_secs()
        );

        loop {
            self.poll_once().await;
            tokio::time::sleep(self.period).await;
        }
    }

    /// One cycle plus the window advance. Never fails.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        let outcome = match self.cycle().await {
            Ok(Some((message, delivered))) => CycleOutcome::Notified { message, delivered },
            Ok(None) => {
                debug!("No homework status changes since {}", self.window);
                CycleOutcome::NoUpdates
            }
            Err(e) => {
                error!(missing_key = e.is_missing_key(), "Program failure: {}", e);
                CycleOutcome::Failed(e)
            }
        };

        self.window = Utc::now().timestamp();
        outcome
    }

    async fn cycle(&self) -> PollResult<Option<(String, bool)>> {
        if self.window < 0 {
            return Err(PollError::InvalidWindow(self.window));
        }

        let response = self.api.get_api_answer(self.window).await?;
        let homeworks = homework::check_response(&response)?;

        // At most one status change is reported per cycle.
        let Some(latest) = homework::latest(homeworks) else {
            return Ok(None);
        };

        let message = homework::parse_status(latest)?;
        let delivered = self.notifier.send_message(&message).await;
        Ok(Some((message, delivered)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homework::HomeworkStatus;
    use crate::notifier::tests::RecordingMessenger;
    use mockito::Matcher;
    use std::sync::Arc;

    const PERIOD: Duration = Duration::from_secs(600);

    fn poller_for(endpoint: String, messenger: Arc<RecordingMessenger>) -> Poller {
        Poller::new(
            ApiClient::new(endpoint, "token"),
            Notifier::new(messenger),
            PERIOD,
        )
    }

    async fn serve(server: &mut mockito::ServerGuard, body: &str, hits: usize) -> mockito::Mock {
        server
            .mock("GET", "/statuses/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_initial_window_is_one_period_back() {
        let before = Utc::now().timestamp();
        let poller = poller_for(
            "http://127.0.0.1:9/".to_string(),
            Arc::new(RecordingMessenger::default()),
        );
        let after = Utc::now().timestamp();

        assert!(poller.window() >= before - 600);
        assert!(poller.window() <= after - 600);
    }

    #[tokio::test]
    async fn test_oversized_period_clamps_initial_window() {
        let poller = Poller::new(
            ApiClient::new("http://127.0.0.1:9/", "token"),
            Notifier::new(Arc::new(RecordingMessenger::default())),
            Duration::MAX,
        );

        assert_eq!(poller.window(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_contained_and_window_advances() {
        let messenger = Arc::new(RecordingMessenger::default());
        let mut poller = poller_for("http://127.0.0.1:9/statuses/".to_string(), messenger.clone());
        let stale = poller.window();

        let outcome = poller.poll_once().await;

        assert!(matches!(
            outcome,
            CycleOutcome::Failed(PollError::Transport { .. })
        ));
        assert!(poller.window() > stale);
        assert!(messenger.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_homeworks_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = serve(&mut server, r#"{"homeworks": [], "current_date": 0}"#, 1).await;
        let messenger = Arc::new(RecordingMessenger::default());
        let mut poller = poller_for(format!("{}/statuses/", server.url()), messenger.clone());

        let outcome = poller.poll_once().await;

        mock.assert_async().await;
        assert!(matches!(outcome, CycleOutcome::NoUpdates));
        assert!(messenger.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_same_status_is_reported_every_cycle() {
        let mut server = mockito::Server::new_async().await;
        let mock = serve(
            &mut server,
            r#"{"homeworks": [{"homework_name": "hw1", "status": "rejected"}]}"#,
            2,
        )
        .await;
        let messenger = Arc::new(RecordingMessenger::default());
        let mut poller = poller_for(format!("{}/statuses/", server.url()), messenger.clone());

        poller.poll_once().await;
        poller.poll_once().await;

        mock.assert_async().await;
        let expected = format!(
            "Changed review status for \"hw1\". {}",
            HomeworkStatus::Rejected.verdict()
        );
        assert_eq!(*messenger.sent.lock().await, vec![expected.clone(), expected]);
    }

    #[tokio::test]
    async fn test_only_first_record_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = serve(
            &mut server,
            r#"{"homeworks": [
                {"homework_name": "newest", "status": "approved"},
                {"homework_name": "older", "status": "reviewing"}
            ]}"#,
            1,
        )
        .await;
        let messenger = Arc::new(RecordingMessenger::default());
        let mut poller = poller_for(format!("{}/statuses/", server.url()), messenger.clone());

        match poller.poll_once().await {
            CycleOutcome::Notified { message, delivered } => {
                assert!(delivered);
                assert!(message.contains("\"newest\""));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(messenger.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_record_without_name_fails_cycle() {
        let mut server = mockito::Server::new_async().await;
        let _mock = serve(&mut server, r#"{"homeworks": [{"status": "approved"}]}"#, 1).await;
        let messenger = Arc::new(RecordingMessenger::default());
        let mut poller = poller_for(format!("{}/statuses/", server.url()), messenger.clone());

        let outcome = poller.poll_once().await;

        assert!(matches!(
            outcome,
            CycleOutcome::Failed(PollError::MissingKey("homework_name"))
        ));
        assert!(messenger.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_envelope_fails_cycle() {
        let mut server = mockito::Server::new_async().await;
        let _mock = serve(&mut server, r#"{"homeworks": "none"}"#, 1).await;
        let messenger = Arc::new(RecordingMessenger::default());
        let mut poller = poller_for(format!("{}/statuses/", server.url()), messenger.clone());

        assert!(matches!(
            poller.poll_once().await,
            CycleOutcome::Failed(PollError::NotAList)
        ));
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_fail_cycle() {
        let mut server = mockito::Server::new_async().await;
        let _mock = serve(
            &mut server,
            r#"{"homeworks": [{"homework_name": "hw1", "status": "approved"}]}"#,
            1,
        )
        .await;
        let messenger = Arc::new(RecordingMessenger {
            fail: true,
            ..Default::default()
        });
        let mut poller = poller_for(format!("{}/statuses/", server.url()), messenger);

        assert!(matches!(
            poller.poll_once().await,
            CycleOutcome::Notified {
                delivered: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_corrupt_window_skips_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = serve(&mut server, r#"{"homeworks": []}"#, 0).await;
        let mut poller = poller_for(
            format!("{}/statuses/", server.url()),
            Arc::new(RecordingMessenger::default()),
        );
        poller.window = -1;

        assert!(matches!(
            poller.poll_once().await,
            CycleOutcome::Failed(PollError::InvalidWindow(-1))
        ));
        mock.assert_async().await;
        assert!(poller.window() > 0);
    }

    #[tokio::test]
    async fn test_loop_keeps_running_after_failures() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/statuses/")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect_at_least(2)
            .create_async()
            .await;
        let poller = Poller::new(
            ApiClient::new(format!("{}/statuses/", server.url()), "token"),
            Notifier::new(Arc::new(RecordingMessenger::default())),
            Duration::from_millis(20),
        );

        let finished = tokio::time::timeout(Duration::from_millis(500), poller.run()).await;

        assert!(finished.is_err(), "the loop must never return on its own");
        mock.assert_async().await;
    }
}

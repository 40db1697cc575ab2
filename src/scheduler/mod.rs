use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::chart_fetcher::ChartFetcher;
use crate::charts::{formatter, Dataset};
use crate::config::AppConfig;
use crate::discord::StatusSink;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Owns the dataset and drives the refresh and rotate timers.
pub struct Scheduler<S> {
    fetcher: ChartFetcher,
    sink: S,
    dataset: Dataset,
    state: SchedulerState,
    nickname_prefix: Option<String>,
    refresh_every: Duration,
    rotate_every: Duration,
}

pub fn spawn_scheduler<S>(config: &AppConfig, sink: S) -> Result<(), Error>
where
    S: StatusSink + 'static,
{
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let fetcher = ChartFetcher::steam(client, &config.steam_api_url, &config.steam_charts_url);

    info!(
        refresh_secs = config.refresh_every.as_secs(),
        rotate_secs = config.rotate_every.as_secs(),
        nickname = config.nickname_prefix().is_some(),
        "Spawning chart scheduler"
    );

    let scheduler = Scheduler::new(fetcher, sink, config.refresh_every, config.rotate_every)
        .with_nickname_prefix(config.nickname_prefix().map(str::to_string));

    tokio::spawn(scheduler.run());
    Ok(())
}

impl<S: StatusSink> Scheduler<S> {
    pub fn new(
        fetcher: ChartFetcher,
        sink: S,
        refresh_every: Duration,
        rotate_every: Duration,
    ) -> Self {
        Self {
            fetcher,
            sink,
            dataset: Dataset::loading(),
            state: SchedulerState::Idle,
            nickname_prefix: None,
            refresh_every,
            rotate_every,
        }
    }

    pub fn with_nickname_prefix(mut self, prefix: Option<String>) -> Self {
        self.nickname_prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[cfg(test)]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Refreshes once, then runs both timers until the task is dropped.
    /// Each timer's first tick is one full period after start, and every
    /// refresh restarts the rotate period.
    pub async fn run(mut self) {
        self.refresh().await;

        let mut refresh = interval_after(self.refresh_every);
        let mut rotate = interval_after(self.rotate_every);

        loop {
            tokio::select! {
                _ = refresh.tick() => {
                    self.refresh().await;
                    // the fresh #1 line stays up for a full rotate period
                    rotate.reset();
                }
                _ = rotate.tick() => self.rotate().await,
            }
        }
    }

    pub async fn refresh(&mut self) {
        let lines = self.fetcher.fetch_top_lines().await;
        self.dataset = Dataset::new(lines);
        debug!(entries = self.dataset.len(), "Chart dataset replaced");

        if self.state == SchedulerState::Idle {
            info!("First chart refresh complete");
            self.state = SchedulerState::Running;
        }

        if let Some(line) = self.dataset.current().map(str::to_string) {
            self.publish(&line).await;
        }
    }

    pub async fn rotate(&mut self) {
        let Some(line) = self.dataset.rotate().map(str::to_string) else {
            debug!("Nothing to rotate");
            return;
        };
        self.publish(&line).await;
    }

    async fn publish(&self, line: &str) {
        if let Err(e) = self.sink.set_status_line(line).await {
            warn!(error = ?e, line, "Could not set status line, ignoring");
        }

        if let Some(prefix) = &self.nickname_prefix {
            let name = formatter::nickname(prefix, line);
            if let Err(e) = self.sink.set_display_name(&name).await {
                warn!(error = ?e, name, "Could not set nickname, ignoring");
            }
        }
    }
}

fn interval_after(period: Duration) -> time::Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::api::chart_fetcher::testing::{records, StubSource};
    use crate::api::chart_fetcher::UNAVAILABLE_LINE;
    use crate::api::RankedRecord;
    use crate::charts::dataset::LOADING_LINE;

    #[derive(Clone, Default)]
    struct RecordingSink {
        lines: Arc<Mutex<Vec<String>>>,
        names: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl RecordingSink {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }

        fn names(&self) -> Vec<String> {
            self.names.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusSink for RecordingSink {
        async fn set_status_line(&self, line: &str) -> Result<(), Error> {
            self.lines.lock().unwrap().push(line.to_string());
            if self.fail {
                return Err("missing permission".into());
            }
            Ok(())
        }

        async fn set_display_name(&self, name: &str) -> Result<(), Error> {
            self.names.lock().unwrap().push(name.to_string());
            if self.fail {
                return Err("unknown guild".into());
            }
            Ok(())
        }
    }

    fn scheduler(fetcher: ChartFetcher, sink: RecordingSink) -> Scheduler<RecordingSink> {
        Scheduler::new(
            fetcher,
            sink,
            Duration::from_secs(300),
            Duration::from_secs(60),
        )
    }

    fn three_games() -> ChartFetcher {
        ChartFetcher::new(vec![Box::new(StubSource::returning(records(&[
            "A", "B", "C",
        ])))])
    }

    #[tokio::test]
    async fn refresh_replaces_dataset_and_publishes_first_line() {
        let sink = RecordingSink::default();
        let mut scheduler = scheduler(three_games(), sink.clone());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.dataset().current(), Some(LOADING_LINE));

        scheduler.refresh().await;

        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert_eq!(scheduler.dataset().len(), 3);
        assert_eq!(sink.lines(), vec!["#1 A — 1.0k"]);
        assert!(sink.names().is_empty());
    }

    #[tokio::test]
    async fn refresh_resets_cursor() {
        let sink = RecordingSink::default();
        let mut scheduler = scheduler(three_games(), sink.clone());
        scheduler.refresh().await;
        scheduler.rotate().await;
        scheduler.rotate().await;
        assert_eq!(scheduler.dataset().cursor(), Some(2));

        scheduler.refresh().await;

        assert_eq!(scheduler.dataset().cursor(), Some(0));
        assert_eq!(sink.lines().last().map(String::as_str), Some("#1 A — 1.0k"));
    }

    #[tokio::test]
    async fn rotate_wraps_and_publishes() {
        let sink = RecordingSink::default();
        let mut scheduler = scheduler(three_games(), sink.clone());
        scheduler.refresh().await;

        for _ in 0..3 {
            scheduler.rotate().await;
        }

        assert_eq!(scheduler.dataset().cursor(), Some(0));
        assert_eq!(
            sink.lines(),
            vec!["#1 A — 1.0k", "#2 B — 2.0k", "#3 C — 3.0k", "#1 A — 1.0k"]
        );
    }

    #[tokio::test]
    async fn rotate_on_empty_dataset_does_not_publish() {
        let sink = RecordingSink::default();
        let mut scheduler = scheduler(three_games(), sink.clone());
        scheduler.dataset = Dataset::new(Vec::new());

        scheduler.rotate().await;

        assert_eq!(scheduler.dataset().cursor(), None);
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn total_failure_keeps_showing_placeholder() {
        let sink = RecordingSink::default();
        let fetcher = ChartFetcher::new(vec![
            Box::new(StubSource::failing()),
            Box::new(StubSource::failing()),
        ]);
        let mut scheduler = scheduler(fetcher, sink.clone());

        scheduler.refresh().await;
        scheduler.rotate().await;
        scheduler.rotate().await;

        assert_eq!(sink.lines(), vec![UNAVAILABLE_LINE; 3]);
        assert_eq!(scheduler.dataset().cursor(), Some(0));
    }

    #[tokio::test]
    async fn fallback_result_is_displayed() {
        let sink = RecordingSink::default();
        let fetcher = ChartFetcher::new(vec![
            Box::new(StubSource::failing()),
            Box::new(StubSource::returning(vec![RankedRecord {
                rank: 1,
                name: "Game A".into(),
                count: 123_456,
            }])),
        ]);
        let mut scheduler = scheduler(fetcher, sink.clone());

        scheduler.refresh().await;

        assert_eq!(sink.lines(), vec!["#1 Game A — 123.5k"]);
    }

    #[tokio::test]
    async fn sink_failures_are_swallowed() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let mut scheduler = scheduler(three_games(), sink.clone())
            .with_nickname_prefix(Some("Now".to_string()));

        scheduler.refresh().await;
        scheduler.rotate().await;

        assert_eq!(sink.lines().len(), 2);
        assert_eq!(sink.names(), vec!["Now • #1 A — 1.0k", "Now • #2 B — 2.0k"]);
        assert_eq!(scheduler.dataset().cursor(), Some(1));
    }

    #[tokio::test]
    async fn empty_prefix_disables_nickname() {
        let sink = RecordingSink::default();
        let mut scheduler =
            scheduler(three_games(), sink.clone()).with_nickname_prefix(Some(String::new()));

        scheduler.refresh().await;

        assert!(sink.names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timers_refresh_and_rotate_independently() {
        let sink = RecordingSink::default();
        let source = StubSource::returning(records(&["A", "B", "C"]));
        let calls = source.calls.clone();
        let scheduler = Scheduler::new(
            ChartFetcher::new(vec![Box::new(source)]),
            sink.clone(),
            Duration::from_secs(290),
            Duration::from_secs(60),
        );

        let handle = tokio::spawn(scheduler.run());

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.lines(), vec!["#1 A — 1.0k"]);

        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(
            sink.lines(),
            vec!["#1 A — 1.0k", "#2 B — 2.0k", "#3 C — 3.0k"]
        );

        // rotations at 180s and 240s, then the refresh at 290s starts over
        time::sleep(Duration::from_secs(174)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            sink.lines()[3..],
            ["#1 A — 1.0k", "#2 B — 2.0k", "#1 A — 1.0k"]
        );

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_on_a_rotate_tick_keeps_first_line_for_a_full_period() {
        // 300s refresh and 60s rotate tick together; select order varies per run
        for _ in 0..20 {
            let sink = RecordingSink::default();
            let source = StubSource::returning(records(&["A", "B", "C"]));
            let calls = source.calls.clone();
            let scheduler = scheduler(ChartFetcher::new(vec![Box::new(source)]), sink.clone());

            let handle = tokio::spawn(scheduler.run());

            time::sleep(Duration::from_secs(301)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 2);
            assert_eq!(sink.lines().last().map(String::as_str), Some("#1 A — 1.0k"));

            time::sleep(Duration::from_secs(58)).await;
            assert_eq!(sink.lines().last().map(String::as_str), Some("#1 A — 1.0k"));

            time::sleep(Duration::from_secs(2)).await;
            assert_eq!(sink.lines().last().map(String::as_str), Some("#2 B — 2.0k"));

            handle.abort();
        }
    }
}

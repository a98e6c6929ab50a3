//! Periodic refresh jobs
//!
//! Each job fetches from one external source on a fixed interval and turns the
//! result into [`KioskCommand`]s. The first run happens immediately so the
//! kiosk fills in right after start.
//!
//! Failures never stop a loop. They are logged and the kiosk keeps what it
//! had, except for the weather and news panels which show their own failure
//! states.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use kiosk_core::WeatherStatus;

use super::KioskCommand;
use crate::clients::{ContentStore, HeadlineSource, WeatherSource};
use crate::services::SettingsService;

const MIN_JOB_INTERVAL: Duration = Duration::from_secs(1);

#[async_trait]
pub trait RefreshJob: Send + Sync {
    /// Job name for logs
    fn name(&self) -> &'static str;

    fn interval(&self) -> Duration;

    /// Fetch once and return what the runtime should apply
    async fn run(&self) -> Vec<KioskCommand>;
}

/// Run a job on its interval until shutdown or until the runtime goes away.
pub async fn run_job_loop(
    job: Arc<dyn RefreshJob>,
    commands: mpsc::Sender<KioskCommand>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let period = job.interval().max(MIN_JOB_INTERVAL);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(job_name = job.name(), interval_secs = period.as_secs(), "Starting job loop");

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {
                let started = Instant::now();
                let output = tokio::select! {
                    output = job.run() => output,
                    _ = shutdown.recv() => break,
                };

                for command in output {
                    if commands.send(command).await.is_err() {
                        debug!(job_name = job.name(), "Runtime gone, stopping job");
                        return;
                    }
                }
                debug!(
                    job_name = job.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Job run completed"
                );
            }
        }
    }

    info!(job_name = job.name(), "Job loop stopped");
}

/// Posts plus the rotation interval, which is re-read every cycle
pub struct PostsJob {
    store: Arc<dyn ContentStore>,
    settings: SettingsService,
    every: Duration,
}

impl PostsJob {
    pub fn new(store: Arc<dyn ContentStore>, settings: SettingsService, every: Duration) -> Self {
        Self {
            store,
            settings,
            every,
        }
    }
}

#[async_trait]
impl RefreshJob for PostsJob {
    fn name(&self) -> &'static str {
        "posts"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> Vec<KioskCommand> {
        let mut commands = Vec::with_capacity(2);

        match self.store.list_posts().await {
            Ok(posts) => commands.push(KioskCommand::PostsLoaded(posts)),
            Err(e) => warn!(error = %e, "Failed to refresh posts, keeping current list"),
        }

        // A failed read keeps whatever interval the kiosk already runs with
        if let Some(setting) = self.settings.load_rotation_interval().await {
            commands.push(KioskCommand::RotationIntervalLoaded(setting.interval()));
        }
        commands
    }
}

pub struct WeatherJob {
    source: Arc<dyn WeatherSource>,
    city: String,
    every: Duration,
}

impl WeatherJob {
    pub fn new(source: Arc<dyn WeatherSource>, city: impl Into<String>, every: Duration) -> Self {
        Self {
            source,
            city: city.into(),
            every,
        }
    }
}

#[async_trait]
impl RefreshJob for WeatherJob {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> Vec<KioskCommand> {
        let status = match self.source.fetch_weather(&self.city).await {
            Ok(report) => WeatherStatus::Ready {
                temp_celsius: report.temp_celsius,
                condition: report.condition,
            },
            Err(e) => {
                warn!(city = %self.city, error = %e, "Weather refresh failed");
                WeatherStatus::Unavailable
            }
        };
        vec![KioskCommand::WeatherLoaded(status)]
    }
}

pub struct NewsJob {
    source: Arc<dyn HeadlineSource>,
    feed_url: String,
    every: Duration,
}

impl NewsJob {
    pub fn new(source: Arc<dyn HeadlineSource>, feed_url: impl Into<String>, every: Duration) -> Self {
        Self {
            source,
            feed_url: feed_url.into(),
            every,
        }
    }
}

#[async_trait]
impl RefreshJob for NewsJob {
    fn name(&self) -> &'static str {
        "news"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> Vec<KioskCommand> {
        let result = self
            .source
            .fetch_headlines(&self.feed_url)
            .await
            .map_err(|e| e.to_string());
        vec![KioskCommand::HeadlinesLoaded(result)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{FeedError, MockContentStore, StoreError, WeatherReport};
    use crate::services::LocalSettingsCache;
    use tempfile::TempDir;

    struct StaticWeather(Option<WeatherReport>);

    #[async_trait]
    impl WeatherSource for StaticWeather {
        async fn fetch_weather(&self, _city: &str) -> Result<WeatherReport, FeedError> {
            self.0.clone().ok_or(FeedError::Status(401))
        }
    }

    #[tokio::test]
    async fn test_weather_job_maps_failure_to_unavailable() {
        let job = WeatherJob::new(Arc::new(StaticWeather(None)), "Alkmaar", Duration::from_secs(60));
        let commands = job.run().await;
        assert!(matches!(
            commands.as_slice(),
            [KioskCommand::WeatherLoaded(WeatherStatus::Unavailable)]
        ));

        let report = WeatherReport {
            temp_celsius: 14,
            condition: "broken clouds".to_string(),
        };
        let job = WeatherJob::new(
            Arc::new(StaticWeather(Some(report))),
            "Alkmaar",
            Duration::from_secs(60),
        );
        let commands = job.run().await;
        assert!(matches!(
            commands.as_slice(),
            [KioskCommand::WeatherLoaded(WeatherStatus::Ready { temp_celsius: 14, .. })]
        ));
    }

    fn posts_job(store: MockContentStore, dir: &TempDir) -> PostsJob {
        let store: Arc<dyn ContentStore> = Arc::new(store);
        let settings = SettingsService::new(
            store.clone(),
            LocalSettingsCache::new(dir.path().join("settings.json")),
            30_000,
        );
        PostsJob::new(store, settings, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_posts_failure_sends_no_post_list() {
        let dir = TempDir::new().unwrap();
        let mut store = MockContentStore::new();
        store
            .expect_list_posts()
            .returning(|| Err(StoreError::Network("timeout".to_string())));
        store
            .expect_get_setting()
            .returning(|_| Ok(Some("60000".to_string())));

        let commands = posts_job(store, &dir).run().await;
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            commands[0],
            KioskCommand::RotationIntervalLoaded(interval) if interval == Duration::from_secs(60)
        ));
    }

    #[tokio::test]
    async fn test_setting_read_failure_keeps_current_interval() {
        let dir = TempDir::new().unwrap();
        let mut store = MockContentStore::new();
        store.expect_list_posts().times(2).returning(|| Ok(Vec::new()));
        let mut reads = 0;
        store.expect_get_setting().times(2).returning(move |_| {
            reads += 1;
            if reads == 1 {
                Ok(Some("60000".to_string()))
            } else {
                Err(StoreError::Network("connection reset".to_string()))
            }
        });
        let job = posts_job(store, &dir);

        let first = job.run().await;
        assert!(matches!(
            first.as_slice(),
            [KioskCommand::PostsLoaded(_), KioskCommand::RotationIntervalLoaded(interval)]
                if *interval == Duration::from_secs(60)
        ));

        let second = job.run().await;
        assert!(matches!(second.as_slice(), [KioskCommand::PostsLoaded(_)]));
    }

    struct CountingJob(std::sync::atomic::AtomicU32);

    #[async_trait]
    impl RefreshJob for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn interval(&self) -> Duration {
            Duration::from_secs(10)
        }

        async fn run(&self) -> Vec<KioskCommand> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Vec::new()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_loop_runs_immediately_then_on_interval() {
        let job = Arc::new(CountingJob(Default::default()));
        let (tx, _rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(run_job_loop(job.clone(), tx, shutdown_rx));
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(job.0.load(std::sync::atomic::Ordering::SeqCst), 3);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}

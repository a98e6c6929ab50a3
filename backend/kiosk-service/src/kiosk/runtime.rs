use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use kiosk_core::rotation::COUNTDOWN_TICK;
use kiosk_core::{
    GateConfig, Headlines, KioskSnapshot, Post, PostView, RotationEngine, RotationEvent,
    TapGate, TapOutcome, TapPoint, TimerCommand, WeatherStatus, WeatherView,
};

use super::jobs::{run_job_loop, RefreshJob};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub title: String,
    pub city: String,
    pub interval: Duration,
    pub fade: Duration,
    pub gate: GateConfig,
    /// Show the built-in welcome post while the store has none
    pub welcome_post: bool,
}

/// Input to the kiosk runtime
#[derive(Debug)]
pub enum KioskCommand {
    PostsLoaded(Vec<Post>),
    RotationIntervalLoaded(Duration),
    WeatherLoaded(WeatherStatus),
    /// `Err` carries the failure reason
    HeadlinesLoaded(Result<Vec<String>, String>),
    Tap {
        point: TapPoint,
        reply: oneshot::Sender<KioskSnapshot>,
    },
    Pause {
        reply: oneshot::Sender<KioskSnapshot>,
    },
    Resume {
        reply: oneshot::Sender<KioskSnapshot>,
    },
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("Kiosk runtime is not running")]
pub struct RuntimeStopped;

/// Cheap handle used by the API to talk to the runtime
#[derive(Clone)]
pub struct KioskHandle {
    commands: mpsc::Sender<KioskCommand>,
    snapshot: watch::Receiver<KioskSnapshot>,
}

impl KioskHandle {
    pub fn snapshot(&self) -> KioskSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<KioskSnapshot> {
        self.snapshot.clone()
    }

    pub async fn send(&self, command: KioskCommand) -> Result<(), RuntimeStopped> {
        self.commands.send(command).await.map_err(|_| RuntimeStopped)
    }

    pub async fn tap(&self, point: TapPoint) -> Result<KioskSnapshot, RuntimeStopped> {
        self.request(|reply| KioskCommand::Tap { point, reply }).await
    }

    pub async fn pause(&self) -> Result<KioskSnapshot, RuntimeStopped> {
        self.request(|reply| KioskCommand::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<KioskSnapshot, RuntimeStopped> {
        self.request(|reply| KioskCommand::Resume { reply }).await
    }

    pub async fn set_rotation_interval(&self, interval: Duration) -> Result<(), RuntimeStopped> {
        self.send(KioskCommand::RotationIntervalLoaded(interval)).await
    }

    async fn request(
        &self,
        build: impl FnOnce(oneshot::Sender<KioskSnapshot>) -> KioskCommand,
    ) -> Result<KioskSnapshot, RuntimeStopped> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| RuntimeStopped)
    }
}

/// Running kiosk tasks. Dropping this also stops them, without waiting.
pub struct KioskTasks {
    shutdown: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl KioskTasks {
    /// Stop every timer and job and wait for the tasks to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Kiosk task ended abnormally");
            }
        }
        info!("Kiosk runtime stopped");
    }
}

/// Owns the display state. Timers are plain deadlines polled in one
/// `select!` loop, so nothing fires after the runtime has stopped.
pub struct KioskRuntime {
    options: RuntimeOptions,
    engine: RotationEngine,
    gate: TapGate,
    posts: Vec<Post>,
    weather: WeatherStatus,
    headlines: Headlines,
    countdown_at: Option<Instant>,
    rotation_at: Option<Instant>,
    rotation_period: Duration,
    fade_at: Option<Instant>,
    hide_at: Option<Instant>,
    snapshot_tx: watch::Sender<KioskSnapshot>,
}

impl KioskRuntime {
    /// Start the runtime task and one task per refresh job.
    pub fn start(options: RuntimeOptions, jobs: Vec<Arc<dyn RefreshJob>>) -> (KioskHandle, KioskTasks) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (shutdown_tx, _) = broadcast::channel(1);

        let (snapshot_tx, snapshot_rx) = watch::channel(placeholder_snapshot());

        let mut runtime = Self::new(options, snapshot_tx);
        let initial = runtime.engine.start(runtime.posts.len(), runtime.options.interval);
        runtime.execute(initial);
        runtime.publish();

        let mut handles = Vec::with_capacity(jobs.len() + 1);
        handles.push(tokio::spawn(runtime.run(command_rx, shutdown_tx.subscribe())));
        for job in jobs {
            handles.push(tokio::spawn(run_job_loop(
                job,
                command_tx.clone(),
                shutdown_tx.subscribe(),
            )));
        }

        let handle = KioskHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
        };
        let tasks = KioskTasks {
            shutdown: shutdown_tx,
            handles,
        };
        (handle, tasks)
    }

    fn new(options: RuntimeOptions, snapshot_tx: watch::Sender<KioskSnapshot>) -> Self {
        let posts = if options.welcome_post {
            vec![Post::welcome()]
        } else {
            Vec::new()
        };
        let engine = RotationEngine::new(options.interval).with_fade(options.fade);
        let gate = TapGate::new(options.gate);
        let rotation_period = engine.interval();

        Self {
            options,
            engine,
            gate,
            posts,
            weather: WeatherStatus::default(),
            headlines: Headlines::default(),
            countdown_at: None,
            rotation_at: None,
            rotation_period,
            fade_at: None,
            hide_at: None,
            snapshot_tx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<KioskCommand>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!(
            interval_secs = self.engine.interval().as_secs(),
            posts = self.posts.len(),
            "Kiosk runtime started"
        );
        self.publish();

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = sleep_until_opt(self.countdown_at) => {
                    self.countdown_at = self.countdown_at.map(|at| at + COUNTDOWN_TICK);
                    self.apply(RotationEvent::Tick);
                }
                _ = sleep_until_opt(self.rotation_at) => {
                    self.rotation_at = self.rotation_at.map(|at| at + self.rotation_period);
                    self.apply(RotationEvent::RotateDue);
                }
                _ = sleep_until_opt(self.fade_at) => {
                    self.fade_at = None;
                    self.apply(RotationEvent::FadeElapsed);
                }
                _ = sleep_until_opt(self.hide_at) => {
                    self.hide_at = None;
                    if self.gate.expire(Instant::now().into_std()) {
                        debug!("Admin control hidden");
                    }
                }
            }
            self.publish();
        }

        self.countdown_at = None;
        self.rotation_at = None;
        self.fade_at = None;
        self.hide_at = None;
    }

    fn handle_command(&mut self, command: KioskCommand) {
        match command {
            KioskCommand::PostsLoaded(posts) => self.load_posts(posts),
            KioskCommand::RotationIntervalLoaded(interval) => {
                let commands = self.engine.reconfigure(interval);
                if !commands.is_empty() {
                    info!(interval_secs = interval.as_secs(), "Rotation interval changed");
                }
                self.execute(commands);
            }
            KioskCommand::WeatherLoaded(status) => self.weather = status,
            KioskCommand::HeadlinesLoaded(result) => {
                if let Err(reason) = &result {
                    warn!(error = %reason, "Headline refresh failed");
                }
                self.headlines.update(result);
            }
            KioskCommand::Tap { point, reply } => {
                let outcome = self.gate.tap(point, Instant::now().into_std());
                if let TapOutcome::Revealed { .. } = outcome {
                    info!("Admin control revealed");
                }
                self.hide_at = self.gate.hide_deadline().map(Instant::from_std);
                let _ = reply.send(self.snapshot());
            }
            KioskCommand::Pause { reply } => {
                self.apply(RotationEvent::Pause);
                let _ = reply.send(self.snapshot());
            }
            KioskCommand::Resume { reply } => {
                self.apply(RotationEvent::Resume);
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn load_posts(&mut self, posts: Vec<Post>) {
        self.posts = if posts.is_empty() && self.options.welcome_post {
            vec![Post::welcome()]
        } else {
            posts
        };
        debug!(count = self.posts.len(), "Posts loaded");
        let commands = self.engine.posts_changed(self.posts.len());
        self.execute(commands);
    }

    fn apply(&mut self, event: RotationEvent) {
        let commands = self.engine.handle(event);
        self.execute(commands);
    }

    fn execute(&mut self, commands: Vec<TimerCommand>) {
        let now = Instant::now();
        for command in commands {
            match command {
                TimerCommand::StartCountdown => self.countdown_at = Some(now + COUNTDOWN_TICK),
                TimerCommand::StopCountdown => self.countdown_at = None,
                TimerCommand::StartRotation { first, period } => {
                    self.rotation_at = Some(now + first);
                    self.rotation_period = period;
                }
                TimerCommand::StopRotation => self.rotation_at = None,
                TimerCommand::StartFade(delay) => self.fade_at = Some(now + delay),
                TimerCommand::CancelFade => self.fade_at = None,
            }
        }
    }

    fn snapshot(&self) -> KioskSnapshot {
        let state = self.engine.state();
        let post = self
            .engine
            .current_index()
            .and_then(|index| self.posts.get(index))
            .map(PostView::from_post)
            .unwrap_or_else(PostView::no_content);

        KioskSnapshot {
            header: self.options.title.clone(),
            post,
            post_visible: state.visible,
            post_index: state.index,
            post_count: self.posts.len(),
            remaining_seconds: state.remaining_seconds,
            paused: state.paused,
            rotation_interval_ms: state.interval_ms,
            weather: WeatherView::render(&self.weather, &self.options.city),
            headlines: self.headlines.as_slice().to_vec(),
            admin_control_visible: self.gate.is_revealed(Instant::now().into_std()),
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

fn placeholder_snapshot() -> KioskSnapshot {
    KioskSnapshot {
        header: String::new(),
        post: PostView::no_content(),
        post_visible: true,
        post_index: 0,
        post_count: 0,
        remaining_seconds: 0,
        paused: false,
        rotation_interval_ms: 0,
        weather: WeatherView::render(&WeatherStatus::Loading, ""),
        headlines: Vec::new(),
        admin_control_visible: false,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

//! Kiosk display runtime
//!
//! - **runtime**: the task that owns the rotation engine and tap gate, runs
//!   their timers and publishes snapshots
//! - **jobs**: periodic fetchers feeding posts, settings, weather and news in

pub mod jobs;
mod runtime;

pub use jobs::{run_job_loop, NewsJob, PostsJob, RefreshJob, WeatherJob};
pub use runtime::{KioskCommand, KioskHandle, KioskRuntime, KioskTasks, RuntimeOptions, RuntimeStopped};

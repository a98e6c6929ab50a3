//! Kiosk core
//!
//! I/O-free building blocks of the signage kiosk:
//! - **models**: posts, media variants, rotation setting, feed readings
//! - **rotation**: the post rotation state machine and the timer commands it emits
//! - **tap_gate**: the hidden five-tap admin access gesture
//! - **view**: composition of the kiosk snapshot served to displays
//!
//! Nothing in this crate owns a timer or a socket. Callers feed events in and
//! execute the returned commands with whatever scheduler they use.

pub mod models;
pub mod rotation;
pub mod tap_gate;
pub mod view;

pub use models::{
    Headlines, Media, MediaKind, Post, PostDraft, PostPatch, Role, RotationSetting,
    SessionUser, SettingError, WeatherStatus,
};
pub use rotation::{RotationEngine, RotationEvent, RotationState, TimerCommand};
pub use tap_gate::{GateConfig, TapGate, TapOutcome, TapPoint};
pub use view::{KioskSnapshot, MediaView, PostView, WeatherView};

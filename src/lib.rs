pub mod channel;
pub mod chase;
pub mod classifier;
pub mod color;
pub mod config;
pub mod dispatch;
pub mod effect;
pub mod engine;
pub mod event;
pub mod group;
pub mod math8;
pub mod scheduler;
pub mod shared;
pub mod telemetry;

pub use chase::{ChaseCoordinator, ChasePhase, ChaseRing, ChaseTuning, RingMember, Role};
pub use classifier::{ClassifierConfig, ClassifyError, StateClassifier, classify};
pub use config::{Config, ConfigError, parse_effect_spec};
pub use dispatch::{
    ChannelAdapter, ChannelBatch, ChannelHealth, DispatchError, Dispatcher, GcodeQueue,
    GroupUpdate,
};
pub use effect::{EffectError, EffectId, EffectSlot, EffectSpec, EffectState, Frame, RenderContext};
pub use engine::{AdapterFactory, EngineHandle, LightEngine, StandardAdapters, StatusReport};
pub use event::OperatingEvent;
pub use group::{ChannelKey, Direction, GroupConfig, GroupRuntime};
pub use scheduler::{Cycle, RenderScheduler, SchedulerConfig};
pub use telemetry::{HeaterKind, HeaterReading, JobState, TelemetrySnapshot};

pub use color::{Hsv, Rgb};
pub use embassy_time::{Duration, Instant};

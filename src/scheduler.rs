//! Adaptive render scheduling
//!
//! Each group keeps its own due time, derived from its channel class and the
//! complexity of its active effect. One [`RenderScheduler::cycle`] renders
//! every due group, applies the brightness pass, stages the frames per
//! physical channel and returns how long the caller may sleep before the
//! next group falls due.
//!
//! The scheduler does no I/O and never sleeps itself.

use std::collections::BTreeMap;

use embassy_time::{Duration, Instant};
use heapless::Deque;
use log::{debug, warn};
use serde::Serialize;

use crate::{
    chase::{ChaseCoordinator, ChasePhase, ChaseRing, RingMember, Role},
    color::{Rgb, dim},
    config::RingConfig,
    dispatch::{ChannelBatch, GroupUpdate},
    effect::{BedExtent, ChaseView, EffectComplexity, EffectId, RenderContext},
    event::OperatingEvent,
    group::{ChannelClass, ChannelKey, GroupConfig, GroupRuntime},
    telemetry::TelemetrySnapshot,
};

/// Frame rate samples kept by [`FrameRateMeter`]
const FPS_WINDOW: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Interval for animated effects on the hardware sidecar
    pub direct_interval: Duration,
    /// Interval for firmware-queued and brightness-pin channels
    pub firmware_interval: Duration,
    /// Same, while a print is running
    pub firmware_interval_printing: Duration,
    pub static_refresh: Duration,
    /// Lower bound for telemetry-driven effects
    pub reactive_interval: Duration,
    pub min_sleep: Duration,
    pub max_sleep: Duration,
    /// Global cap multiplied into every pixel after the effect
    pub max_brightness: f32,
    pub temp_floor: f32,
    pub bed: BedExtent,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            direct_interval: Duration::from_micros(16_667),
            firmware_interval: Duration::from_millis(100),
            firmware_interval_printing: Duration::from_secs(1),
            static_refresh: Duration::from_secs(5),
            reactive_interval: Duration::from_millis(250),
            min_sleep: Duration::from_millis(5),
            max_sleep: Duration::from_millis(250),
            max_brightness: 0.4,
            temp_floor: crate::classifier::DEFAULT_TEMP_FLOOR,
            bed: BedExtent::default(),
        }
    }
}

impl SchedulerConfig {
    /// Render interval for an effect on a channel class
    pub fn interval(
        &self,
        class: ChannelClass,
        complexity: EffectComplexity,
        printing: bool,
    ) -> Duration {
        let channel = match class {
            ChannelClass::Direct => self.direct_interval,
            ChannelClass::Firmware | ChannelClass::Binary => {
                if printing {
                    self.firmware_interval_printing
                } else {
                    self.firmware_interval
                }
            }
        };
        match complexity {
            EffectComplexity::Static => self.static_refresh.max(channel),
            EffectComplexity::Reactive => self.reactive_interval.max(channel),
            EffectComplexity::Animated | EffectComplexity::Off => channel,
        }
    }
}

/// Achieved frame rate over a fixed window of cycle timestamps
#[derive(Debug, Clone, Default)]
pub struct FrameRateMeter {
    samples: Deque<Instant, FPS_WINDOW>,
}

impl FrameRateMeter {
    pub fn record(&mut self, now: Instant) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        let _ = self.samples.push_back(now);
    }

    /// Frames per second across the window, `0.0` with fewer than two samples
    pub fn fps(&self) -> f32 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let span = last.saturating_duration_since(*first).as_micros();
        if self.samples.len() < 2 || span == 0 {
            return 0.0;
        }
        (self.samples.len() - 1) as f32 * 1_000_000.0 / span as f32
    }
}

/// Output of one scheduling cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub batches: Vec<ChannelBatch>,
    /// Time until the next group is due, already clamped
    pub sleep: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStatus {
    pub name: String,
    pub channel: String,
    pub event: Option<OperatingEvent>,
    pub effect: Option<&'static str>,
    pub parked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChaseStatus {
    pub ring: String,
    pub phase: ChasePhase,
    pub predator_position: f32,
    pub prey_position: f32,
    /// Role whose head sits in each member, in ring order
    pub roles: Vec<(String, Option<Role>)>,
}

struct RingSlot {
    config: RingConfig,
    /// Group index of every member, in ring order
    members: Vec<usize>,
    chasing: Vec<bool>,
    coordinator: Option<ChaseCoordinator>,
}

impl RingSlot {
    fn build_ring(&self, groups: &[GroupConfig]) -> ChaseRing {
        ChaseRing::new(
            self.members
                .iter()
                .map(|&index| {
                    let group = &groups[index];
                    RingMember::new(group.name.clone(), group.pixel_count(), group.direction)
                })
                .collect(),
        )
    }
}

pub struct RenderScheduler {
    config: SchedulerConfig,
    groups: Vec<GroupConfig>,
    runtimes: Vec<GroupRuntime>,
    rings: Vec<RingSlot>,
    /// `(ring, member)` for each group that belongs to a ring
    membership: Vec<Option<(usize, usize)>>,
    meter: FrameRateMeter,
}

impl RenderScheduler {
    pub fn new(config: SchedulerConfig, groups: Vec<GroupConfig>, rings: Vec<RingConfig>) -> Self {
        let runtimes = groups
            .iter()
            .map(|group| GroupRuntime::new(group.pixel_count()))
            .collect();
        let mut membership = vec![None; groups.len()];
        let rings = rings
            .into_iter()
            .enumerate()
            .map(|(ring_index, config)| {
                let members: Vec<usize> = config
                    .members
                    .iter()
                    .filter_map(|name| groups.iter().position(|group| &group.name == name))
                    .collect();
                for (member, &group) in members.iter().enumerate() {
                    membership[group] = Some((ring_index, member));
                }
                RingSlot {
                    chasing: vec![false; members.len()],
                    config,
                    members,
                    coordinator: None,
                }
            })
            .collect();

        Self {
            config,
            groups,
            runtimes,
            rings,
            membership,
            meter: FrameRateMeter::default(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn groups(&self) -> &[GroupConfig] {
        &self.groups
    }

    pub fn runtime(&self, group: &str) -> Option<&GroupRuntime> {
        let index = self.groups.iter().position(|config| config.name == group)?;
        self.runtimes.get(index)
    }

    /// Coordinator of the named ring, once a member has started chasing
    pub fn coordinator(&self, ring: &str) -> Option<&ChaseCoordinator> {
        self.rings
            .iter()
            .find(|slot| slot.config.name == ring)
            .and_then(|slot| slot.coordinator.as_ref())
    }

    pub fn fps(&self) -> f32 {
        self.meter.fps()
    }

    pub fn status(&self) -> Vec<GroupStatus> {
        self.groups
            .iter()
            .zip(&self.runtimes)
            .map(|(group, runtime)| GroupStatus {
                name: group.name.clone(),
                channel: group.channel.to_string(),
                event: runtime.event(),
                effect: runtime.effect().map(EffectId::as_str),
                parked: runtime.is_parked(),
            })
            .collect()
    }

    /// Active chase rings
    pub fn chase_status(&self) -> Vec<ChaseStatus> {
        self.rings
            .iter()
            .filter_map(|slot| {
                let coordinator = slot.coordinator.as_ref()?;
                Some(ChaseStatus {
                    ring: slot.config.name.clone(),
                    phase: coordinator.phase(),
                    predator_position: coordinator.predator_position(),
                    prey_position: coordinator.prey_position(),
                    roles: coordinator
                        .ring()
                        .members()
                        .iter()
                        .zip(coordinator.roles())
                        .map(|(member, role)| (member.group.clone(), *role))
                        .collect(),
                })
            })
            .collect()
    }

    /// Bring every group's cached effect in line with `event`.
    ///
    /// Groups without an effect for `event` keep whatever they show.
    fn sync_effects(&mut self, event: OperatingEvent, now: Instant) {
        for (group, runtime) in self.groups.iter().zip(&mut self.runtimes) {
            if let Some(spec) = group.effect_for(event) {
                if runtime.sync(event, spec, group.direction, now) {
                    debug!("[scheduler] {} now runs {}", group.name, spec.effect.as_str());
                }
            }
        }
    }

    /// Create, reset and advance chase coordinators.
    fn update_rings(&mut self, now: Instant) {
        for slot in &mut self.rings {
            let chasing: Vec<bool> = slot
                .members
                .iter()
                .map(|&group| self.runtimes[group].effect() == Some(EffectId::Chase))
                .collect();

            let left = slot
                .chasing
                .iter()
                .zip(&chasing)
                .any(|(&before, &after)| before && !after);
            if left && slot.coordinator.take().is_some() {
                debug!("[scheduler] chase ring {} reset", slot.config.name);
            }
            slot.chasing = chasing;

            if !slot.chasing.iter().any(|&chasing| chasing) {
                continue;
            }
            if slot.coordinator.is_none() {
                let ring = slot.build_ring(&self.groups);
                debug!(
                    "[scheduler] chase ring {} started, {} pixels",
                    slot.config.name,
                    ring.len()
                );
                slot.coordinator = Some(ChaseCoordinator::new(ring, slot.config.tuning, now));
            }
            if let Some(coordinator) = slot.coordinator.as_mut() {
                coordinator.advance(now);
            }
        }
    }

    /// Run one scheduling cycle.
    ///
    /// `channel_ready` reports whether dispatch would accept a send on a
    /// channel; groups on channels that are not ready stay due.
    pub fn cycle(
        &mut self,
        now: Instant,
        telemetry: &TelemetrySnapshot,
        event: OperatingEvent,
        channel_ready: &dyn Fn(&ChannelKey) -> bool,
    ) -> Cycle {
        self.sync_effects(event, now);
        self.update_rings(now);

        let printing = event == OperatingEvent::Printing;
        let blocked = telemetry.blocking_operation.is_some();
        let brightness = self.config.max_brightness;
        let mut staged: BTreeMap<ChannelKey, Vec<GroupUpdate>> = BTreeMap::new();
        let mut next_due: Option<Instant> = None;
        let mut rendered = false;

        for (index, (group, runtime)) in self.groups.iter().zip(&mut self.runtimes).enumerate() {
            let Some(effect) = runtime.effect() else {
                continue;
            };
            if runtime.is_parked() {
                continue;
            }
            let complexity = effect.complexity();
            let interval = self
                .config
                .interval(group.channel.class(), complexity, printing);

            let held = (group.channel.is_queued() && blocked) || !channel_ready(&group.channel);
            if held || !runtime.is_due(now, interval) {
                let due = if held {
                    now + interval
                } else {
                    runtime.next_due(now, interval)
                };
                next_due = Some(next_due.map_or(due, |current| current.min(due)));
                continue;
            }

            let chase = self.membership[index].and_then(|(ring, member)| {
                self.rings[ring]
                    .coordinator
                    .as_ref()
                    .map(|coordinator| ChaseView {
                        coordinator,
                        member,
                    })
            });
            let ctx = RenderContext {
                telemetry,
                temp_floor: self.config.temp_floor,
                bed: self.config.bed,
                chase,
            };

            let send = match runtime.render(now, &ctx) {
                Ok(changed) => changed || complexity == EffectComplexity::Static,
                Err(err) => {
                    warn!(
                        "[scheduler] {} effect {} failed ({}): {}",
                        group.name,
                        effect.as_str(),
                        err.as_label(),
                        err
                    );
                    runtime.fallback(now);
                    true
                }
            };
            rendered = true;

            if send {
                let scale = brightness * group.brightness;
                let colors: Vec<Option<Rgb>> = runtime
                    .frame()
                    .iter()
                    .map(|color| color.map(|color| dim(color, scale)))
                    .collect();
                let mut update = GroupUpdate::new(group.name.clone(), group.index_start, colors);
                update.scale = group.pwm_scale;
                staged.entry(group.channel.clone()).or_default().push(update);

                if effect == EffectId::Off {
                    runtime.mark_off_sent();
                }
            }

            if !runtime.is_parked() {
                let due = runtime.next_due(now, interval);
                next_due = Some(next_due.map_or(due, |current| current.min(due)));
            }
        }

        if rendered {
            self.meter.record(now);
        }

        let sleep = next_due
            .map_or(self.config.max_sleep, |due| due.saturating_duration_since(now))
            .max(self.config.min_sleep)
            .min(self.config.max_sleep);

        Cycle {
            batches: staged
                .into_iter()
                .map(|(channel, updates)| ChannelBatch { channel, updates })
                .collect(),
            sleep,
        }
    }

    /// Dark frame for every group, grouped per channel
    pub fn all_off(&self) -> Vec<ChannelBatch> {
        self.off_batches(|_| true)
    }

    /// Dark frame for the groups `select` picks, grouped per channel
    pub fn off_batches(&self, select: impl Fn(&GroupConfig) -> bool) -> Vec<ChannelBatch> {
        let mut staged: BTreeMap<ChannelKey, Vec<GroupUpdate>> = BTreeMap::new();
        for group in self.groups.iter().filter(|group| select(group)) {
            let mut update =
                GroupUpdate::new(group.name.clone(), group.index_start, vec![None; group.pixel_count()]);
            update.scale = group.pwm_scale;
            staged.entry(group.channel.clone()).or_default().push(update);
        }
        staged
            .into_iter()
            .map(|(channel, updates)| ChannelBatch { channel, updates })
            .collect()
    }
}

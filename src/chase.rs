//! Multi-group chase coordination
//!
//! A [`ChaseRing`] concatenates several groups' pixel ranges, in declared
//! order, into one circular index space. A [`ChaseCoordinator`] moves a
//! predator and a prey around that ring; every member group renders its own
//! window of the shared positions.

use embassy_time::{Duration, Instant};
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::{
    group::Direction,
    math8::{duration_from_secs_f32, secs_f32},
};

/// Longest simulated step; longer stalls do not teleport the runners
const MAX_STEP_SECS: f32 = 0.25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingMember {
    pub group: String,
    pub len: usize,
    pub direction: Direction,
}

impl RingMember {
    pub fn new(group: impl Into<String>, len: usize, direction: Direction) -> Self {
        Self {
            group: group.into(),
            len,
            direction,
        }
    }
}

/// Ordered concatenation of member groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaseRing {
    members: Vec<RingMember>,
    offsets: Vec<usize>,
    len: usize,
}

impl ChaseRing {
    pub fn new(members: Vec<RingMember>) -> Self {
        let mut offsets = Vec::with_capacity(members.len());
        let mut len = 0;
        for member in &members {
            offsets.push(len);
            len += member.len;
        }
        Self {
            members,
            offsets,
            len,
        }
    }

    /// Total ring length in pixels
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn members(&self) -> &[RingMember] {
        &self.members
    }

    pub fn member_index(&self, group: &str) -> Option<usize> {
        self.members.iter().position(|member| member.group == group)
    }

    /// Map an absolute ring position to `(member, local index)`.
    ///
    /// The position is taken modulo the ring length; reversed members count
    /// their local index from the far end.
    pub fn locate(&self, position: f32) -> Option<(usize, usize)> {
        if self.len == 0 || !position.is_finite() {
            return None;
        }
        let absolute = (libm::floorf(position) as i64).rem_euclid(self.len as i64) as usize;
        let member = self
            .offsets
            .iter()
            .rposition(|&offset| offset <= absolute)?;
        let info = &self.members[member];
        let offset = absolute - self.offsets[member];
        let local = match info.direction {
            Direction::Standard => offset,
            Direction::Reverse => info.len - 1 - offset,
        };
        Some((member, local))
    }

    /// Local pixel of `group` at an absolute ring position, if it falls there
    pub fn local_index(&self, position: f32, group: &str) -> Option<usize> {
        let (member, local) = self.locate(position)?;
        (self.members[member].group == group).then_some(local)
    }

    /// Absolute ring index of a member's local pixel
    pub fn absolute(&self, member: usize, local: usize) -> Option<usize> {
        let info = self.members.get(member)?;
        if local >= info.len {
            return None;
        }
        let offset = match info.direction {
            Direction::Standard => local,
            Direction::Reverse => info.len - 1 - local,
        };
        Some(self.offsets[member] + offset)
    }
}

/// Motion and timing parameters for one ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseTuning {
    /// Predator speed in pixels per second
    pub speed: f32,
    /// Prey speed relative to the predator
    pub prey_ratio: f32,
    /// Separation in pixels below which both runners speed up
    pub proximity: f32,
    pub acceleration: f32,
    pub collision_pause: Duration,
    /// Mean time between random role swaps
    pub swap_interval: Duration,
    /// Probability of a direction reversal per second
    pub reverse_chance: f32,
}

impl Default for ChaseTuning {
    fn default() -> Self {
        Self {
            speed: 8.0,
            prey_ratio: 0.85,
            proximity: 6.0,
            acceleration: 1.6,
            collision_pause: Duration::from_millis(600),
            swap_interval: Duration::from_secs(12),
            reverse_chance: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChasePhase {
    Cruising,
    Accelerating,
    Colliding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Predator,
    Prey,
}

/// One moving segment; runner 0 draws in the first chase color, runner 1 in
/// the second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Runner {
    pub position: f32,
    /// `1.0` forward, `-1.0` backward
    pub direction: f32,
}

impl Runner {
    fn step(&mut self, distance: f32, len: f32) {
        self.position = wrap(self.position + distance * self.direction, len);
    }
}

/// `rem_euclid` can round up to `len` for tiny negative inputs
fn wrap(position: f32, len: f32) -> f32 {
    let wrapped = position.rem_euclid(len);
    if wrapped >= len { 0.0 } else { wrapped }
}

#[derive(Debug, Clone)]
pub struct ChaseCoordinator {
    ring: ChaseRing,
    tuning: ChaseTuning,
    runners: [Runner; 2],
    /// Index into `runners` of the current predator
    predator: usize,
    phase: ChasePhase,
    collision_until: Option<Instant>,
    last_advance: Option<Instant>,
    last_swap: Instant,
    last_collision: Option<Instant>,
    next_swap: Instant,
    roles: Vec<Option<Role>>,
    rng: StdRng,
}

impl ChaseCoordinator {
    pub fn new(ring: ChaseRing, tuning: ChaseTuning, now: Instant) -> Self {
        Self::with_rng(ring, tuning, now, StdRng::from_rng(&mut rand::rng()))
    }

    /// Create with a fixed random source
    pub fn with_rng(ring: ChaseRing, tuning: ChaseTuning, now: Instant, rng: StdRng) -> Self {
        let half = ring.len() as f32 / 2.0;
        let roles = vec![None; ring.members().len()];
        let mut coordinator = Self {
            ring,
            tuning,
            runners: [
                Runner {
                    position: 0.0,
                    direction: 1.0,
                },
                Runner {
                    position: half,
                    direction: 1.0,
                },
            ],
            predator: 0,
            phase: ChasePhase::Cruising,
            collision_until: None,
            last_advance: None,
            last_swap: now,
            last_collision: None,
            next_swap: now,
            roles,
            rng,
        };
        coordinator.schedule_swap(now);
        coordinator.update_roles();
        coordinator
    }

    pub fn ring(&self) -> &ChaseRing {
        &self.ring
    }

    pub fn phase(&self) -> ChasePhase {
        self.phase
    }

    pub fn runners(&self) -> &[Runner; 2] {
        &self.runners
    }

    /// Index of the runner currently playing predator
    pub fn predator_runner(&self) -> usize {
        self.predator
    }

    pub fn predator_position(&self) -> f32 {
        self.runners[self.predator].position
    }

    pub fn prey_position(&self) -> f32 {
        self.runners[1 - self.predator].position
    }

    /// Role whose head currently sits in each member, in ring order
    pub fn roles(&self) -> &[Option<Role>] {
        &self.roles
    }

    pub fn last_swap(&self) -> Instant {
        self.last_swap
    }

    pub fn last_collision(&self) -> Option<Instant> {
        self.last_collision
    }

    /// Place both runners explicitly
    pub fn set_positions(&mut self, predator: f32, prey: f32) {
        let len = self.ring.len().max(1) as f32;
        self.runners[self.predator].position = wrap(predator, len);
        self.runners[1 - self.predator].position = wrap(prey, len);
        self.update_roles();
    }

    /// Distance from predator to prey along the predator's heading
    pub fn separation(&self) -> f32 {
        let len = self.ring.len() as f32;
        if len == 0.0 {
            return 0.0;
        }
        let predator = self.runners[self.predator];
        let prey = self.runners[1 - self.predator];
        ((prey.position - predator.position) * predator.direction).rem_euclid(len)
    }

    /// Advance the simulation to `now`; call once per scheduler cycle.
    pub fn advance(&mut self, now: Instant) {
        let dt = self
            .last_advance
            .map(|last| secs_f32(now.saturating_duration_since(last)))
            .unwrap_or(0.0)
            .min(MAX_STEP_SECS);
        self.last_advance = Some(now);

        if self.ring.is_empty() {
            return;
        }

        if self.phase == ChasePhase::Colliding {
            if self.collision_until.is_some_and(|until| now >= until) {
                self.collision_until = None;
                self.phase = ChasePhase::Cruising;
                self.swap_roles(now);
            } else {
                return;
            }
        }

        if now >= self.next_swap {
            self.swap_roles(now);
        }

        let reverse = (self.tuning.reverse_chance * dt).clamp(0.0, 1.0);
        if dt > 0.0 && self.rng.random_bool(f64::from(reverse)) {
            debug!("[chase] direction reversal");
            for runner in &mut self.runners {
                runner.direction = -runner.direction;
            }
        }

        let separation = self.separation();
        let factor = if separation < self.tuning.proximity {
            self.phase = ChasePhase::Accelerating;
            self.tuning.acceleration
        } else {
            self.phase = ChasePhase::Cruising;
            1.0
        };

        let len = self.ring.len() as f32;
        let predator_step = self.tuning.speed * factor * dt;
        let prey_step = self.tuning.speed * self.tuning.prey_ratio * factor * dt;
        let heading = self.runners[self.predator].direction * self.runners[1 - self.predator].direction;
        let closing = predator_step - prey_step * heading;

        let prey = 1 - self.predator;
        self.runners[prey].step(prey_step, len);
        if separation > f32::EPSILON && closing >= separation {
            self.runners[self.predator].position = self.runners[prey].position;
            self.phase = ChasePhase::Colliding;
            self.collision_until = Some(now + self.tuning.collision_pause);
            self.last_collision = Some(now);
            debug!("[chase] collision at {:.1}", self.runners[prey].position);
        } else {
            self.runners[self.predator].step(predator_step, len);
        }
        self.update_roles();
    }

    /// Swap predator and prey; the new prey turns to flee.
    fn swap_roles(&mut self, now: Instant) {
        self.predator = 1 - self.predator;
        let prey = 1 - self.predator;
        self.runners[prey].direction = -self.runners[self.predator].direction;
        self.last_swap = now;
        self.schedule_swap(now);
        debug!("[chase] roles swapped, predator is runner {}", self.predator);
    }

    /// Draw the next random swap time from an exponential distribution.
    fn schedule_swap(&mut self, now: Instant) {
        let mean = secs_f32(self.tuning.swap_interval);
        let sample: f32 = self.rng.random();
        let wait = -mean * libm::logf(1.0 - sample);
        self.next_swap = now + duration_from_secs_f32(wait.max(0.0));
    }

    fn update_roles(&mut self) {
        for role in &mut self.roles {
            *role = None;
        }
        let prey = self.ring.locate(self.prey_position());
        let predator = self.ring.locate(self.predator_position());
        if let Some((member, _)) = prey {
            self.roles[member] = Some(Role::Prey);
        }
        if let Some((member, _)) = predator {
            self.roles[member] = Some(Role::Predator);
        }
    }
}

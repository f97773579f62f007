//! Configuration loading and validation
//!
//! A TOML document is deserialized into [`ConfigFile`] and resolved into a
//! validated [`Config`]. Invalid values are rejected here, never coerced, so
//! a broken configuration cannot reach the render path.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    chase::ChaseTuning,
    classifier::ClassifierConfig,
    color::{Rgb, WHITE, parse_color},
    effect::{BedExtent, EffectId, EffectOverrides, EffectParams, EffectSpec},
    event::OperatingEvent,
    group::{ChannelKey, Direction, GroupConfig},
    math8::duration_from_secs_f32,
    scheduler::SchedulerConfig,
    telemetry::HeaterKind,
};

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{context}: {field} = {value} is out of range")]
    OutOfRange {
        context: String,
        field: &'static str,
        value: f64,
    },
    #[error("{context}: minimum {field} {min} exceeds maximum {max}")]
    InvertedBounds {
        context: String,
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{context}: unknown color '{name}'")]
    UnknownColor { context: String, name: String },
    #[error("{context}: unknown effect '{name}'")]
    UnknownEffect { context: String, name: String },
    #[error("group '{group}': unknown event '{name}'")]
    UnknownEvent { group: String, name: String },
    #[error("{context}: empty effect specification")]
    EmptySpec { context: String },
    #[error("group '{group}': invalid index range {start}..={end}")]
    InvalidRange {
        group: String,
        start: usize,
        end: usize,
    },
    #[error("group '{group}': {channel} channel requires '{field}'")]
    MissingField {
        group: String,
        channel: &'static str,
        field: &'static str,
    },
    #[error("group '{group}': effect '{effect}' requires addressable LEDs")]
    UnsupportedEffect { group: String, effect: &'static str },
    #[error("chase ring '{ring}' has no members")]
    EmptyRing { ring: String },
    #[error("chase ring '{ring}': unknown member group '{group}'")]
    UnknownRingMember { ring: String, group: String },
    #[error("chase ring '{ring}': group '{group}' already belongs to a ring")]
    DuplicateRingMember { ring: String, group: String },
}

impl ConfigError {
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::Io { .. } => "config_io",
            Self::Parse(_) => "config_parse",
            Self::OutOfRange { .. } => "config_out_of_range",
            Self::InvertedBounds { .. } => "config_inverted_bounds",
            Self::UnknownColor { .. } => "config_unknown_color",
            Self::UnknownEffect { .. } => "config_unknown_effect",
            Self::UnknownEvent { .. } => "config_unknown_event",
            Self::EmptySpec { .. } => "config_empty_spec",
            Self::InvalidRange { .. } => "config_invalid_range",
            Self::MissingField { .. } => "config_missing_field",
            Self::UnsupportedEffect { .. } => "config_unsupported_effect",
            Self::EmptyRing { .. } => "config_empty_ring",
            Self::UnknownRingMember { .. } => "config_unknown_ring_member",
            Self::DuplicateRingMember { .. } => "config_duplicate_ring_member",
        }
    }
}

/// Global engine settings, `[settings]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub temp_floor: f32,
    pub print_floor: f32,
    pub tool_tolerance: f32,
    pub bed_tolerance: f32,
    pub cooldown_margin: f32,
    /// Seconds idle before bored
    pub bored_timeout: f32,
    /// Seconds bored before sleep
    pub sleep_timeout: f32,
    /// Global brightness cap applied after every effect
    pub max_brightness: f32,
    pub direct_fps: f32,
    /// Seconds between firmware-queued updates
    pub update_rate: f32,
    pub update_rate_printing: f32,
    pub static_refresh: f32,
    pub reactive_interval: f32,
    pub min_sleep_ms: u64,
    pub max_sleep_ms: u64,
    pub shutdown_timeout: f32,
    pub bed_x_min: f32,
    pub bed_x_max: f32,
    pub bed_y_min: f32,
    pub bed_y_max: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temp_floor: 25.0,
            print_floor: 200.0,
            tool_tolerance: 10.0,
            bed_tolerance: 5.0,
            cooldown_margin: 10.0,
            bored_timeout: 300.0,
            sleep_timeout: 600.0,
            max_brightness: 0.4,
            direct_fps: 60.0,
            update_rate: 0.1,
            update_rate_printing: 1.0,
            static_refresh: 5.0,
            reactive_interval: 0.25,
            min_sleep_ms: 5,
            max_sleep_ms: 250,
            shutdown_timeout: 2.0,
            bed_x_min: 0.0,
            bed_x_max: 300.0,
            bed_y_min: 0.0,
            bed_y_max: 300.0,
        }
    }
}

/// Hardware sidecar endpoint, `[sidecar]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SidecarSettings {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
    pub attempts: u32,
    pub color_order: String,
}

impl Default for SidecarSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3769,
            timeout_ms: 1000,
            attempts: 3,
            color_order: "GRB".to_owned(),
        }
    }
}

impl SidecarSettings {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Firmware command queue, `[firmware]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FirmwareSettings {
    pub timeout_ms: u64,
}

impl Default for FirmwareSettings {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

/// Circuit breaker policy, `[dispatch]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchSettings {
    pub failure_threshold: u32,
    pub probe_first_ms: u64,
    pub probe_max_ms: u64,
    pub probe_factor: f32,
    /// Upper bound on one channel send, whatever the adapter does
    pub send_timeout_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 10,
            probe_first_ms: 1000,
            probe_max_ms: 30_000,
            probe_factor: 2.0,
            send_timeout_ms: 1000,
        }
    }
}

/// `[[chase_rings]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingSettings {
    pub name: String,
    pub members: Vec<String>,
    pub speed: f32,
    pub prey_ratio: f32,
    pub proximity: f32,
    pub acceleration: f32,
    /// Seconds
    pub collision_pause: f32,
    /// Mean seconds between random role swaps
    pub swap_interval: f32,
    pub reverse_chance: f32,
}

impl Default for RingSettings {
    fn default() -> Self {
        let tuning = ChaseTuning::default();
        Self {
            name: String::new(),
            members: Vec::new(),
            speed: tuning.speed,
            prey_ratio: tuning.prey_ratio,
            proximity: tuning.proximity,
            acceleration: tuning.acceleration,
            collision_pause: 0.6,
            swap_interval: 12.0,
            reverse_chance: tuning.reverse_chance,
        }
    }
}

/// Output driver kind of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    #[serde(alias = "proxy")]
    Sidecar,
    #[serde(alias = "klipper")]
    Firmware,
    #[serde(alias = "pwm")]
    Binary,
}

/// Effect mapping as written: `"pulse white"` or a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectEntry {
    Inline(String),
    Table(EffectTable),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTable {
    pub effect: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(flatten)]
    pub overrides: EffectOverrides,
}

/// `[groups.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    #[serde(alias = "channel")]
    pub driver: ChannelKind,
    pub gpio_pin: Option<u8>,
    pub neopixel: Option<String>,
    pub pin_name: Option<String>,
    pub scale: f32,
    pub index_start: usize,
    pub index_end: Option<usize>,
    pub direction: Direction,
    pub brightness: f32,
    pub on: BTreeMap<String, EffectEntry>,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            driver: ChannelKind::Sidecar,
            gpio_pin: None,
            neopixel: None,
            pin_name: None,
            scale: 1.0,
            index_start: 1,
            index_end: None,
            direction: Direction::Standard,
            brightness: 1.0,
            on: BTreeMap::new(),
        }
    }
}

/// Raw configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub settings: Settings,
    pub sidecar: SidecarSettings,
    pub firmware: FirmwareSettings,
    pub dispatch: DispatchSettings,
    /// Per-effect parameter defaults, `[effects.<name>]`
    pub effects: BTreeMap<String, EffectOverrides>,
    pub chase_rings: Vec<RingSettings>,
    pub groups: BTreeMap<String, GroupSettings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RingConfig {
    pub name: String,
    pub members: Vec<String>,
    pub tuning: ChaseTuning,
}

/// Validated configuration consumed by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub settings: Settings,
    pub sidecar: SidecarSettings,
    pub firmware: FirmwareSettings,
    pub dispatch: DispatchSettings,
    pub groups: Vec<GroupConfig>,
    pub rings: Vec<RingConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            sidecar: SidecarSettings::default(),
            firmware: FirmwareSettings::default(),
            dispatch: DispatchSettings::default(),
            groups: Vec::new(),
            rings: Vec::new(),
        }
    }
}

fn check_unit(context: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            context: context.to_owned(),
            field,
            value: f64::from(value),
        })
    }
}

fn check_positive(context: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            context: context.to_owned(),
            field,
            value: f64::from(value),
        })
    }
}

fn check_non_negative(context: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            context: context.to_owned(),
            field,
            value: f64::from(value),
        })
    }
}

fn lookup_color(context: &str, name: &str) -> Result<Rgb, ConfigError> {
    parse_color(name).ok_or_else(|| ConfigError::UnknownColor {
        context: context.to_owned(),
        name: name.to_owned(),
    })
}

fn lookup_effect(context: &str, name: &str) -> Result<EffectId, ConfigError> {
    EffectId::parse_from_str(name).ok_or_else(|| ConfigError::UnknownEffect {
        context: context.to_owned(),
        name: name.to_owned(),
    })
}

/// Parse an inline effect specification.
///
/// Accepted forms:
/// - `effect` or `effect color` or `effect:color`
/// - `thermal [source] [start_color] [end_color] [curve]`
/// - `progress [start_color] [end_color] [curve]`
///
/// Parameters start from the effect's defaults layered with `defaults`.
pub fn parse_effect_spec(
    context: &str,
    value: &str,
    defaults: &BTreeMap<String, EffectOverrides>,
) -> Result<EffectSpec, ConfigError> {
    let (head, rest) = match value.split_once(':') {
        Some((effect, color)) => (effect.trim(), vec![color.trim()]),
        None => {
            let mut parts = value.split_whitespace();
            let Some(head) = parts.next() else {
                return Err(ConfigError::EmptySpec {
                    context: context.to_owned(),
                });
            };
            (head, parts.collect())
        }
    };
    if head.is_empty() {
        return Err(ConfigError::EmptySpec {
            context: context.to_owned(),
        });
    }

    let effect = lookup_effect(context, head)?;
    let mut spec = base_spec(context, effect, defaults)?;

    let mut args = rest.into_iter().peekable();
    match effect {
        EffectId::Thermal | EffectId::Progress => {
            if effect == EffectId::Thermal {
                if let Some(source) = args.peek().and_then(|arg| HeaterKind::parse_from_str(arg)) {
                    spec.params.temp_source = source;
                    args.next();
                }
            }
            if let Some(start) = args.next() {
                spec.params.start_color = lookup_color(context, start)?;
            }
            if let Some(end) = args.next() {
                spec.params.end_color = lookup_color(context, end)?;
            }
            if let Some(curve) = args.next() {
                let curve = curve.parse::<f32>().map_err(|_| ConfigError::OutOfRange {
                    context: context.to_owned(),
                    field: "gradient_curve",
                    value: f64::NAN,
                })?;
                check_positive(context, "gradient_curve", curve)?;
                spec.params.gradient_curve = curve;
            }
        }
        _ => {
            if let Some(color) = args.next() {
                spec.color = lookup_color(context, color)?;
            }
        }
    }
    Ok(spec)
}

fn base_spec(
    context: &str,
    effect: EffectId,
    defaults: &BTreeMap<String, EffectOverrides>,
) -> Result<EffectSpec, ConfigError> {
    let mut params = EffectParams::defaults_for(effect);
    if let Some(overrides) = defaults.get(effect.as_str()) {
        overrides.apply(context, &mut params)?;
    }
    Ok(EffectSpec::new(effect, WHITE).with_params(params))
}

fn resolve_entry(
    context: &str,
    entry: &EffectEntry,
    defaults: &BTreeMap<String, EffectOverrides>,
) -> Result<EffectSpec, ConfigError> {
    match entry {
        EffectEntry::Inline(value) => parse_effect_spec(context, value, defaults),
        EffectEntry::Table(table) => {
            let effect = lookup_effect(context, table.effect.trim())?;
            let mut spec = base_spec(context, effect, defaults)?;
            if let Some(color) = &table.color {
                spec.color = lookup_color(context, color)?;
            }
            table.overrides.apply(context, &mut spec.params)?;
            Ok(spec)
        }
    }
}

fn resolve_channel(name: &str, group: &GroupSettings) -> Result<ChannelKey, ConfigError> {
    let missing = |channel, field| ConfigError::MissingField {
        group: name.to_owned(),
        channel,
        field,
    };
    Ok(match group.driver {
        ChannelKind::Sidecar => ChannelKey::Sidecar {
            gpio_pin: group.gpio_pin.ok_or_else(|| missing("sidecar", "gpio_pin"))?,
        },
        ChannelKind::Firmware => ChannelKey::Firmware {
            neopixel: group
                .neopixel
                .clone()
                .ok_or_else(|| missing("firmware", "neopixel"))?,
        },
        ChannelKind::Binary => ChannelKey::Binary {
            pin_name: group
                .pin_name
                .clone()
                .ok_or_else(|| missing("binary", "pin_name"))?,
        },
    })
}

fn resolve_group(
    name: &str,
    group: &GroupSettings,
    defaults: &BTreeMap<String, EffectOverrides>,
) -> Result<GroupConfig, ConfigError> {
    let context = format!("group '{name}'");
    let channel = resolve_channel(name, group)?;

    let index_end = group.index_end.unwrap_or(group.index_start);
    if group.index_start == 0 || index_end < group.index_start {
        return Err(ConfigError::InvalidRange {
            group: name.to_owned(),
            start: group.index_start,
            end: index_end,
        });
    }
    check_unit(&context, "brightness", group.brightness)?;
    check_positive(&context, "scale", group.scale)?;

    let mut config = GroupConfig::new(name, channel, group.index_start, index_end)
        .with_direction(group.direction)
        .with_brightness(group.brightness);
    config.pwm_scale = group.scale;

    for (event_name, entry) in &group.on {
        let event = OperatingEvent::parse_from_str(event_name).ok_or_else(|| {
            ConfigError::UnknownEvent {
                group: name.to_owned(),
                name: event_name.clone(),
            }
        })?;
        let spec = resolve_entry(&format!("{context} on {event_name}"), entry, defaults)?;

        if config.channel.class() == crate::group::ChannelClass::Binary && !spec.effect.is_uniform()
        {
            return Err(ConfigError::UnsupportedEffect {
                group: name.to_owned(),
                effect: spec.effect.as_str(),
            });
        }
        config.effects.insert(event, spec);
    }
    Ok(config)
}

fn resolve_ring(
    ring: &RingSettings,
    groups: &[GroupConfig],
    claimed: &mut BTreeSet<String>,
) -> Result<RingConfig, ConfigError> {
    let context = format!("chase ring '{}'", ring.name);
    if ring.members.is_empty() {
        return Err(ConfigError::EmptyRing {
            ring: ring.name.clone(),
        });
    }
    for member in &ring.members {
        if !groups.iter().any(|group| &group.name == member) {
            return Err(ConfigError::UnknownRingMember {
                ring: ring.name.clone(),
                group: member.clone(),
            });
        }
        if !claimed.insert(member.clone()) {
            return Err(ConfigError::DuplicateRingMember {
                ring: ring.name.clone(),
                group: member.clone(),
            });
        }
    }

    check_positive(&context, "speed", ring.speed)?;
    check_positive(&context, "prey_ratio", ring.prey_ratio)?;
    check_non_negative(&context, "proximity", ring.proximity)?;
    check_positive(&context, "acceleration", ring.acceleration)?;
    check_non_negative(&context, "collision_pause", ring.collision_pause)?;
    check_positive(&context, "swap_interval", ring.swap_interval)?;
    check_unit(&context, "reverse_chance", ring.reverse_chance)?;

    Ok(RingConfig {
        name: ring.name.clone(),
        members: ring.members.clone(),
        tuning: ChaseTuning {
            speed: ring.speed,
            prey_ratio: ring.prey_ratio,
            proximity: ring.proximity,
            acceleration: ring.acceleration,
            collision_pause: duration_from_secs_f32(ring.collision_pause),
            swap_interval: duration_from_secs_f32(ring.swap_interval),
            reverse_chance: ring.reverse_chance,
        },
    })
}

fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let context = "settings";
    check_unit(context, "max_brightness", settings.max_brightness)?;
    check_non_negative(context, "print_floor", settings.print_floor)?;
    check_non_negative(context, "tool_tolerance", settings.tool_tolerance)?;
    check_non_negative(context, "bed_tolerance", settings.bed_tolerance)?;
    check_non_negative(context, "cooldown_margin", settings.cooldown_margin)?;
    check_positive(context, "bored_timeout", settings.bored_timeout)?;
    check_positive(context, "sleep_timeout", settings.sleep_timeout)?;
    check_positive(context, "direct_fps", settings.direct_fps)?;
    check_positive(context, "update_rate", settings.update_rate)?;
    check_positive(context, "update_rate_printing", settings.update_rate_printing)?;
    check_positive(context, "static_refresh", settings.static_refresh)?;
    check_positive(context, "reactive_interval", settings.reactive_interval)?;
    check_positive(context, "shutdown_timeout", settings.shutdown_timeout)?;
    if !settings.temp_floor.is_finite() {
        return Err(ConfigError::OutOfRange {
            context: context.to_owned(),
            field: "temp_floor",
            value: f64::from(settings.temp_floor),
        });
    }
    if settings.min_sleep_ms == 0 || settings.min_sleep_ms > settings.max_sleep_ms {
        return Err(ConfigError::InvertedBounds {
            context: context.to_owned(),
            field: "sleep_ms",
            min: settings.min_sleep_ms as f64,
            max: settings.max_sleep_ms as f64,
        });
    }
    Ok(())
}

fn check_nonzero(context: &str, field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            context: context.to_owned(),
            field,
            value: 0.0,
        })
    }
}

fn validate_outputs(
    sidecar: &SidecarSettings,
    firmware: &FirmwareSettings,
    dispatch: &DispatchSettings,
) -> Result<(), ConfigError> {
    check_nonzero("sidecar", "timeout_ms", sidecar.timeout_ms)?;
    check_nonzero("sidecar", "attempts", u64::from(sidecar.attempts))?;
    check_nonzero("firmware", "timeout_ms", firmware.timeout_ms)?;

    let context = "dispatch";
    check_nonzero(context, "failure_threshold", u64::from(dispatch.failure_threshold))?;
    check_nonzero(context, "send_timeout_ms", dispatch.send_timeout_ms)?;
    check_nonzero(context, "probe_first_ms", dispatch.probe_first_ms)?;
    if dispatch.probe_first_ms > dispatch.probe_max_ms {
        return Err(ConfigError::InvertedBounds {
            context: context.to_owned(),
            field: "probe_ms",
            min: dispatch.probe_first_ms as f64,
            max: dispatch.probe_max_ms as f64,
        });
    }
    // Probe delays never shrink
    if !dispatch.probe_factor.is_finite() || dispatch.probe_factor < 1.0 {
        return Err(ConfigError::OutOfRange {
            context: context.to_owned(),
            field: "probe_factor",
            value: f64::from(dispatch.probe_factor),
        });
    }
    Ok(())
}

impl ConfigFile {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Validate and resolve into a [`Config`]
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        validate_settings(&self.settings)?;
        validate_outputs(&self.sidecar, &self.firmware, &self.dispatch)?;
        for (name, overrides) in &self.effects {
            let effect = lookup_effect("effects", name)?;
            let mut params = EffectParams::defaults_for(effect);
            overrides.apply(&format!("effects.{name}"), &mut params)?;
        }

        let groups = self
            .groups
            .iter()
            .map(|(name, group)| resolve_group(name, group, &self.effects))
            .collect::<Result<Vec<_>, _>>()?;

        let mut claimed = BTreeSet::new();
        let rings = self
            .chase_rings
            .iter()
            .map(|ring| resolve_ring(ring, &groups, &mut claimed))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config {
            settings: self.settings.clone(),
            sidecar: self.sidecar.clone(),
            firmware: self.firmware.clone(),
            dispatch: self.dispatch.clone(),
            groups,
            rings,
        })
    }
}

impl Config {
    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        ConfigFile::from_toml_str(source)?.resolve()
    }

    pub fn group(&self, name: &str) -> Option<&GroupConfig> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn classifier(&self) -> ClassifierConfig {
        let settings = &self.settings;
        ClassifierConfig {
            tool_tolerance: settings.tool_tolerance,
            bed_tolerance: settings.bed_tolerance,
            print_floor: settings.print_floor,
            temp_floor: settings.temp_floor,
            cooldown_margin: settings.cooldown_margin,
            bored_timeout: duration_from_secs_f32(settings.bored_timeout),
            sleep_timeout: duration_from_secs_f32(settings.sleep_timeout),
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        let settings = &self.settings;
        SchedulerConfig {
            direct_interval: duration_from_secs_f32(1.0 / settings.direct_fps),
            firmware_interval: duration_from_secs_f32(settings.update_rate),
            firmware_interval_printing: duration_from_secs_f32(settings.update_rate_printing),
            static_refresh: duration_from_secs_f32(settings.static_refresh),
            reactive_interval: duration_from_secs_f32(settings.reactive_interval),
            min_sleep: Duration::from_millis(settings.min_sleep_ms),
            max_sleep: Duration::from_millis(settings.max_sleep_ms),
            max_brightness: settings.max_brightness,
            temp_floor: settings.temp_floor,
            bed: BedExtent {
                x_min: settings.bed_x_min,
                x_max: settings.bed_x_max,
                y_min: settings.bed_y_min,
                y_max: settings.bed_y_max,
            },
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        duration_from_secs_f32(self.settings.shutdown_timeout)
    }
}

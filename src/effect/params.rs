//! Effect parameters
//!
//! [`EffectParams`] is the resolved, typed parameter set an effect reads each
//! frame. [`EffectOverrides`] is its configuration-file counterpart: every
//! field optional, colors by name.

use serde::{Deserialize, Serialize};

use crate::{
    color::{Rgb, parse_color},
    config::ConfigError,
    effect::EffectId,
    telemetry::HeaterKind,
};

/// Toolhead axis followed by the scanner effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingAxis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Cycles, pixels or updates per second depending on the effect
    pub speed: f32,
    pub min_brightness: f32,
    pub max_brightness: f32,
    pub min_sparkle: u16,
    pub max_sparkle: u16,
    /// Rainbow hue spread across the strip, in full turns
    pub spread: f32,
    /// Fire heat retained per update is `1 - cooling`
    pub cooling: f32,
    pub tail_length: u16,
    pub fade_rate: f32,
    pub eye_size: u16,
    pub tracking_axis: Option<TrackingAxis>,
    pub chase_colors: (Rgb, Rgb),
    pub chase_size: u16,
    pub chase_offset_base: f32,
    pub chase_offset_variation: f32,
    pub start_color: Rgb,
    pub end_color: Rgb,
    pub gradient_curve: f32,
    pub temp_source: HeaterKind,
}

const STEEL: Rgb = Rgb {
    r: 128,
    g: 128,
    b: 153,
};
const MATRIX: Rgb = Rgb {
    r: 0,
    g: 255,
    b: 77,
};

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            min_brightness: 0.2,
            max_brightness: 1.0,
            min_sparkle: 1,
            max_sparkle: 6,
            spread: 1.0,
            cooling: 0.3,
            tail_length: 10,
            fade_rate: 0.5,
            eye_size: 3,
            tracking_axis: None,
            chase_colors: (Rgb { r: 255, g: 0, b: 0 }, Rgb { r: 0, g: 0, b: 255 }),
            chase_size: 5,
            chase_offset_base: 0.5,
            chase_offset_variation: 0.1,
            start_color: STEEL,
            end_color: MATRIX,
            gradient_curve: 2.0,
            temp_source: HeaterKind::Tool,
        }
    }
}

impl EffectParams {
    /// Built-in defaults for one effect
    pub fn defaults_for(effect: EffectId) -> Self {
        let mut params = Self::default();
        match effect {
            EffectId::Kitt => params.tail_length = 8,
            EffectId::Comet => params.speed = 10.0,
            EffectId::Fire => params.speed = 20.0,
            EffectId::Disco => params.speed = 5.0,
            EffectId::Chase => params.speed = 8.0,
            _ => {}
        }
        params
    }
}

/// Optional parameter overrides as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectOverrides {
    pub speed: Option<f32>,
    pub min_brightness: Option<f32>,
    pub max_brightness: Option<f32>,
    pub min_sparkle: Option<u16>,
    pub max_sparkle: Option<u16>,
    pub spread: Option<f32>,
    pub cooling: Option<f32>,
    pub tail_length: Option<u16>,
    pub fade_rate: Option<f32>,
    pub eye_size: Option<u16>,
    pub tracking_axis: Option<TrackingAxis>,
    pub chase_color_1: Option<String>,
    pub chase_color_2: Option<String>,
    pub chase_size: Option<u16>,
    pub chase_offset_base: Option<f32>,
    pub chase_offset_variation: Option<f32>,
    pub start_color: Option<String>,
    pub end_color: Option<String>,
    pub gradient_curve: Option<f32>,
    pub temp_source: Option<HeaterKind>,
}

fn color(context: &str, name: Option<&String>) -> Result<Option<Rgb>, ConfigError> {
    name.map(|name| {
        parse_color(name).ok_or_else(|| ConfigError::UnknownColor {
            context: context.to_owned(),
            name: name.clone(),
        })
    })
    .transpose()
}

fn unit(context: &str, field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            context: context.to_owned(),
            field,
            value: f64::from(value),
        })
    }
}

fn positive(context: &str, field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            context: context.to_owned(),
            field,
            value: f64::from(value),
        })
    }
}

impl EffectOverrides {
    /// Layer these overrides over `params`, validating every value.
    ///
    /// `context` names the configuration location for error messages.
    pub fn apply(&self, context: &str, params: &mut EffectParams) -> Result<(), ConfigError> {
        if let Some(speed) = self.speed {
            params.speed = positive(context, "speed", speed)?;
        }
        if let Some(value) = self.min_brightness {
            params.min_brightness = unit(context, "min_brightness", value)?;
        }
        if let Some(value) = self.max_brightness {
            params.max_brightness = unit(context, "max_brightness", value)?;
        }
        if let Some(value) = self.min_sparkle {
            params.min_sparkle = value;
        }
        if let Some(value) = self.max_sparkle {
            params.max_sparkle = value;
        }
        if let Some(value) = self.spread {
            params.spread = positive(context, "spread", value)?;
        }
        if let Some(value) = self.cooling {
            params.cooling = unit(context, "cooling", value)?;
        }
        if let Some(value) = self.tail_length {
            params.tail_length = value;
        }
        if let Some(value) = self.fade_rate {
            params.fade_rate = unit(context, "fade_rate", value)?;
        }
        if let Some(value) = self.eye_size {
            params.eye_size = value;
        }
        if self.tracking_axis.is_some() {
            params.tracking_axis = self.tracking_axis;
        }
        if let Some(value) = color(context, self.chase_color_1.as_ref())? {
            params.chase_colors.0 = value;
        }
        if let Some(value) = color(context, self.chase_color_2.as_ref())? {
            params.chase_colors.1 = value;
        }
        if let Some(value) = self.chase_size {
            params.chase_size = value;
        }
        if let Some(value) = self.chase_offset_base {
            params.chase_offset_base = unit(context, "chase_offset_base", value)?;
        }
        if let Some(value) = self.chase_offset_variation {
            params.chase_offset_variation = unit(context, "chase_offset_variation", value)?;
        }
        if let Some(value) = color(context, self.start_color.as_ref())? {
            params.start_color = value;
        }
        if let Some(value) = color(context, self.end_color.as_ref())? {
            params.end_color = value;
        }
        if let Some(value) = self.gradient_curve {
            params.gradient_curve = positive(context, "gradient_curve", value)?;
        }
        if let Some(value) = self.temp_source {
            params.temp_source = value;
        }

        if params.min_brightness > params.max_brightness {
            return Err(ConfigError::InvertedBounds {
                context: context.to_owned(),
                field: "brightness",
                min: f64::from(params.min_brightness),
                max: f64::from(params.max_brightness),
            });
        }
        if params.min_sparkle > params.max_sparkle {
            return Err(ConfigError::InvertedBounds {
                context: context.to_owned(),
                field: "sparkle",
                min: f64::from(params.min_sparkle),
                max: f64::from(params.max_sparkle),
            });
        }
        Ok(())
    }
}

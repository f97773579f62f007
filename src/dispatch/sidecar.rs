//! Hardware sidecar adapter
//!
//! The sidecar accepts `POST /batch_update` with a JSON body of
//! `set_color` (one color over a range) and `set_leds` (per-pixel colors)
//! entries. Colors travel as floats in 0.0-1.0; unlit pixels are `null`.

use async_trait::async_trait;
use serde::Serialize;

use super::{ChannelAdapter, DispatchError, GroupUpdate};
use crate::{
    color::{BLACK, Rgb},
    config::SidecarSettings,
    math8::to_unit,
};

/// Delay before each attempt, in milliseconds
const RETRY_BACKOFF_MS: [u64; 3] = [0, 100, 200];

fn unit_rgb(color: Rgb) -> [f32; 3] {
    [to_unit(color.r), to_unit(color.g), to_unit(color.b)]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedUpdate {
    SetColor {
        gpio_pin: u8,
        index_start: usize,
        index_end: usize,
        r: f32,
        g: f32,
        b: f32,
        color_order: String,
    },
    SetLeds {
        gpio_pin: u8,
        index_start: usize,
        colors: Vec<Option<[f32; 3]>>,
        color_order: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRequest {
    pub updates: Vec<LedUpdate>,
}

impl BatchRequest {
    /// Encode group updates for one bus; uniform groups collapse to `set_color`
    pub fn build(gpio_pin: u8, color_order: &str, updates: &[GroupUpdate]) -> Self {
        let updates = updates
            .iter()
            .filter(|update| !update.colors.is_empty())
            .map(|update| match update.uniform_color() {
                Some(color) => {
                    let [r, g, b] = unit_rgb(color.unwrap_or(BLACK));
                    LedUpdate::SetColor {
                        gpio_pin,
                        index_start: update.index_start,
                        index_end: update.index_end(),
                        r,
                        g,
                        b,
                        color_order: color_order.to_owned(),
                    }
                }
                None => LedUpdate::SetLeds {
                    gpio_pin,
                    index_start: update.index_start,
                    colors: update.colors.iter().map(|c| c.map(unit_rgb)).collect(),
                    color_order: color_order.to_owned(),
                },
            })
            .collect();
        Self { updates }
    }
}

pub struct SidecarAdapter {
    client: reqwest::Client,
    url: String,
    gpio_pin: u8,
    color_order: String,
    attempts: u32,
    timeout_ms: u64,
}

impl SidecarAdapter {
    pub fn new(settings: &SidecarSettings, gpio_pin: u8) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|err| DispatchError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            url: format!("{}/batch_update", settings.base_url()),
            gpio_pin,
            color_order: settings.color_order.clone(),
            attempts: settings.attempts,
            timeout_ms: settings.timeout_ms,
        })
    }

    async fn post(&self, body: &BatchRequest) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    DispatchError::Timeout(self.timeout_ms)
                } else {
                    DispatchError::Transport(err.to_string())
                }
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DispatchError::Status(status.as_u16()))
        }
    }
}

#[async_trait]
impl ChannelAdapter for SidecarAdapter {
    async fn send(&mut self, updates: &[GroupUpdate]) -> Result<(), DispatchError> {
        let body = BatchRequest::build(self.gpio_pin, &self.color_order, updates);
        if body.updates.is_empty() {
            return Ok(());
        }

        let mut last_error = DispatchError::Transport("no attempt made".to_owned());
        for attempt in 0..self.attempts {
            let delay = RETRY_BACKOFF_MS[(attempt as usize).min(RETRY_BACKOFF_MS.len() - 1)];
            if delay > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
            match self.post(&body).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    log::debug!("[sidecar] attempt {} failed: {}", attempt + 1, err);
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}

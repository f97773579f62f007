//! Firmware-queued adapters
//!
//! Both adapters turn frames into G-code and push it through the host's
//! command queue. Addressable strips get one `SET_LED` per pixel with only
//! the last one transmitting; brightness pins get a single `SET_PIN`.

use std::{fmt::Write as _, sync::Arc};

use async_trait::async_trait;
use embassy_time::Duration;

use super::{ChannelAdapter, DispatchError, GroupUpdate};
use crate::{color::BLACK, math8::to_unit};

/// Host command queue that executes G-code scripts
#[async_trait]
pub trait GcodeQueue: Send + Sync {
    async fn run_gcode(&self, script: &str) -> Result<(), String>;
}

async fn run_with_timeout(
    queue: &dyn GcodeQueue,
    script: &str,
    timeout: Duration,
) -> Result<(), DispatchError> {
    let limit = std::time::Duration::from_micros(timeout.as_micros());
    match tokio::time::timeout(limit, queue.run_gcode(script)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(message)) => Err(DispatchError::Firmware(message)),
        Err(_) => Err(DispatchError::Timeout(timeout.as_millis())),
    }
}

/// `SET_LED` script for every pixel of `updates`; the final line transmits
pub fn set_led_script(neopixel: &str, updates: &[GroupUpdate]) -> String {
    let total: usize = updates.iter().map(|update| update.colors.len()).sum();
    let mut script = String::new();
    let mut written = 0;
    for update in updates {
        for (offset, color) in update.colors.iter().enumerate() {
            written += 1;
            let color = color.unwrap_or(BLACK);
            if !script.is_empty() {
                script.push('\n');
            }
            let _ = write!(
                script,
                "SET_LED LED={} RED={:.3} GREEN={:.3} BLUE={:.3} INDEX={} TRANSMIT={}",
                neopixel,
                to_unit(color.r),
                to_unit(color.g),
                to_unit(color.b),
                update.index_start + offset,
                u8::from(written == total),
            );
        }
    }
    script
}

/// `SET_PIN` command driven by the brightest channel of any pixel
pub fn pin_script(pin_name: &str, updates: &[GroupUpdate]) -> Option<String> {
    let value = updates
        .iter()
        .flat_map(|update| {
            update.colors.iter().map(move |color| {
                let color = color.unwrap_or(BLACK);
                to_unit(color.r.max(color.g).max(color.b)) * update.scale
            })
        })
        .reduce(f32::max)?;
    Some(format!("SET_PIN PIN={pin_name} VALUE={:.2}", value.max(0.0)))
}

/// Addressable strip driven through the firmware
pub struct FirmwareAdapter {
    queue: Arc<dyn GcodeQueue>,
    neopixel: String,
    timeout: Duration,
}

impl FirmwareAdapter {
    pub fn new(queue: Arc<dyn GcodeQueue>, neopixel: impl Into<String>, timeout: Duration) -> Self {
        Self {
            queue,
            neopixel: neopixel.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ChannelAdapter for FirmwareAdapter {
    async fn send(&mut self, updates: &[GroupUpdate]) -> Result<(), DispatchError> {
        let script = set_led_script(&self.neopixel, updates);
        if script.is_empty() {
            return Ok(());
        }
        run_with_timeout(self.queue.as_ref(), &script, self.timeout).await
    }
}

/// Single brightness pin driven through the firmware
pub struct PwmAdapter {
    queue: Arc<dyn GcodeQueue>,
    pin_name: String,
    timeout: Duration,
}

impl PwmAdapter {
    pub fn new(queue: Arc<dyn GcodeQueue>, pin_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            queue,
            pin_name: pin_name.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ChannelAdapter for PwmAdapter {
    async fn send(&mut self, updates: &[GroupUpdate]) -> Result<(), DispatchError> {
        let Some(script) = pin_script(&self.pin_name, updates) else {
            return Ok(());
        };
        run_with_timeout(self.queue.as_ref(), &script, self.timeout).await
    }
}

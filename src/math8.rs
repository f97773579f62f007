use embassy_time::Duration;

/// Blend two 8-bit values
#[inline]
#[allow(clippy::cast_possible_wrap)]
pub const fn blend8(a: u8, b: u8, amount_of_b: u8) -> u8 {
    let delta = b as i16 - a as i16;

    let mut partial: u32 = (a as u32) << 16;
    partial = partial.wrapping_add(
        (delta as u32)
            .wrapping_mul(amount_of_b as u32)
            .wrapping_mul(257),
    );
    partial = partial.wrapping_add(0x8000);

    (partial >> 16) as u8
}

/// Convert a unit float (0.0-1.0) to an 8-bit value, clamping out-of-range
/// and non-finite input.
#[inline]
pub fn unit8(value: f32) -> u8 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    if value >= 1.0 {
        return 255;
    }
    libm::roundf(value * 255.0) as u8
}

/// Convert an 8-bit value to a unit float.
#[inline]
pub fn to_unit(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// Seconds elapsed as a float, for effect phase math.
#[inline]
pub fn secs_f32(duration: Duration) -> f32 {
    duration.as_micros() as f32 / 1_000_000.0
}

/// Build a duration from float seconds; negative or non-finite input is zero.
#[inline]
pub fn duration_from_secs_f32(secs: f32) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        return Duration::from_ticks(0);
    }
    Duration::from_micros((f64::from(secs) * 1_000_000.0).round() as u64)
}

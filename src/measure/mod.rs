//! Measurement acquisition seam
//!
//! The link polls its measurement source once per control period. A source
//! reports the latest sensed value on demand, or `None` when nothing new
//! has been acquired since the last poll, in which case the link keeps its
//! previous value rather than zeroing it.

use std::sync::{Arc, Mutex};

use crate::core::SensorChannel;

/// Supplies the latest sensed value on demand
pub trait MeasurementSource: Send + Sync {
    /// Returns the most recent value for `channel`, or `None` when no new
    /// value has been acquired
    fn latest_value(&mut self, channel: SensorChannel) -> Option<f32>;
}

/// A source that hands out whatever was last stored into it
///
/// The writer half can live anywhere, such as a test driving an
/// acquisition sequence or a thread wrapping a real ADC. Each stored value
/// is delivered exactly once; polls in between report no new value.
#[derive(Clone, Default)]
pub struct HeldValue {
    slot: Arc<Mutex<Option<f32>>>,
}

impl HeldValue {
    /// Creates an empty source
    pub fn new() -> Self {
        HeldValue::default()
    }

    /// Stores a value to be picked up by the next poll
    pub fn store(&self, value: f32) {
        *self.slot.lock().unwrap() = Some(value);
    }
}

impl MeasurementSource for HeldValue {
    fn latest_value(&mut self, _channel: SensorChannel) -> Option<f32> {
        self.slot.lock().unwrap().take()
    }
}

/// Software sine generator standing in for a real acquisition chain
///
/// Produces `offset + amplitude * sin(2π f t)` sampled at the given rate,
/// one sample per poll. Useful for demos and soak tests without hardware.
pub struct SineSource {
    amplitude: f32,
    offset: f32,
    frequency_hz: f32,
    sample_rate_hz: f32,
    step: u32,
}

impl SineSource {
    /// Creates a generator; `sample_rate_hz` should match the poll rate
    pub fn new(amplitude: f32, offset: f32, frequency_hz: f32, sample_rate_hz: f32) -> Self {
        SineSource {
            amplitude,
            offset,
            frequency_hz,
            sample_rate_hz,
            step: 0,
        }
    }
}

impl MeasurementSource for SineSource {
    fn latest_value(&mut self, _channel: SensorChannel) -> Option<f32> {
        let t = self.step as f32 / self.sample_rate_hz;
        self.step = self.step.wrapping_add(1);

        let angle = 2.0 * std::f32::consts::PI * self.frequency_hz * t;
        Some(self.offset + self.amplitude * angle.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_value_delivers_once() {
        let mut source = HeldValue::new();
        assert_eq!(source.latest_value(SensorChannel::V_HIGH), None);

        source.store(31.5);
        assert_eq!(source.latest_value(SensorChannel::V_HIGH), Some(31.5));
        // Consumed: the next poll reports no new value.
        assert_eq!(source.latest_value(SensorChannel::V_HIGH), None);
    }

    #[test]
    fn test_held_value_shared_writer() {
        let writer = HeldValue::new();
        let mut reader = writer.clone();

        writer.store(1.0);
        writer.store(2.0);
        // Later stores overwrite earlier ones; only the latest is seen.
        assert_eq!(reader.latest_value(SensorChannel::V_HIGH), Some(2.0));
    }

    #[test]
    fn test_sine_source_stays_in_band() {
        let mut source = SineSource::new(0.5, 32.0, 50.0, 1000.0);

        for _ in 0..1000 {
            let value = source
                .latest_value(SensorChannel::V_HIGH)
                .expect("sine source always has a sample");
            assert!((31.5..=32.5).contains(&value));
        }
    }
}

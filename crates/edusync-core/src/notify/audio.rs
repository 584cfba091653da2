//! Short synthesized completion tone.

use std::f32::consts::TAU;

use super::channel::{ChannelKind, DeliveryContext, NotificationChannel};
use super::record::NotificationRecord;
use crate::error::ChannelError;

/// A sine burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chirp {
    pub frequency_hz: f32,
    pub duration_ms: u32,
    pub gain: f32,
    pub sample_rate: u32,
}

impl Default for Chirp {
    fn default() -> Self {
        Self {
            frequency_hz: 800.0,
            duration_ms: 200,
            gain: 0.3,
            sample_rate: 44_100,
        }
    }
}

impl Chirp {
    pub fn sample_count(&self) -> usize {
        (u64::from(self.sample_rate) * u64::from(self.duration_ms) / 1000) as usize
    }

    /// Mono PCM samples in `-gain..=gain`.
    pub fn synthesize(&self) -> Vec<f32> {
        let rate = self.sample_rate as f32;
        (0..self.sample_count())
            .map(|n| self.gain * (TAU * self.frequency_hz * n as f32 / rate).sin())
            .collect()
    }
}

/// Host audio output.
pub trait AudioSink: Send {
    fn play(&mut self, chirp: &Chirp) -> Result<(), ChannelError>;
}

pub struct AudioChirpChannel {
    sink: Option<Box<dyn AudioSink>>,
    chirp: Chirp,
}

impl AudioChirpChannel {
    pub fn new(sink: impl AudioSink + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            chirp: Chirp::default(),
        }
    }

    /// A channel on a host without audio output; every delivery is skipped.
    pub fn unsupported() -> Self {
        Self {
            sink: None,
            chirp: Chirp::default(),
        }
    }
}

impl NotificationChannel for AudioChirpChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::AudioChirp
    }

    fn deliver(
        &mut self,
        _record: &NotificationRecord,
        ctx: &DeliveryContext,
    ) -> Result<(), ChannelError> {
        if !ctx.sound_enabled {
            return Err(ChannelError::Disabled);
        }
        match self.sink.as_mut() {
            Some(sink) => sink.play(&self.chirp),
            None => Err(ChannelError::Unsupported("no audio output".to_string())),
        }
    }
}

//! Terminal and desktop implementations of the notification sinks.

use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use edusync_core::notify::{AudioSink, Chirp, OsNotifier, Permission, Toast, ToastSink};
use edusync_core::ChannelError;
use notify_rust::Notification;
use tracing::{debug, error};

/// Prints toasts on stderr.
pub struct TerminalToast;

impl ToastSink for TerminalToast {
    fn show(&mut self, toast: &Toast) -> Result<(), ChannelError> {
        let message = &toast.record.message;
        eprintln!(
            "[{}] {} | {}",
            toast.record.title(),
            message.primary,
            message.secondary
        );
        Ok(())
    }
}

/// Plays the synthesized chirp on the default output device.
pub struct Speaker {
    device: Option<cpal::Device>,
    fallback: Option<Box<dyn AudioSink>>,
}

impl Speaker {
    pub fn new() -> Self {
        let device = cpal::default_host().default_output_device();
        if device.is_none() {
            debug!("no default audio output device");
        }
        Self {
            device,
            fallback: None,
        }
    }

    /// Used when there is no output device.
    pub fn with_fallback(mut self, fallback: impl AudioSink + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Bell fallback only when someone can hear it.
    pub fn for_terminal() -> Self {
        let speaker = Self::new();
        if std::io::stderr().is_terminal() {
            speaker.with_fallback(TerminalBell)
        } else {
            speaker
        }
    }
}

impl Default for Speaker {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for Speaker {
    fn play(&mut self, chirp: &Chirp) -> Result<(), ChannelError> {
        match (&self.device, self.fallback.as_mut()) {
            (Some(device), _) => play_samples(device, &chirp.synthesize(), chirp.sample_rate),
            (None, Some(fallback)) => fallback.play(chirp),
            (None, None) => Err(ChannelError::Unsupported("no audio output device".into())),
        }
    }
}

struct PlaybackBuffer {
    samples: Vec<f32>,
    position: usize,
    finished: bool,
}

/// Blocks until every sample has been handed to the device.
fn play_samples(
    device: &cpal::Device,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), ChannelError> {
    let stream_config = StreamConfig {
        channels: 1,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };
    let buffer = Arc::new(Mutex::new(PlaybackBuffer {
        samples: samples.to_vec(),
        position: 0,
        finished: false,
    }));
    let buffer_clone = Arc::clone(&buffer);

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let Ok(mut buf) = buffer_clone.lock() else {
                    return;
                };
                for sample in data.iter_mut() {
                    if buf.position < buf.samples.len() {
                        *sample = buf.samples[buf.position];
                        buf.position += 1;
                    } else {
                        *sample = 0.0;
                        buf.finished = true;
                    }
                }
            },
            move |err| {
                error!("audio output stream error: {err}");
            },
            None,
        )
        .map_err(|e| ChannelError::Delivery(format!("failed to build output stream: {e}")))?;

    stream
        .play()
        .map_err(|e| ChannelError::Delivery(format!("failed to start output stream: {e}")))?;

    let playback_ms = (samples.len() as u64).saturating_mul(1000) / u64::from(sample_rate.max(1));
    let deadline = Instant::now() + Duration::from_millis(playback_ms + 500);
    loop {
        std::thread::sleep(Duration::from_millis(10));
        let finished = buffer.lock().map(|b| b.finished).unwrap_or(true);
        if finished {
            break;
        }
        if Instant::now() >= deadline {
            return Err(ChannelError::Delivery("audio playback timed out".into()));
        }
    }

    drop(stream);
    Ok(())
}

/// Rings the terminal bell in place of the synthesized chirp.
pub struct TerminalBell;

impl AudioSink for TerminalBell {
    fn play(&mut self, _chirp: &Chirp) -> Result<(), ChannelError> {
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .map_err(|e| ChannelError::Delivery(e.to_string()))
    }
}

/// Desktop notifications through the platform notification service.
/// Desktop services have no permission prompt, so delivery is always
/// allowed once the user has notifications enabled.
pub struct DesktopNotifier;

impl OsNotifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn show(&mut self, title: &str, body: &str) -> Result<(), ChannelError> {
        Notification::new()
            .summary(title)
            .body(body)
            .appname("edusync")
            .show()
            .map(|_| ())
            .map_err(|e| ChannelError::Delivery(e.to_string()))
    }
}

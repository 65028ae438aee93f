//! Local audio capture seam and level metering.
//!
//! GUI hosts plug in a device-backed implementation; headless hosts and
//! tests use [`NullCapture`]. The session core never touches a device API
//! directly.

use async_trait::async_trait;
use base64::Engine;
use tokio::sync::mpsc;

use crate::VoiceError;

/// One frame of mono PCM16 samples.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
}

/// Access to the local capture device.
#[async_trait]
pub trait AudioCapture: Send {
    /// Open the device and begin producing frames.
    /// Denied or missing devices fail with [`VoiceError::Acquisition`].
    async fn acquire(&mut self) -> Result<mpsc::Receiver<AudioFrame>, VoiceError>;

    /// Stop all tracks and release the device. Idempotent.
    async fn release(&mut self);
}

/// Capture stub that produces no frames. Used by text-mode hosts and
/// tests; acquiring always succeeds.
#[derive(Default)]
pub struct NullCapture {
    tx: Option<mpsc::Sender<AudioFrame>>,
}

impl NullCapture {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AudioCapture for NullCapture {
    async fn acquire(&mut self) -> Result<mpsc::Receiver<AudioFrame>, VoiceError> {
        let (tx, rx) = mpsc::channel(8);
        // Hold the sender so the channel stays open without frames.
        self.tx = Some(tx);
        Ok(rx)
    }

    async fn release(&mut self) {
        self.tx = None;
    }
}

/// RMS amplitude of a frame, normalized to 0.0..=1.0.
pub fn rms_level(frame: &AudioFrame) -> f32 {
    if frame.samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = frame
        .samples
        .iter()
        .map(|&s| {
            let v = f64::from(s);
            v * v
        })
        .sum();
    let rms = (sum / frame.samples.len() as f64).sqrt();
    (rms / f64::from(i16::MAX)) as f32
}

/// Encode a frame as base64 little-endian PCM16 for
/// `input_audio_buffer.append`.
pub fn encode_frame(frame: &AudioFrame) -> String {
    let mut bytes = Vec::with_capacity(frame.samples.len() * 2);
    for sample in &frame.samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_capture_acquires_and_stays_open() {
        let mut capture = NullCapture::new();
        let mut rx = capture.acquire().await.unwrap();
        // No frames, but the channel is not closed
        assert!(rx.try_recv().is_err());
        assert!(!rx.is_closed());
    }

    #[tokio::test]
    async fn release_twice_is_safe() {
        let mut capture = NullCapture::new();
        let _rx = capture.acquire().await.unwrap();
        capture.release().await;
        capture.release().await;
    }

    #[test]
    fn rms_of_silence_is_zero() {
        let frame = AudioFrame {
            samples: vec![0; 480],
        };
        assert_eq!(rms_level(&frame), 0.0);
    }

    #[test]
    fn rms_of_full_scale_is_one() {
        let frame = AudioFrame {
            samples: vec![i16::MAX; 480],
        };
        let level = rms_level(&frame);
        assert!((level - 1.0).abs() < 1e-4, "got {level}");
    }

    #[test]
    fn rms_of_empty_frame_is_zero() {
        let frame = AudioFrame { samples: vec![] };
        assert_eq!(rms_level(&frame), 0.0);
    }

    #[test]
    fn encode_frame_is_little_endian_base64() {
        let frame = AudioFrame {
            samples: vec![0x0102, -1],
        };
        let encoded = encode_frame(&frame);
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, vec![0x02, 0x01, 0xff, 0xff]);
    }
}

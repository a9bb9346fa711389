//! Visual recognition source.
//!
//! Captures the screen and runs a detector over the frame. The bundled
//! detector is a skin-tone heuristic that stands in for real gesture
//! recognition; it only promises that some detector ran and answered.

use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;

use crate::error::{HandsfreeError, Result};

use super::process::{ProcessRun, run_captured};
use super::{GESTURE_TAG, RecognitionEvent, RecognitionKind, RecognitionSource};

/// One captured screen image.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Decode PNG/JPEG bytes into a frame.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(image::load_from_memory(bytes)?.to_rgb8()))
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Grabs the current screen.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    async fn capture(&self) -> Result<Frame>;
}

/// Decides whether a frame contains the feature of interest.
pub trait Detector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<bool>;
}

/// Screen capture through an external command that writes an image to stdout.
#[derive(Debug, Clone)]
pub struct CommandCapture {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandCapture {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

#[async_trait]
impl ScreenCapture for CommandCapture {
    async fn capture(&self) -> Result<Frame> {
        let run = run_captured(&self.command, self.timeout)
            .await
            .map_err(|e| HandsfreeError::Capture(format!("capture command failed to start: {}", e)))?;

        match run {
            ProcessRun::Finished(output) if output.status.success() => {
                if output.stdout.is_empty() {
                    return Err(HandsfreeError::Capture("capture command produced no image".into()));
                }
                Frame::decode(&output.stdout)
            }
            ProcessRun::Finished(output) => Err(HandsfreeError::Capture(format!(
                "capture command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            ProcessRun::TimedOut => Err(HandsfreeError::Capture(format!(
                "capture timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

/// Placeholder detector: reports a hit when enough sampled pixels look like skin.
#[derive(Debug, Clone)]
pub struct SkinToneDetector {
    /// Fraction of sampled pixels (0.0..=1.0) that must match
    threshold: f32,
    /// Sample every `stride`-th pixel in both directions
    stride: u32,
}

impl SkinToneDetector {
    pub fn new(threshold: f32, stride: u32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            stride: stride.max(1),
        }
    }

    /// Fraction of sampled pixels classified as skin.
    pub fn skin_ratio(&self, frame: &Frame) -> f32 {
        let image = frame.image();
        let (width, height) = image.dimensions();
        let mut sampled = 0u64;
        let mut matched = 0u64;

        for y in (0..height).step_by(self.stride as usize) {
            for x in (0..width).step_by(self.stride as usize) {
                sampled += 1;
                if is_skin(image.get_pixel(x, y).0) {
                    matched += 1;
                }
            }
        }

        if sampled == 0 {
            0.0
        } else {
            matched as f32 / sampled as f32
        }
    }
}

impl Default for SkinToneDetector {
    fn default() -> Self {
        Self::new(0.05, 8)
    }
}

impl Detector for SkinToneDetector {
    fn detect(&self, frame: &Frame) -> Result<bool> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(HandsfreeError::Detection("empty frame".into()));
        }
        Ok(self.skin_ratio(frame) >= self.threshold)
    }
}

// RGB skin classifier for uniform daylight illumination.
fn is_skin([r, g, b]: [u8; 3]) -> bool {
    let (r, g, b) = (r as i16, g as i16, b as i16);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    r > 95 && g > 40 && b > 20 && max - min > 15 && (r - g).abs() > 15 && r > g && r > b
}

/// Visual recognition source: capture, detect, pause.
pub struct VisualSource<C: ScreenCapture, D: Detector> {
    capture: C,
    detector: D,
    interval: Duration,
}

impl<C: ScreenCapture, D: Detector> VisualSource<C, D> {
    pub fn new(capture: C, detector: D, interval: Duration) -> Self {
        Self {
            capture,
            detector,
            interval,
        }
    }
}

#[async_trait]
impl<C: ScreenCapture, D: Detector> RecognitionSource for VisualSource<C, D> {
    fn kind(&self) -> RecognitionKind {
        RecognitionKind::Visual
    }

    async fn next_event(&self, _timeout: Duration) -> Result<Option<RecognitionEvent>> {
        let frame = self.capture.capture().await?;
        if self.detector.detect(&frame)? {
            Ok(Some(RecognitionEvent::Detection(GESTURE_TAG.to_string())))
        } else {
            Ok(None)
        }
    }

    fn pace(&self) -> Option<Duration> {
        Some(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    const SKIN: Rgb<u8> = Rgb([224, 172, 105]);
    const WALL: Rgb<u8> = Rgb([40, 60, 200]);

    fn frame_with_skin(width: u32, height: u32, skin_rows: u32) -> Frame {
        let image = RgbImage::from_fn(width, height, |_, y| if y < skin_rows { SKIN } else { WALL });
        Frame::new(image)
    }

    struct FixedCapture(Frame);

    #[async_trait]
    impl ScreenCapture for FixedCapture {
        async fn capture(&self) -> Result<Frame> {
            Ok(self.0.clone())
        }
    }

    struct BrokenCapture;

    #[async_trait]
    impl ScreenCapture for BrokenCapture {
        async fn capture(&self) -> Result<Frame> {
            Err(HandsfreeError::Capture("no display".into()))
        }
    }

    #[test]
    fn test_is_skin() {
        assert!(is_skin(SKIN.0));
        assert!(!is_skin(WALL.0));
        assert!(!is_skin([0, 0, 0]));
        assert!(!is_skin([255, 255, 255]));
    }

    #[test]
    fn test_skin_ratio() {
        let detector = SkinToneDetector::new(0.5, 1);
        let frame = frame_with_skin(10, 10, 3);
        let ratio = detector.skin_ratio(&frame);
        assert!((ratio - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_detect_threshold() {
        let frame = frame_with_skin(16, 16, 8);
        assert!(SkinToneDetector::new(0.25, 1).detect(&frame).unwrap());
        assert!(!SkinToneDetector::new(0.75, 1).detect(&frame).unwrap());
    }

    #[test]
    fn test_detect_empty_frame_errors() {
        let frame = Frame::new(RgbImage::new(0, 0));
        assert!(SkinToneDetector::default().detect(&frame).is_err());
    }

    #[test]
    fn test_threshold_and_stride_clamped() {
        let detector = SkinToneDetector::new(3.0, 0);
        assert_eq!(detector.threshold, 1.0);
        assert_eq!(detector.stride, 1);
    }

    #[test]
    fn test_decode_png() {
        let image = RgbImage::from_pixel(4, 3, SKIN);
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        let frame = Frame::decode(bytes.get_ref()).unwrap();
        assert_eq!(frame.dimensions(), (4, 3));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(Frame::decode(b"not an image").is_err());
    }

    #[tokio::test]
    async fn test_visual_source_detection() {
        let source = VisualSource::new(
            FixedCapture(frame_with_skin(8, 8, 8)),
            SkinToneDetector::new(0.5, 1),
            Duration::from_millis(100),
        );
        assert_eq!(source.kind(), RecognitionKind::Visual);
        assert_eq!(source.pace(), Some(Duration::from_millis(100)));
        let event = source.next_event(Duration::from_secs(1)).await.unwrap();
        assert_eq!(event, Some(RecognitionEvent::Detection(GESTURE_TAG.into())));
    }

    #[tokio::test]
    async fn test_visual_source_no_detection() {
        let source = VisualSource::new(
            FixedCapture(frame_with_skin(8, 8, 0)),
            SkinToneDetector::new(0.5, 1),
            Duration::from_millis(100),
        );
        assert_eq!(source.next_event(Duration::from_secs(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_visual_source_capture_error_propagates() {
        let source = VisualSource::new(BrokenCapture, SkinToneDetector::default(), Duration::ZERO);
        assert!(source.next_event(Duration::from_secs(1)).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_capture_failure() {
        let capture = CommandCapture::new(vec!["false".into()], Duration::from_secs(1));
        let err = capture.capture().await.unwrap_err();
        assert!(matches!(err, HandsfreeError::Capture(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_capture_empty_output() {
        let capture = CommandCapture::new(vec!["true".into()], Duration::from_secs(1));
        let err = capture.capture().await.unwrap_err();
        assert!(err.to_string().contains("no image"));
    }
}

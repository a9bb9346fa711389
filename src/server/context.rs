//! Server context - wiring from config to a running controller
//!
//! Builds the process-backed collaborators (action executor, recognizer,
//! screen capture, detector) and hands them to a LoopController.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::commands::{ActionExecutor, CommandRegistry, ProcessExecutor};
use crate::config::Config;
use crate::controller::LoopController;
use crate::recognition::{
    CommandCapture, ProcessRecognizer, RecognitionSource, SkinToneDetector, VisualSource, VoiceSource,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ServerState {
    pub controller: Arc<LoopController>,
    /// Limit used by `/command-history` when the query omits one
    pub default_limit: usize,
}

impl ServerState {
    pub fn new(controller: Arc<LoopController>, default_limit: usize) -> Self {
        Self {
            controller,
            default_limit,
        }
    }
}

/// Command registry with every built-in desktop action.
pub fn build_registry(config: &Config) -> CommandRegistry {
    let executor: Arc<dyn ActionExecutor> = Arc::new(ProcessExecutor::new(Duration::from_millis(config.actions.timeout_ms)));
    CommandRegistry::desktop(executor, &config.actions.overrides)
}

/// Voice source driving the configured listen command.
pub fn build_voice_source(config: &Config) -> Arc<dyn RecognitionSource> {
    let voice = &config.voice;
    let recognizer = ProcessRecognizer::new(voice.listen_command.clone())
        .with_calibrate_command(voice.calibrate_command.clone())
        .with_transcribe_slack(Duration::from_millis(voice.transcribe_slack_ms));
    Arc::new(VoiceSource::new(recognizer, Duration::from_millis(voice.calibration_ms)))
}

/// Visual source capturing through the configured command.
pub fn build_visual_source(config: &Config) -> Arc<dyn RecognitionSource> {
    let visual = &config.visual;
    let capture = CommandCapture::new(
        visual.capture_command.clone(),
        Duration::from_millis(visual.capture_timeout_ms),
    );
    let detector = SkinToneDetector::new(visual.skin_ratio_threshold, visual.sample_stride);
    Arc::new(VisualSource::new(capture, detector, Duration::from_millis(visual.interval_ms)))
}

/// Build a controller wired to the real desktop collaborators.
pub fn build_controller(config: &Config) -> LoopController {
    let registry = build_registry(config);
    info!("Registered {} desktop commands", registry.len());
    LoopController::new(
        registry,
        build_voice_source(config),
        build_visual_source(config),
        config.controller_config(),
    )
}

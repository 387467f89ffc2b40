use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives the numbered frame files.
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Seconds between two samples of the selected region.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
    /// Pause before the selection screenshot, to let the user bring the
    /// watched window to the front.
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    /// The preview is shown at this fraction of the real display resolution.
    #[serde(default = "default_preview_scale_factor")]
    pub preview_scale_factor: f64,
    /// Resize the preview to exactly `[width, height]` instead, which may
    /// change the aspect ratio. Takes precedence over `preview_scale_factor`.
    #[serde(default)]
    pub preview_size: Option<[u32; 2]>,
    #[serde(default = "default_window_title")]
    pub window_title: String,
    /// Weight of the selection mask when blended over the preview.
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: f32,
    /// How long the finished selection stays on screen before the window closes.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Scores strictly above this value count as "same content".
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Verbose diagnostics (similarity scores, crop coordinates).
    #[serde(default)]
    pub debug: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            startup_delay_secs: default_startup_delay_secs(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            preview_scale_factor: default_preview_scale_factor(),
            preview_size: None,
            window_title: default_window_title(),
            overlay_alpha: default_overlay_alpha(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            debug: false,
        }
    }
}

impl CaptureConfig {
    /// Only call on a validated config: out-of-range values panic.
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs_f64(self.startup_delay_secs)
    }
}

impl SelectionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl LoggingConfig {
    /// The filter directive handed to the tracing subscriber.
    pub fn effective_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.level
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    /// Like [`Config::load`], but a missing file yields the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scale = self.selection.preview_scale_factor;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "selection.preview_scale_factor must be a positive number, got {scale}"
            )));
        }
        for (name, secs) in [
            ("capture.delay_secs", self.capture.delay_secs),
            ("capture.startup_delay_secs", self.capture.startup_delay_secs),
        ] {
            if let Err(e) = Duration::try_from_secs_f64(secs) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number of seconds, got {secs} ({e})"
                )));
            }
        }
        if self.capture.delay_secs == 0.0 {
            return Err(ConfigError::Invalid(
                "capture.delay_secs must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.selection.overlay_alpha) {
            return Err(ConfigError::Invalid(format!(
                "selection.overlay_alpha must be within [0, 1], got {}",
                self.selection.overlay_alpha
            )));
        }
        if !(-1.0..=1.0).contains(&self.filter.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "filter.similarity_threshold must be within [-1, 1], got {}",
                self.filter.similarity_threshold
            )));
        }
        if let Some([width, height]) = self.selection.preview_size {
            if width == 0 || height == 0 {
                return Err(ConfigError::Invalid(format!(
                    "selection.preview_size must be non-zero, got {width}x{height}"
                )));
            }
        }
        if self.output.directory.trim().is_empty() {
            return Err(ConfigError::Invalid("output.directory must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_output_directory() -> String {
    "Automatically Saved Images".into()
}
fn default_delay_secs() -> f64 {
    1.0
}
fn default_startup_delay_secs() -> f64 {
    2.0
}
fn default_preview_scale_factor() -> f64 {
    0.75
}
fn default_window_title() -> String {
    "Select an area to capture".into()
}
fn default_overlay_alpha() -> f32 {
    0.5
}
fn default_settle_delay_ms() -> u64 {
    500
}
fn default_similarity_threshold() -> f64 {
    0.85
}
fn default_log_level() -> String {
    "info".into()
}

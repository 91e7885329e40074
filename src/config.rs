use crate::palette::Rgb;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SHOW_LABELS: bool = true;
pub const DEFAULT_SHOW_OCTAVE_LINES: bool = true;
pub const DEFAULT_AUDIO_VISUAL_OFFSET: f64 = -0.1;
pub const DEFAULT_VISIBLE_WINDOW_SECONDS: f64 = 3.0;
pub const DEFAULT_OCTAVE_LINE_COLOR: Rgb = Rgb::from_u32(0x444444);
pub const DEFAULT_OCTAVE_LINE_WIDTH: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    pub show_labels: bool,
    pub show_octave_lines: bool,
    /// Shift applied to every note start, in seconds. Negative draws notes early.
    pub audio_visual_offset: f64,
    /// Half-width of the time window that is drawn, in seconds.
    pub visible_window_seconds: f64,
    pub octave_line_color: Rgb,
    pub octave_line_width: f64,
    // Black-key note blocks are narrow; labels there are opt-in.
    pub black_key_note_labels: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_labels: DEFAULT_SHOW_LABELS,
            show_octave_lines: DEFAULT_SHOW_OCTAVE_LINES,
            audio_visual_offset: DEFAULT_AUDIO_VISUAL_OFFSET,
            visible_window_seconds: DEFAULT_VISIBLE_WINDOW_SECONDS,
            octave_line_color: DEFAULT_OCTAVE_LINE_COLOR,
            octave_line_width: DEFAULT_OCTAVE_LINE_WIDTH,
            black_key_note_labels: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("preference store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored preferences are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored preference `{key}` is invalid: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
    #[error("no preference location available")]
    Unavailable,
}

/// The persisted subset of [`RenderConfig`], as a flat JSON object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPreferences {
    show_labels: bool,
    show_octave_lines: bool,
    audio_visual_offset: f64,
    visible_window_seconds: f64,
}

impl StoredPreferences {
    fn from_config(c: &RenderConfig) -> Self {
        Self {
            show_labels: c.show_labels,
            show_octave_lines: c.show_octave_lines,
            audio_visual_offset: c.audio_visual_offset,
            visible_window_seconds: c.visible_window_seconds,
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !self.audio_visual_offset.is_finite() {
            return Err(ConfigError::Invalid {
                key: "audioVisualOffset",
                reason: "must be a finite number",
            });
        }
        if !self.visible_window_seconds.is_finite() || self.visible_window_seconds <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "visibleWindowSeconds",
                reason: "must be a positive number",
            });
        }
        Ok(self)
    }

    fn apply(self, base: RenderConfig) -> RenderConfig {
        RenderConfig {
            show_labels: self.show_labels,
            show_octave_lines: self.show_octave_lines,
            audio_visual_offset: self.audio_visual_offset,
            visible_window_seconds: self.visible_window_seconds,
            ..base
        }
    }
}

pub fn encode_config(config: &RenderConfig) -> Result<String, ConfigError> {
    let prefs = StoredPreferences::from_config(config).validate()?;
    Ok(serde_json::to_string_pretty(&prefs)?)
}

/// Parses and validates stored preferences on top of the defaults.
pub fn decode_config(input: &str) -> Result<RenderConfig, ConfigError> {
    let prefs: StoredPreferences = serde_json::from_str(input)?;
    Ok(prefs.validate()?.apply(RenderConfig::default()))
}

/// Where render preferences live between sessions.
pub trait ConfigRepository {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<RenderConfig>, ConfigError>;
    fn save(&mut self, config: &RenderConfig) -> Result<(), ConfigError>;
}

/// Loads preferences, falling back to defaults on any failure.
///
/// Invalid stored data is overwritten with the defaults so the warning is not repeated
/// on every start.
pub fn load_or_default(repo: &mut dyn ConfigRepository) -> RenderConfig {
    match repo.load() {
        Ok(Some(config)) => config,
        Ok(None) => RenderConfig::default(),
        Err(e @ (ConfigError::Json(_) | ConfigError::Invalid { .. })) => {
            log::warn!("Invalid stored render preferences ({e}); resetting to defaults");
            let defaults = RenderConfig::default();
            if let Err(e) = repo.save(&defaults) {
                log::warn!("Could not reset render preferences: {e}");
            }
            defaults
        }
        Err(e) => {
            log::warn!("Could not read render preferences ({e}); using defaults");
            RenderConfig::default()
        }
    }
}

/// Preferences stored as a JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.json` in the platform config directory, if one can be found.
    pub fn default_location() -> Option<Self> {
        default_settings_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn default_settings_path() -> Option<PathBuf> {
    #[cfg(windows)]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("piano-roll").join("settings.json"));
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("piano-roll").join("settings.json"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("piano-roll").join("settings.json"));
    }

    None
}

impl ConfigRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<RenderConfig>, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => decode_config(&s).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, config: &RenderConfig) -> Result<(), ConfigError> {
        let encoded = encode_config(config)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, encoded)?;
        Ok(())
    }
}

/// Preferences held as serialized JSON in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryRepository {
    stored: Option<String>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            stored: Some(json.into()),
        }
    }

    pub fn stored_json(&self) -> Option<&str> {
        self.stored.as_deref()
    }
}

impl ConfigRepository for MemoryRepository {
    fn load(&self) -> Result<Option<RenderConfig>, ConfigError> {
        self.stored.as_deref().map(decode_config).transpose()
    }

    fn save(&mut self, config: &RenderConfig) -> Result<(), ConfigError> {
        self.stored = Some(encode_config(config)?);
        Ok(())
    }
}

/// Remembers nothing; every session starts from the defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRepository;

impl ConfigRepository for NullRepository {
    fn load(&self) -> Result<Option<RenderConfig>, ConfigError> {
        Ok(None)
    }

    fn save(&mut self, _config: &RenderConfig) -> Result<(), ConfigError> {
        Ok(())
    }
}

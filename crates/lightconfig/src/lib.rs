use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of `config.toml`.
///
/// Every setting is optional; the binary layers CLI flags over these values
/// and falls back to built-in defaults for whatever is left unset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightConfig {
    pub version: u32,
    #[serde(default)]
    pub lightning: ParameterOverrides,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub frame: FrameSettings,
    #[serde(default)]
    pub render: RenderSettings,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            lightning: ParameterOverrides::default(),
            window: WindowSettings::default(),
            frame: FrameSettings::default(),
            render: RenderSettings::default(),
        }
    }
}

/// Shader parameters named the way the uniform block names them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterOverrides {
    pub hue: Option<f32>,
    pub x_offset: Option<f32>,
    pub speed: Option<f32>,
    pub intensity: Option<f32>,
    pub size: Option<f32>,
}

impl ParameterOverrides {
    fn entries(&self) -> [(&'static str, Option<f32>); 5] {
        [
            ("hue", self.hue),
            ("x_offset", self.x_offset),
            ("speed", self.speed),
            ("intensity", self.intensity),
            ("size", self.size),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowSettings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameSettings {
    /// Frame cap; `0` means draw on every display refresh.
    pub fps: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub still_time: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSettings {
    #[serde(default, deserialize_with = "deserialize_antialias_opt")]
    pub antialias: Option<AntialiasSetting>,
    pub color_space: Option<ColorSpaceSetting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples(u32),
}

impl fmt::Display for AntialiasSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AntialiasSetting::Auto => f.write_str("auto"),
            AntialiasSetting::Off => f.write_str("off"),
            AntialiasSetting::Samples(samples) => write!(f, "{samples}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpaceSetting {
    Auto,
    Gamma,
    Linear,
}

impl fmt::Display for ColorSpaceSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpaceSetting::Auto => f.write_str("auto"),
            ColorSpaceSetting::Gamma => f.write_str("gamma"),
            ColorSpaceSetting::Linear => f.write_str("linear"),
        }
    }
}

/// Parses `auto`, `off`, or an MSAA sample count (2, 4, 8, 16).
pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" | "4" | "8" | "16" => normalized
            .parse::<u32>()
            .map(AntialiasSetting::Samples)
            .map_err(|err| err.to_string()),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(parse_antialias(&raw).map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            Some(parse_antialias(&value.to_string()).map_err(de::Error::custom)?)
        }
    };
    Ok(result)
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be finite and non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl LightConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: LightConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads and validates `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Window size when both dimensions are configured.
    pub fn window_size(&self) -> Option<(u32, u32)> {
        Some((self.window.width?, self.window.height?))
    }

    /// Frame cap, with `0` normalised to "no cap".
    pub fn target_fps(&self) -> Option<f32> {
        self.frame.fps.filter(|fps| *fps > 0.0)
    }

    /// Every setting the file assigns, as dotted key and display value.
    pub fn assigned(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (name, value) in self.lightning.entries() {
            if let Some(value) = value {
                out.push((format!("lightning.{name}"), value.to_string()));
            }
        }
        if let Some(width) = self.window.width {
            out.push(("window.width".into(), width.to_string()));
        }
        if let Some(height) = self.window.height {
            out.push(("window.height".into(), height.to_string()));
        }
        if let Some(title) = &self.window.title {
            out.push(("window.title".into(), format!("{title:?}")));
        }
        if let Some(fps) = self.frame.fps {
            out.push(("frame.fps".into(), fps.to_string()));
        }
        if let Some(still_time) = self.frame.still_time {
            out.push((
                "frame.still_time".into(),
                humantime::format_duration(still_time).to_string(),
            ));
        }
        if let Some(antialias) = self.render.antialias {
            out.push(("render.antialias".into(), antialias.to_string()));
        }
        if let Some(color_space) = self.render.color_space {
            out.push(("render.color_space".into(), color_space.to_string()));
        }
        out
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        for (name, value) in self.lightning.entries() {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(ConfigError::Invalid(format!(
                        "lightning.{name} must be a finite number"
                    )));
                }
            }
        }

        for (name, value) in [("width", self.window.width), ("height", self.window.height)] {
            if value == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "window.{name} must be greater than zero"
                )));
            }
        }

        if let Some(title) = &self.window.title {
            if title.trim().is_empty() {
                return Err(ConfigError::Invalid("window.title may not be empty".into()));
            }
        }

        if let Some(fps) = self.frame.fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(ConfigError::Invalid("frame.fps must be >= 0".into()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[lightning]
hue = 180
x_offset = -0.25
speed = 1.5

[window]
width = 1920
height = 1080
title = "Hero"

[frame]
fps = 30
still_time = "1500ms"

[render]
antialias = 4
color_space = "linear"
"#;

    #[test]
    fn parses_sample_config() {
        let config = LightConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert_eq!(config.lightning.hue, Some(180.0));
        assert_eq!(config.lightning.x_offset, Some(-0.25));
        assert_eq!(config.lightning.speed, Some(1.5));
        assert_eq!(config.lightning.intensity, None);
        assert_eq!(config.window_size(), Some((1920, 1080)));
        assert_eq!(config.window.title.as_deref(), Some("Hero"));
        assert_eq!(config.target_fps(), Some(30.0));
        assert_eq!(config.frame.still_time, Some(Duration::from_millis(1500)));
        assert_eq!(config.render.antialias, Some(AntialiasSetting::Samples(4)));
        assert_eq!(config.render.color_space, Some(ColorSpaceSetting::Linear));
    }

    #[test]
    fn minimal_config_leaves_everything_unset() {
        let config = LightConfig::from_toml_str("version = 1").expect("parse config");
        assert_eq!(config, LightConfig::default());
        assert_eq!(config.window_size(), None);
        assert_eq!(config.target_fps(), None);
    }

    #[test]
    fn zero_fps_means_uncapped() {
        let config = LightConfig::from_toml_str("version = 1\n[frame]\nfps = 0\n").unwrap();
        assert_eq!(config.target_fps(), None);
    }

    #[test]
    fn still_time_accepts_plain_seconds() {
        let config =
            LightConfig::from_toml_str("version = 1\n[frame]\nstill_time = 2.5\n").unwrap();
        assert_eq!(config.frame.still_time, Some(Duration::from_secs_f64(2.5)));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = LightConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_window_dimension() {
        let err = LightConfig::from_toml_str("version = 1\n[window]\nwidth = 0\n").unwrap_err();
        assert!(err.to_string().contains("window.width"));
    }

    #[test]
    fn rejects_non_finite_parameter() {
        let err = LightConfig::from_toml_str("version = 1\n[lightning]\nspeed = nan\n").unwrap_err();
        assert!(err.to_string().contains("lightning.speed"));
    }

    #[test]
    fn rejects_negative_fps() {
        let err = LightConfig::from_toml_str("version = 1\n[frame]\nfps = -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = LightConfig::from_toml_str("version = 1\n[lightning]\nhew = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn assigned_lists_every_set_field() {
        let config = LightConfig::from_toml_str(
            r#"
version = 1
[lightning]
speed = 1.5
[window]
height = 480
title = "Hero"
[frame]
fps = 0
still_time = "1500ms"
[render]
antialias = "off"
color_space = "linear"
"#,
        )
        .expect("valid config");

        let assigned = config.assigned();
        let keys: Vec<&str> = assigned.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "lightning.speed",
                "window.height",
                "window.title",
                "frame.fps",
                "frame.still_time",
                "render.antialias",
                "render.color_space",
            ]
        );
        assert!(assigned.contains(&("window.height".into(), "480".into())));
        assert!(assigned.contains(&("window.title".into(), "\"Hero\"".into())));
        assert!(assigned.contains(&("frame.still_time".into(), "1s 500ms".into())));
        assert!(assigned.contains(&("render.antialias".into(), "off".into())));
        assert!(assigned.contains(&("render.color_space".into(), "linear".into())));
    }

    #[test]
    fn assigned_is_empty_for_defaults() {
        assert!(LightConfig::default().assigned().is_empty());
    }

    #[test]
    fn rejects_bad_antialias() {
        let err = LightConfig::from_toml_str("version = 1\n[render]\nantialias = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn parse_antialias_accepts_aliases() {
        assert_eq!(parse_antialias("MAX"), Ok(AntialiasSetting::Auto));
        assert_eq!(parse_antialias(" off "), Ok(AntialiasSetting::Off));
        assert_eq!(parse_antialias("16"), Ok(AntialiasSetting::Samples(16)));
        assert!(parse_antialias("many").is_err());
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = std::env::temp_dir().join("lightconfig-missing-test");
        let config = LightConfig::load(&dir.join("absent.toml")).expect("defaults");
        assert_eq!(config, LightConfig::default());
    }
}

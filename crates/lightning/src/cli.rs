use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use renderer::{Antialiasing, ColorSpaceMode};

#[derive(Parser, Debug)]
#[command(
    name = "lightning",
    author,
    version,
    about = "Animated procedural lightning rendered on the GPU",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Bolt hue in degrees (defaults to 220).
    #[arg(long, value_name = "DEGREES", allow_negative_numbers = true)]
    pub hue: Option<f32>,

    /// Horizontal shift of the bolt in normalised units.
    #[arg(long, value_name = "OFFSET", allow_negative_numbers = true)]
    pub x_offset: Option<f32>,

    /// Multiplier on animation time.
    #[arg(long, value_name = "FACTOR", allow_negative_numbers = true)]
    pub speed: Option<f32>,

    /// Multiplier on output brightness.
    #[arg(long, value_name = "FACTOR", allow_negative_numbers = true)]
    pub intensity: Option<f32>,

    /// Multiplier on the spatial frequency of the noise field.
    #[arg(long, value_name = "FACTOR", allow_negative_numbers = true)]
    pub size: Option<f32>,

    /// Window (or export) size in physical pixels, e.g. `1280x720`.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_resolution)]
    pub resolution: Option<(u32, u32)>,

    /// Optional FPS cap (0 = draw on every display refresh).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Hold a single still frame instead of animating.
    #[arg(long)]
    pub still: bool,

    /// Timestamp to evaluate for still/export modes (`1.5`, `1500ms`, `2s`).
    #[arg(long, value_name = "TIME", value_parser = parse_still_time)]
    pub still_time: Option<f32>,

    /// Render one frame to the given PNG path and exit without opening a window.
    #[arg(long, value_name = "PATH")]
    pub still_export: Option<PathBuf>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<Antialiasing>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpaceMode>,

    /// Window title.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Configuration file to read instead of `config.toml` in the config directory.
    #[arg(long, value_name = "PATH", env = "LIGHTNING_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect the configuration file.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved configuration directory and file.
    Where,
    /// Parse and validate the configuration file.
    Check,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("color space must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" => Ok(ColorSpaceMode::Auto),
        "gamma" | "srgb-off" => Ok(ColorSpaceMode::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceMode::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected auto, gamma, or linear"
        )),
    }
}

pub fn parse_resolution(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("resolution must be greater than zero".into());
    }
    Ok((width, height))
}

/// Accepts plain seconds (`1.5`) or a humantime duration (`1500ms`).
pub fn parse_still_time(value: &str) -> Result<f32, String> {
    let trimmed = value.trim();
    if let Ok(seconds) = trimmed.parse::<f32>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err("still time must be a non-negative number of seconds".into());
        }
        return Ok(seconds);
    }
    humantime::parse_duration(trimmed)
        .map(|duration: Duration| duration.as_secs_f32())
        .map_err(|err| format!("invalid still time '{trimmed}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resolution() {
        assert_eq!(parse_resolution("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_resolution(" 64X32 ").unwrap(), (64, 32));
        assert!(parse_resolution("1280").is_err());
        assert!(parse_resolution("0x720").is_err());
        assert!(parse_resolution("wide x tall").is_err());
    }

    #[test]
    fn parses_antialias_modes() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias("OFF").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("1").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("4").unwrap(), Antialiasing::Samples(4));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("").is_err());
    }

    #[test]
    fn parses_color_space_modes() {
        assert_eq!(parse_color_space("auto").unwrap(), ColorSpaceMode::Auto);
        assert_eq!(parse_color_space("Gamma").unwrap(), ColorSpaceMode::Gamma);
        assert_eq!(parse_color_space("srgb").unwrap(), ColorSpaceMode::Linear);
        assert!(parse_color_space("hdr").is_err());
    }

    #[test]
    fn parses_still_time_forms() {
        assert_eq!(parse_still_time("1.5").unwrap(), 1.5);
        assert_eq!(parse_still_time("1500ms").unwrap(), 1.5);
        assert_eq!(parse_still_time("2s").unwrap(), 2.0);
        assert!(parse_still_time("-1").is_err());
        assert!(parse_still_time("soon").is_err());
    }

    #[test]
    fn cli_accepts_negative_offsets_and_subcommands() {
        let cli = Cli::try_parse_from(["lightning", "--x-offset", "-0.5", "--hue", "90"])
            .expect("parse");
        assert_eq!(cli.run.x_offset, Some(-0.5));
        assert_eq!(cli.run.hue, Some(90.0));
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["lightning", "config", "where"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand {
                action: ConfigAction::Where
            }))
        ));
    }
}

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use lightconfig::{AntialiasSetting, ColorSpaceSetting, LightConfig};
use renderer::{
    Antialiasing, ColorSpaceMode, RenderParameters, RenderPolicy, Renderer, RendererConfig,
};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

pub fn run(args: RunArgs) -> Result<()> {
    let (config_path, config) = load_config(args.config.as_ref())?;
    tracing::debug!(path = %config_path.display(), "resolved lightning configuration");

    let renderer_config = build_renderer_config(&args, &config)?;
    tracing::info!(
        hue = renderer_config.parameters.hue,
        width = renderer_config.surface_size.0,
        height = renderer_config.surface_size.1,
        policy = ?renderer_config.policy,
        "starting lightning"
    );
    Renderer::new(renderer_config).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolves which file to read and loads it.
///
/// An explicit path must exist; the discovered default may be absent.
pub fn load_config(explicit: Option<&PathBuf>) -> Result<(PathBuf, LightConfig)> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file {} does not exist", path.display());
            }
            path.clone()
        }
        None => AppPaths::discover()?.config_file(),
    };
    let config = LightConfig::load(&path)
        .with_context(|| format!("failed to load configuration {}", path.display()))?;
    Ok((path, config))
}

/// Layers CLI flags over the config file over built-in defaults.
pub fn build_renderer_config(args: &RunArgs, config: &LightConfig) -> Result<RendererConfig> {
    let defaults = RendererConfig::default();
    let base = RenderParameters::hero();
    let file = &config.lightning;

    let parameters = RenderParameters {
        hue: args.hue.or(file.hue).unwrap_or(base.hue),
        x_offset: args.x_offset.or(file.x_offset).unwrap_or(base.x_offset),
        speed: args.speed.or(file.speed).unwrap_or(base.speed),
        intensity: args.intensity.or(file.intensity).unwrap_or(base.intensity),
        size: args.size.or(file.size).unwrap_or(base.size),
    };
    parameters
        .validate()
        .context("invalid lightning parameters")?;

    let surface_size = args.resolution.unwrap_or((
        config.window.width.unwrap_or(defaults.surface_size.0),
        config.window.height.unwrap_or(defaults.surface_size.1),
    ));

    let target_fps = match args.fps {
        Some(fps) if !fps.is_finite() || fps < 0.0 => {
            bail!("--fps must be a non-negative number (got {fps})")
        }
        Some(fps) if fps > 0.0 => Some(fps),
        Some(_) => None,
        None => config.target_fps(),
    };

    let still_time = args
        .still_time
        .or_else(|| config.frame.still_time.map(|d| d.as_secs_f32()))
        .unwrap_or(0.0);

    let policy = if let Some(path) = args.still_export.clone() {
        RenderPolicy::Export {
            time: still_time,
            path,
        }
    } else if args.still {
        RenderPolicy::Still { time: still_time }
    } else {
        RenderPolicy::Animate { target_fps }
    };

    let antialiasing = args
        .antialias
        .or(config.render.antialias.map(map_antialias))
        .unwrap_or_default();
    let color_space = args
        .color_space
        .or(config.render.color_space.map(map_color_space))
        .unwrap_or_default();
    let title = args
        .title
        .clone()
        .or_else(|| config.window.title.clone())
        .unwrap_or(defaults.title);

    Ok(RendererConfig {
        surface_size,
        parameters,
        policy,
        antialiasing,
        color_space,
        title,
    })
}

fn map_antialias(setting: AntialiasSetting) -> Antialiasing {
    match setting {
        AntialiasSetting::Auto => Antialiasing::Auto,
        AntialiasSetting::Off => Antialiasing::Off,
        AntialiasSetting::Samples(samples) => Antialiasing::Samples(samples),
    }
}

fn map_color_space(setting: ColorSpaceSetting) -> ColorSpaceMode {
    match setting {
        ColorSpaceSetting::Auto => ColorSpaceMode::Auto,
        ColorSpaceSetting::Gamma => ColorSpaceMode::Gamma,
        ColorSpaceSetting::Linear => ColorSpaceMode::Linear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> LightConfig {
        LightConfig::from_toml_str(toml).expect("valid config")
    }

    #[test]
    fn defaults_use_hero_hue_and_animate() {
        let renderer = build_renderer_config(&RunArgs::default(), &LightConfig::default())
            .expect("config");
        assert_eq!(renderer.parameters, RenderParameters::hero());
        assert_eq!(renderer.parameters.hue, 220.0);
        assert_eq!(renderer.parameters.speed, 1.6);
        assert_eq!(renderer.parameters.intensity, 0.6);
        assert_eq!(renderer.parameters.size, 2.0);
        assert_eq!(renderer.surface_size, (1280, 720));
        assert_eq!(renderer.policy, RenderPolicy::Animate { target_fps: None });
        assert_eq!(renderer.antialiasing, Antialiasing::Off);
        assert_eq!(renderer.color_space, ColorSpaceMode::Auto);
        assert_eq!(renderer.title, "Lightning");
    }

    #[test]
    fn cli_overrides_config_which_overrides_defaults() {
        let file = config(
            r#"
version = 1
[lightning]
hue = 10
speed = 2
[window]
width = 800
title = "From file"
[frame]
fps = 24
[render]
antialias = "off"
color_space = "linear"
"#,
        );
        let args = RunArgs {
            hue: Some(300.0),
            color_space: Some(ColorSpaceMode::Gamma),
            ..RunArgs::default()
        };

        let renderer = build_renderer_config(&args, &file).expect("config");
        assert_eq!(renderer.parameters.hue, 300.0);
        assert_eq!(renderer.parameters.speed, 2.0);
        assert_eq!(renderer.parameters.intensity, 0.6);
        assert_eq!(renderer.surface_size, (800, 720));
        assert_eq!(renderer.title, "From file");
        assert_eq!(
            renderer.policy,
            RenderPolicy::Animate {
                target_fps: Some(24.0)
            }
        );
        assert_eq!(renderer.antialiasing, Antialiasing::Off);
        assert_eq!(renderer.color_space, ColorSpaceMode::Gamma);
    }

    #[test]
    fn zero_fps_flag_uncaps_configured_limit() {
        let file = config("version = 1\n[frame]\nfps = 30\n");
        let args = RunArgs {
            fps: Some(0.0),
            ..RunArgs::default()
        };
        let renderer = build_renderer_config(&args, &file).expect("config");
        assert_eq!(renderer.policy, RenderPolicy::Animate { target_fps: None });
    }

    #[test]
    fn negative_fps_is_rejected() {
        let args = RunArgs {
            fps: Some(-5.0),
            ..RunArgs::default()
        };
        assert!(build_renderer_config(&args, &LightConfig::default()).is_err());
    }

    #[test]
    fn export_takes_priority_over_still() {
        let file = config("version = 1\n[frame]\nstill_time = \"2s\"\n");
        let args = RunArgs {
            still: true,
            still_export: Some(PathBuf::from("out.png")),
            ..RunArgs::default()
        };
        let renderer = build_renderer_config(&args, &file).expect("config");
        assert_eq!(
            renderer.policy,
            RenderPolicy::Export {
                time: 2.0,
                path: PathBuf::from("out.png")
            }
        );
    }

    #[test]
    fn still_uses_cli_time_first() {
        let file = config("version = 1\n[frame]\nstill_time = \"2s\"\n");
        let args = RunArgs {
            still: true,
            still_time: Some(0.5),
            ..RunArgs::default()
        };
        let renderer = build_renderer_config(&args, &file).expect("config");
        assert_eq!(renderer.policy, RenderPolicy::Still { time: 0.5 });
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let args = RunArgs {
            intensity: Some(f32::NAN),
            ..RunArgs::default()
        };
        let err = build_renderer_config(&args, &LightConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("intensity"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing)).is_err());
    }
}

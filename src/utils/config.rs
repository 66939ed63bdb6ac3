use crate::errors::IplResult;
use console::style;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

static DEFAULT_CONFIG_TOML: &str = include_str!("../../default-ipl.conf");

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory listings and graphs are written to.
    pub out_dir: String,

    /// Whether to print per-file status lines to the console or not.
    pub quiet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            quiet: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GraphvizConfig {
    /// The program used to render DOT files.
    pub dot_program: String,

    /// Whether to render PNGs next to the `.gv` files or not.
    pub render_png: bool,
}

impl Default for GraphvizConfig {
    fn default() -> Self {
        Self {
            dot_program: "dot".into(),
            render_png: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub graphviz: GraphvizConfig,
}

impl Config {
    pub fn load(config_dir: &Path) -> IplResult<Self> {
        let mut config = Config::default();

        let default_config_path = config_dir.join("ipl.conf");
        if !default_config_path.exists() {
            create_example_config(config_dir)?;
        }

        let user_config_path = config_dir.join("ipl.local");
        if user_config_path.exists() {
            let user_config_content = fs::read_to_string(&user_config_path)?;
            let user_config: Config = toml::from_str(&user_config_content)?;

            config = merge_configs(config, user_config);

            tracing::debug!(
                "loaded user config from {}",
                style(user_config_path.display()).underlined()
            );
        }

        Ok(config)
    }
}

fn create_example_config(config_dir: &Path) -> IplResult<()> {
    let example_path = config_dir.join("ipl.conf");
    if !example_path.exists() {
        fs::write(&example_path, DEFAULT_CONFIG_TOML)?;
        tracing::debug!("example config created at: {}", example_path.display());
    }
    Ok(())
}

/// Merge user config into default config; every field the user supplies
/// overrides the default.
fn merge_configs(mut default: Config, user: Config) -> Config {
    default.output.out_dir = user.output.out_dir;
    default.output.quiet = user.output.quiet;

    default.graphviz.dot_program = user.graphviz.dot_program;
    default.graphviz.render_png = user.graphviz.render_png;

    default
}

#[test]
fn defaults_point_at_out_and_dot() {
    let cfg = Config::default();
    assert_eq!(cfg.output.out_dir, "out");
    assert_eq!(cfg.graphviz.dot_program, "dot");
    assert!(cfg.graphviz.render_png);
    assert!(!cfg.output.quiet);
}

#[test]
fn load_creates_example_and_reads_user_overrides() {
    let cfg_dir = tempfile::tempdir().unwrap();
    let cfg_path = cfg_dir.path();

    let user_toml = r#"
        [output]
        out_dir = "build/analysis"
        quiet = true

        [graphviz]
        render_png = false
    "#;
    fs::write(cfg_path.join("ipl.local"), user_toml).unwrap();

    let cfg = Config::load(cfg_path).expect("Config::load should succeed");

    assert!(cfg_path.join("ipl.conf").is_file());
    assert_eq!(cfg.output.out_dir, "build/analysis");
    assert!(cfg.output.quiet);
    assert!(!cfg.graphviz.render_png);
    assert_eq!(cfg.graphviz.dot_program, "dot");
}

#[test]
fn embedded_default_config_parses() {
    let cfg: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
    assert_eq!(cfg.output.out_dir, "out");
}

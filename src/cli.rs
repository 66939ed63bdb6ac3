use clap::Parser;

#[derive(Parser)]
#[command(name = "ipl")]
#[command(about = "A static analyzer and control-flow visualizer for the IPL language")]
#[command(version)]
pub struct Cli {
    /// Source files to analyze
    pub(crate) files: Vec<String>,

    /// Override the output directory from the config
    #[arg(long)]
    pub(crate) out_dir: Option<String>,

    /// Skip PNG rendering even if enabled in the config
    #[arg(long)]
    pub(crate) no_render: bool,
}

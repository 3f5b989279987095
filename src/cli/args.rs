use crate::core::types::OutputFormat;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// Pipeline manifest (YAML)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Write the artifact to FILE instead of stdout
    #[arg(long, short, value_name = "FILE", help_heading = "Output Options")]
    pub output: Option<PathBuf>,

    /// Artifact encoding: json or yaml (default from config, else json)
    #[arg(long, value_name = "FORMAT", help_heading = "Output Options")]
    pub format: Option<OutputFormat>,

    /// Path to custom config file (default: {manifest dir}/morphflow.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Pipeline manifest (YAML)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Path to custom config file (default: {manifest dir}/morphflow.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DotArgs {
    /// Pipeline manifest (YAML)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Write the graph to FILE instead of stdout
    #[arg(long, short, value_name = "FILE", help_heading = "Output Options")]
    pub output: Option<PathBuf>,

    /// Path to custom config file (default: {manifest dir}/morphflow.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,
}

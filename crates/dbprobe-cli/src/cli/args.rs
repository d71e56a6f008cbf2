use clap::{Parser, Subcommand};
use dbprobe_core::client::RequestMethod;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dbprobe",
    version,
    about = "Correctness, security and performance probes for SQL-over-HTTP services"
)]
pub struct Cli {
    /// Log filter, e.g. `info` or `dbprobe_core=debug`
    #[arg(long, global = true, env = "DBPROBE_LOG", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run probe groups against a query endpoint
    Run(RunArgs),
    /// Show the catalog
    List(ListArgs),
    /// Write a sample config
    Init(InitArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Query endpoint, e.g. http://localhost:8080/query
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Group key, `all` or `quick`. Repeatable; comma lists accepted.
    #[arg(long = "group", value_delimiter = ',')]
    pub groups: Vec<String>,

    /// Per-statement timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    #[arg(long)]
    pub method: Option<RequestMethod>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the JSON report
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Report filename prefix
    #[arg(long)]
    pub prefix: Option<String>,

    #[arg(long)]
    pub junit: Option<PathBuf>,

    #[arg(long)]
    pub slow_threshold: Option<f64>,

    /// Skip writing the JSON report
    #[arg(long, default_value_t = false)]
    pub no_report: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ListArgs {
    /// Only this group
    #[arg(long)]
    pub group: Option<String>,

    /// Include the config's custom tests
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "text")]
    pub format: String, // text|json
}

#[derive(clap::Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "dbprobe.yaml")]
    pub config: PathBuf,
}

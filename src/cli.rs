use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "kubeapiserver-check")]
#[command(about = "Query the Kubernetes API and report resource fields as compliance evidence")]
pub struct Cli {
    /// Rules file (YAML)
    pub rules_file: PathBuf,

    /// Only run the rule with this id (repeatable)
    #[arg(short = 'r', long = "rule")]
    pub rules: Vec<String>,

    /// Namespace for rules that do not set one
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Context
    #[arg(long)]
    pub context: Option<String>,

    /// API query timeout in seconds (0 disables it)
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

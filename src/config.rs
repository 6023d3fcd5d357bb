use clap::Parser;
use std::path::PathBuf;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "memtime-dashboard")]
#[command(about = "Time tracking dashboard backend for the Memtime API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    // Base URL of the remote API, e.g. "https://api.example.com/v1"
    #[arg(long, env = "MEMTIME_API_URL")]
    pub api_url: String,

    // Bearer token for the remote API
    #[arg(long, env = "MEMTIME_API_KEY", hide_env_values = true)]
    pub api_key: String,

    // How long GET responses are reused, in seconds (0 disables the cache)
    #[arg(short, long, default_value_t = 60)]
    pub cache_ttl: u64,

    // Where the rate limit cooldown survives restarts
    #[arg(long, default_value = ".memtime-dashboard/storage.json")]
    pub storage_file: PathBuf,

    // Keep the cooldown in memory only
    #[arg(long)]
    pub no_persist: bool,

    // env_logger style filter, e.g. "info" or "memtime_dashboard=debug"
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

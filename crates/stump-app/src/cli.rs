use clap::Parser;

/// Stump — voice copilot for building campaigns hands-free.
#[derive(Parser, Debug)]
#[command(name = "stump", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Credential broker URL override.
    #[arg(long)]
    pub broker_url: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

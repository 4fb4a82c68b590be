use clap::Parser;
use std::time::Duration;

/// Count files in one or more emitter sources.
#[derive(Parser, Debug)]
#[command(name = "canopy-count", version, about)]
pub struct Args {
    /// Emitter identifier, e.g. `githubapi://OWNER/REPO?access_token=TOKEN&concurrent=true`.
    #[arg(long, value_name = "URI")]
    pub emitter_uri: String,

    /// Paths to walk, in order. With none, nothing is counted.
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// Give up after this many seconds. Work already in flight finishes first.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub timeout: Option<Duration>,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value.parse().map_err(|_| format!("not a number of seconds: {value}"))?;
    Duration::try_from_secs_f64(seconds).map_err(|err| err.to_string())
}

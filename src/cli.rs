use clap::Parser;
use collector_core::ALL_SUBREDDITS;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "reddit-collector")]
#[command(version)]
#[command(about = "Collect Reddit posts based on a search query.", long_about = None)]
pub struct Args {
    /// The search query for Reddit
    pub query: String,

    /// The subreddit to search in
    #[arg(short, long, default_value = ALL_SUBREDDITS)]
    pub subreddit: String,

    /// The maximum number of posts to fetch
    #[arg(short, long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: u32,

    /// Directory the result file is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

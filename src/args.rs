use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stride-review")]
#[command(about = "STRIDE security review of web pages through a WebDriver-controlled browser")]
#[command(version)]
pub struct Args {
    /// Pages to review
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where the last analysis is persisted (overrides the config file)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Analyze automatically as each page finishes loading
    #[arg(short, long)]
    pub watch: bool,

    /// Print the formatted HTML instead of terminal text
    #[arg(long)]
    pub html: bool,
}

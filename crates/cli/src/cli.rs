use clap::Parser;

/// Run the action assigned to a file by the `.pathaction.yaml` rule files
/// found in its parent directories.
///
/// Rule files closer to the file override the ones above them.
#[derive(Parser, Debug)]
#[command(name = "pathaction", about = "Execute the action assigned to a path")]
pub struct CliArgs {
    /// Paths to the files (or directories) to act on
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<String>,

    /// Execute the action associated with this tag (default: main)
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Confirm before executing the action
    #[arg(short = 'b', long)]
    pub confirm_before: bool,

    /// Ask to run the action again after it finished
    #[arg(short = 'a', long)]
    pub confirm_after: bool,

    /// List the rule files that have been loaded, nearest first
    #[arg(short, long)]
    pub list: bool,

    /// Permanently allow pathaction in the given directory and its subdirectories
    #[arg(short = 'd', long)]
    pub allow_dir: bool,

    /// Path to config file (default: ~/.config/pathaction/config.toml)
    #[arg(long, env = "PATHACTION_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging and debug output
    #[arg(long)]
    pub debug: bool,
}

use super::*;
#[derive(Parser)]
#[command(author, version, about = "Terminal dashboard for the study timer")]
pub(super) struct Cli {
    #[command(flatten)]
    pub(super) global: GlobalArgs,
    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(clap::Args, Default)]
pub(super) struct GlobalArgs {
    #[arg(long, global = true, help = "Path to the config file")]
    pub(super) config: Option<PathBuf>,
    #[arg(long, global = true, help = "Path to the local state file")]
    pub(super) state: Option<PathBuf>,
    #[arg(long, global = true, help = "Device base URL (overrides the config)")]
    pub(super) device_url: Option<String>,
}

#[derive(clap::Subcommand)]
pub(super) enum Commands {
    #[command(about = "Sync the target, then poll the device and show a live dashboard")]
    Watch(WatchArgs),
    #[command(about = "Poll the device once and print the dashboard")]
    Status,
    #[command(about = "Show or change the daily target")]
    Target(TargetArgs),
    #[command(about = "Ask the device to write a log entry now")]
    LogNow,
    #[command(about = "Delete every log entry on the device")]
    ClearLogs(ClearLogsArgs),
    #[command(about = "Merge a CSV file of log rows into the device log")]
    UploadLogs(UploadLogsArgs),
    #[command(about = "Manage config")]
    Config(ConfigArgs),
}

#[derive(Parser)]
pub(super) struct WatchArgs {
    #[arg(long, help = "Seconds between polls (defaults to the config value)")]
    pub(super) interval_seconds: Option<u64>,
}

#[derive(Parser)]
pub(super) struct TargetArgs {
    #[command(subcommand)]
    pub(super) command: TargetCommands,
}

#[derive(clap::Subcommand)]
pub(super) enum TargetCommands {
    #[command(about = "Print the locally stored target")]
    Show,
    #[command(about = "Replace the target")]
    Set(SetTargetArgs),
    #[command(about = "Add minutes to the current target")]
    Add(AddTargetArgs),
    #[command(about = "Adopt the device's target if it can be read")]
    Sync,
}

#[derive(clap::Args)]
#[group(required = true, multiple = true)]
pub(super) struct SetTargetArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub(super) hours: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub(super) minutes: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub(super) secs: Option<String>,
}

#[derive(Parser)]
pub(super) struct AddTargetArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub(super) minutes: String,
}

#[derive(Parser)]
pub(super) struct ClearLogsArgs {
    #[arg(long, help = "Skip the confirmation prompt")]
    pub(super) yes: bool,
}

#[derive(Parser)]
pub(super) struct UploadLogsArgs {
    #[arg(long)]
    pub(super) file: PathBuf,
}

#[derive(Parser)]
pub(super) struct ConfigArgs {
    #[command(subcommand)]
    pub(super) command: ConfigCommands,
}

#[derive(clap::Subcommand)]
pub(super) enum ConfigCommands {
    #[command(about = "Write a config file, keeping values that are not given")]
    Init(InitArgs),
    #[command(about = "Print the effective config")]
    Show,
}

#[derive(Parser)]
pub(super) struct InitArgs {
    #[arg(long)]
    pub(super) poll_interval_seconds: Option<u64>,
    #[arg(long)]
    pub(super) request_timeout_seconds: Option<u64>,
}

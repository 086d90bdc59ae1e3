use super::*;
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    info!(command = command_label(&cli.command), "Running command");

    let global = cli.global;
    match cli.command {
        Commands::Config(args) => handle_config(&global, args),
        Commands::Watch(args) => handle_watch(&load_session(&global)?, args).await,
        Commands::Status => handle_status(&load_session(&global)?).await,
        Commands::Target(args) => handle_target(&load_session(&global)?, args).await,
        Commands::LogNow => handle_log_now(&load_session(&global)?).await,
        Commands::ClearLogs(args) => handle_clear_logs(&load_session(&global)?, args).await,
        Commands::UploadLogs(args) => handle_upload_logs(&load_session(&global)?, args).await,
    }
}

fn command_label(command: &Commands) -> &'static str {
    match command {
        Commands::Watch(_) => "watch",
        Commands::Status => "status",
        Commands::Target(_) => "target",
        Commands::LogNow => "log-now",
        Commands::ClearLogs(_) => "clear-logs",
        Commands::UploadLogs(_) => "upload-logs",
        Commands::Config(_) => "config",
    }
}

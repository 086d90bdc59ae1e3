use super::*;
pub(super) async fn handle_watch(session: &Session, args: WatchArgs) -> anyhow::Result<()> {
    let interval = args
        .interval_seconds
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| session.config.poll_interval());
    let store = session.target_store()?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            interrupt.cancel();
        }
    });
    let commands = spawn_input_reader(cancel.clone());

    println!(
        "Watching {} every {}s. {WATCH_HELP}",
        session.config.device_url,
        interval.as_secs()
    );
    let mut dashboard = SyncLoop::new(store, TerminalDashboard::stdout());
    dashboard.run(interval, cancel, Some(commands)).await;
    Ok(())
}

/// Reads prompt lines on a plain thread; blocking stdin reads do not belong
/// on the runtime. End of input closes the channel but keeps the loop going.
fn spawn_input_reader(cancel: CancellationToken) -> mpsc::UnboundedReceiver<DashboardCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match input::parse_command(&line) {
                Ok(Some(InputCommand::Dashboard(command))) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Ok(Some(InputCommand::Help)) => println!("{WATCH_HELP}"),
                Ok(Some(InputCommand::Quit)) => {
                    cancel.cancel();
                    break;
                }
                Ok(None) => {}
                Err(message) => println!("{message}"),
            }
        }
    });
    rx
}

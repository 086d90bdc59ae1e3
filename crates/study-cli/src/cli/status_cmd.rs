use super::*;
pub(super) async fn handle_status(session: &Session) -> anyhow::Result<()> {
    let mut dashboard = SyncLoop::new(session.target_store()?, TerminalDashboard::stdout());
    match dashboard.poll_once().await {
        PollOutcome::Rendered | PollOutcome::Stale => Ok(()),
        PollOutcome::Failed => anyhow::bail!(
            "could not read data from {}",
            session.config.device_url
        ),
    }
}

use super::*;
pub(super) async fn handle_log_now(session: &Session) -> anyhow::Result<()> {
    let reply = session.connect()?.log_now().await.context("log now")?;
    println!("{}", reply.trim());
    Ok(())
}

pub(super) async fn handle_clear_logs(session: &Session, args: ClearLogsArgs) -> anyhow::Result<()> {
    if !args.yes {
        if !stdin_is_tty() {
            anyhow::bail!("refusing to clear logs without --yes when stdin is not a terminal");
        }
        if !confirm("Delete ALL logs on the device?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }
    let reply = session.connect()?.clear_logs().await.context("clear logs")?;
    warn!(device = %session.config.device_url, "device logs cleared");
    println!("{}", reply.trim());
    Ok(())
}

pub(super) async fn handle_upload_logs(
    session: &Session,
    args: UploadLogsArgs,
) -> anyhow::Result<()> {
    let csv = std::fs::read(&args.file)
        .with_context(|| format!("read {}", args.file.display()))?;
    let bytes = csv.len();
    let reply = session
        .connect()?
        .upload_logs(csv)
        .await
        .context("upload logs")?;
    info!(file = %args.file.display(), bytes, "log csv uploaded");
    println!("{}", reply.trim());
    Ok(())
}

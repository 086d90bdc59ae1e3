use super::*;
pub(super) async fn handle_target(session: &Session, args: TargetArgs) -> anyhow::Result<()> {
    match args.command {
        TargetCommands::Show => show_target(session),
        TargetCommands::Set(args) => {
            let secs = input::target_seconds(
                args.hours.as_deref(),
                args.minutes.as_deref(),
                args.secs.as_deref(),
            );
            let target = session.target_store()?.set_target(secs).await?;
            println!("Target set to {target}");
            Ok(())
        }
        TargetCommands::Add(args) => {
            let delta = input::lenient_int(&args.minutes).saturating_mul(60);
            let target = session.target_store()?.add_preset(delta).await?;
            println!("Target set to {target}");
            Ok(())
        }
        TargetCommands::Sync => {
            let store = session.target_store()?;
            match store.sync_from_device().await? {
                Reconciliation::AdoptDevice(target) => println!("Adopted device target {target}"),
                Reconciliation::KeepLocal => {
                    println!("Device target unavailable; keeping {}", store.get_target())
                }
            }
            Ok(())
        }
    }
}

fn show_target(session: &Session) -> anyhow::Result<()> {
    let record = session.record();
    let state = record
        .load()
        .with_context(|| format!("read state {}", record.path().display()))?;
    println!("Target: {}", state.target.unwrap_or(TargetDuration::NOT_SET));
    if let Some(source) = state.target_source {
        println!("Source: {source}");
    }
    if let Some(updated_at) = &state.target_updated_at {
        println!("Updated: {updated_at}");
    }
    println!("State file: {}", record.path().display());
    Ok(())
}

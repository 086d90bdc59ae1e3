use super::*;
pub(super) fn handle_config(global: &GlobalArgs, args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Init(args) => handle_init(global, args),
        ConfigCommands::Show => handle_show(global),
    }
}

pub(super) fn handle_init(global: &GlobalArgs, args: InitArgs) -> anyhow::Result<()> {
    let Session {
        config_path,
        mut config,
        ..
    } = load_session(global)?;
    if let Some(secs) = args.poll_interval_seconds {
        config.poll_interval_seconds = secs;
    }
    if let Some(secs) = args.request_timeout_seconds {
        config.request_timeout_seconds = secs;
    }
    if let Some(state) = &global.state {
        config.state_path = Some(state.clone());
    }
    config.save(&config_path)?;
    println!("Config saved to {}", config_path.display());
    Ok(())
}

fn handle_show(global: &GlobalArgs) -> anyhow::Result<()> {
    let session = load_session(global)?;
    println!("{}", serde_json::to_string_pretty(&session.config)?);
    println!("Config file: {}", session.config_path.display());
    println!("State file: {}", session.state_path.display());
    Ok(())
}

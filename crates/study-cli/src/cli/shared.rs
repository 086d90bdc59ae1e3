use super::*;

/// Config, overrides and file locations resolved for one invocation.
pub(in crate::cli) struct Session {
    pub(in crate::cli) config_path: PathBuf,
    pub(in crate::cli) config: AppConfig,
    pub(in crate::cli) state_path: PathBuf,
}

pub(in crate::cli) fn load_session(global: &GlobalArgs) -> anyhow::Result<Session> {
    let config_path = match &global.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = AppConfig::load(&config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    if let Some(url) = &global.device_url {
        config.device_url = url.clone();
    }
    let state_path = match &global.state {
        Some(path) => path.clone(),
        None => config.resolve_state_path()?,
    };
    Ok(Session {
        config_path,
        config,
        state_path,
    })
}

impl Session {
    pub(in crate::cli) fn connect(&self) -> anyhow::Result<Arc<dyn DeviceApi>> {
        let device = HttpDevice::new(&self.config.device_url, self.config.request_timeout())
            .with_context(|| format!("device url {}", self.config.device_url))?;
        info!(device = %device.base_url(), "using device");
        let device: Arc<dyn DeviceApi> = Arc::new(device);
        Ok(device)
    }

    pub(in crate::cli) fn record(&self) -> TargetRecord {
        TargetRecord::new(&self.state_path)
    }

    pub(in crate::cli) fn target_store(&self) -> anyhow::Result<TargetStore> {
        Ok(TargetStore::new(self.connect()?, self.record())
            .with_device_timeout(self.config.request_timeout()))
    }
}

pub(in crate::cli) fn stdin_is_tty() -> bool {
    io::stdin().is_terminal()
}

pub(in crate::cli) fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} (y/n): ");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

use crate::input::{self, InputCommand, WATCH_HELP};
use crate::render::TerminalDashboard;
use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use study_core::config::{AppConfig, default_config_path};
use study_core::device::DeviceApi;
use study_core::model::TargetDuration;
use study_core::state::TargetRecord;
use study_core::sync_loop::{DashboardCommand, PollOutcome, SyncLoop};
use study_core::target_store::{Reconciliation, TargetStore};
use study_device::HttpDevice;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod app;
mod args;
mod config_cmd;
mod logs_cmd;
mod shared;
mod status_cmd;
mod target_cmd;
mod watch_cmd;

use args::*;

use config_cmd::handle_config;
use logs_cmd::{handle_clear_logs, handle_log_now, handle_upload_logs};
use shared::{Session, confirm, load_session, stdin_is_tty};
use status_cmd::handle_status;
use target_cmd::handle_target;
use watch_cmd::handle_watch;

pub async fn run() -> anyhow::Result<()> {
    app::run().await
}

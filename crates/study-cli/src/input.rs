use study_core::sync_loop::DashboardCommand;

pub const WATCH_HELP: &str = "commands: set <hours> [minutes] | +<minutes> | log | refresh | help | quit";

#[derive(Debug, Eq, PartialEq)]
pub enum InputCommand {
    Dashboard(DashboardCommand),
    Help,
    Quit,
}

/// Leading integer of `text`, like a form field read as a number.
/// Anything without leading digits counts as 0.
pub fn lenient_int(text: &str) -> i64 {
    let text = text.trim();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(|b| b.is_ascii_digit()) {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(byte - b'0'));
    }
    if negative { -value } else { value }
}

/// Target seconds from the hours/minutes/seconds fields of an edit.
pub fn target_seconds(hours: Option<&str>, minutes: Option<&str>, secs: Option<&str>) -> i64 {
    let field = |value: Option<&str>| value.map(lenient_int).unwrap_or(0);
    field(hours)
        .saturating_mul(3600)
        .saturating_add(field(minutes).saturating_mul(60))
        .saturating_add(field(secs))
}

pub fn parse_command(line: &str) -> Result<Option<InputCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if let Some(minutes) = line.strip_prefix('+') {
        let delta = lenient_int(minutes).saturating_mul(60);
        return Ok(Some(InputCommand::Dashboard(DashboardCommand::AddPreset(
            delta,
        ))));
    }
    let mut words = line.split_whitespace();
    let command = match words.next().unwrap_or_default() {
        "q" | "quit" | "exit" => InputCommand::Quit,
        "h" | "help" | "?" => InputCommand::Help,
        "r" | "refresh" => InputCommand::Dashboard(DashboardCommand::Refresh),
        "l" | "log" => InputCommand::Dashboard(DashboardCommand::LogNow),
        "set" => {
            let hours = words.next();
            let minutes = words.next();
            if hours.is_none() {
                return Err("usage: set <hours> [minutes]".to_string());
            }
            InputCommand::Dashboard(DashboardCommand::SetTarget(target_seconds(
                hours, minutes, None,
            )))
        }
        other => return Err(format!("unknown command '{other}'; {WATCH_HELP}")),
    };
    Ok(Some(command))
}

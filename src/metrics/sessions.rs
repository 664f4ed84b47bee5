//! Active login sessions from the utmp database.

use chrono::{DateTime, Utc};
use std::path::Path;

use crate::error::Result;
use crate::metrics::data::UserInfo;

pub const UTMP_PATH: &str = "/var/run/utmp";

/// One session, normalized from whatever the platform record holds.
pub fn session(user: &str, tty: &str, host: &str, login_secs: i64) -> UserInfo {
    let host = host.trim();
    UserInfo {
        name: user.trim().to_string(),
        tty: tty.trim().to_string(),
        host: (!host.is_empty()).then(|| host.to_string()),
        login_at: DateTime::<Utc>::from_timestamp(login_secs, 0),
    }
}

/// Logged-in users, oldest login first. A missing database means nobody is
/// logged in.
#[cfg(target_os = "linux")]
pub fn read_sessions(path: &Path) -> Result<Vec<UserInfo>> {
    use crate::error::MonitorError;
    use crate::metrics::MetricCategory;
    use utmp_rs::UtmpEntry;

    if !path.exists() {
        return Ok(Vec::new());
    }

    let entries = utmp_rs::parse_from_path(path).map_err(|e| {
        MonitorError::provider(
            MetricCategory::Users,
            format!("cannot read {}: {}", path.display(), e),
        )
    })?;

    let mut sessions: Vec<UserInfo> = entries
        .iter()
        .filter_map(|entry| match entry {
            UtmpEntry::UserProcess {
                user,
                line,
                host,
                time,
                ..
            } => Some(session(user, line, host, time.unix_timestamp())),
            _ => None,
        })
        .collect();
    sessions.sort_by(|a, b| a.login_at.cmp(&b.login_at).then_with(|| a.tty.cmp(&b.tty)));
    Ok(sessions)
}

#[cfg(not(target_os = "linux"))]
pub fn read_sessions(_path: &Path) -> Result<Vec<UserInfo>> {
    Ok(Vec::new())
}

use chrono::Duration;

use crate::db::entities::monitor;

/// Formats a duration the way the alert texts show it: `42s`, `5m 3s`, `2h 10m`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

pub fn render_alert(monitor: &monitor::Model, last_seen: Duration) -> String {
    format!(
        "🔴 *ALERT: {} ({}) is DOWN*\nLast seen: {} ago\nTimeout: {}s\nMessage: {}",
        monitor.monitor_name,
        monitor.check_type,
        format_duration(last_seen),
        monitor.timeout,
        monitor.message
    )
}

pub fn render_re_alert(monitor: &monitor::Model, down_for: Duration) -> String {
    format!(
        "🔴 *RE-ALERT: {} ({}) still DOWN*\nDown for: {}\nMessage: {}",
        monitor.monitor_name,
        monitor.check_type,
        format_duration(down_for),
        monitor.message
    )
}

pub fn render_recovered(monitor: &monitor::Model, downtime: Duration) -> String {
    format!(
        "🟢 *RECOVERED: {} ({}) is back UP*\nWas down for: {}",
        monitor.monitor_name,
        monitor.check_type,
        format_duration(downtime)
    )
}

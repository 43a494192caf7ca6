use acmd_core::{AgentStatus, LogKind};
use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(56, 189, 248))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(30, 64, 175))
    .fg(Color::White)
    .add_modifier(Modifier::BOLD);
pub const MUTED: Color = Color::Rgb(148, 163, 184);
pub const ACCENT: Color = Color::Rgb(56, 189, 248);
pub const BORDER: Color = Color::Rgb(71, 85, 105);

pub fn zebra_row_style(index: usize) -> Style {
    let bg = if index % 2 == 0 {
        Color::Rgb(11, 18, 32)
    } else {
        Color::Rgb(17, 26, 46)
    };
    Style::new().bg(bg)
}

/// Stable color per tag so the same tag reads the same everywhere.
pub fn tag_badge_style(tag: &str) -> Style {
    let palette = [
        Color::Rgb(56, 189, 248),
        Color::Rgb(129, 140, 248),
        Color::Rgb(167, 139, 250),
        Color::Rgb(244, 114, 182),
        Color::Rgb(52, 211, 153),
        Color::Rgb(250, 204, 21),
        Color::Rgb(251, 146, 60),
        Color::Rgb(45, 212, 191),
    ];
    let mut hash: u64 = 1469598103934665603;
    for b in tag.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    let color = palette[(hash as usize) % palette.len()];
    Style::new().fg(color)
}

pub mod icons {
    pub const BUSY: &str = ">";
    pub const IDLE: &str = ".";
    pub const ERROR: &str = "!";
    pub const OFFLINE: &str = "x";
    pub const SELECTED: &str = "[*]";
    pub const UNSELECTED: &str = "[ ]";
    pub const OPEN: &str = "*";
}

pub fn status_icon(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Busy => icons::BUSY,
        AgentStatus::Idle => icons::IDLE,
        AgentStatus::Error => icons::ERROR,
        AgentStatus::Offline => icons::OFFLINE,
    }
}

pub fn status_color(status: AgentStatus) -> Color {
    match status {
        AgentStatus::Busy => Color::Rgb(34, 197, 94),
        AgentStatus::Idle => Color::Rgb(59, 130, 246),
        AgentStatus::Error => Color::Rgb(239, 68, 68),
        AgentStatus::Offline => Color::Rgb(100, 116, 139),
    }
}

pub fn log_kind_color(kind: LogKind) -> Color {
    match kind {
        LogKind::Info => Color::Rgb(59, 130, 246),
        LogKind::Warning => Color::Rgb(245, 158, 11),
        LogKind::Error => Color::Rgb(239, 68, 68),
        LogKind::Success => Color::Rgb(34, 197, 94),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_colors_are_stable() {
        assert_eq!(tag_badge_style("core"), tag_badge_style("core"));
    }

    #[test]
    fn every_status_has_distinct_icon() {
        let mut icons: Vec<&str> = AgentStatus::ALL.iter().map(|s| status_icon(*s)).collect();
        icons.sort_unstable();
        icons.dedup();
        assert_eq!(icons.len(), AgentStatus::ALL.len());
    }
}

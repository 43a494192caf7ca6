use crate::state::{App, InputMode, Mode};
use crate::theme::{self, icons};
use acmd_core::{InferenceOutput, InferenceSlot, LogFeed};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, layout[0]);
    match app.mode {
        Mode::Dashboard => render_dashboard(f, app, layout[1]),
        Mode::Agents => render_agents(f, app, layout[1]),
        Mode::Live => render_feed(f, &app.feed, layout[1]),
        Mode::Intelligence => render_intelligence(f, app, layout[1]),
    }
    render_footer(f, app, layout[2]);

    if app.show_help {
        render_help(f, centered_rect(60, 70, area));
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let stats = app.stats();
    let mut tabs = Vec::new();
    for (index, mode) in [Mode::Dashboard, Mode::Agents, Mode::Live, Mode::Intelligence]
        .into_iter()
        .enumerate()
    {
        let style = if mode == app.mode {
            theme::HEADER_STYLE.add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(theme::MUTED)
        };
        tabs.push(Span::styled(format!(" {} {} ", index + 1, mode.title()), style));
        tabs.push(Span::raw(" "));
    }

    let kpis = Line::from(vec![
        Span::styled("active ", Style::default().fg(theme::MUTED)),
        Span::styled(stats.active_label(), theme::HEADER_STYLE),
        Span::styled("  tokens ", Style::default().fg(theme::MUTED)),
        Span::styled(stats.tokens_label(), theme::HEADER_STYLE),
        Span::styled("  error rate ", Style::default().fg(theme::MUTED)),
        Span::styled(
            stats.error_rate_label(),
            Style::default().fg(if stats.errored > 0 {
                Color::Rgb(239, 68, 68)
            } else {
                Color::Rgb(34, 197, 94)
            }),
        ),
        Span::styled("  offline ", Style::default().fg(theme::MUTED)),
        Span::raw(stats.offline.to_string()),
        Span::styled("  selected ", Style::default().fg(theme::MUTED)),
        Span::raw(app.selection.len().to_string()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme::BORDER));
    let header = Paragraph::new(vec![Line::from(tabs), kpis]).block(block);
    f.render_widget(header, area);
}

fn render_dashboard(f: &mut Frame, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    render_roster(f, app, columns[0]);
    if app.detail.is_open() {
        render_details(f, app, columns[1]);
    } else {
        render_feed(f, &app.feed, columns[1]);
    }
}

fn render_agents(f: &mut Frame, app: &mut App, area: Rect) {
    if app.detail.is_open() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        render_roster(f, app, columns[0]);
        render_details(f, app, columns[1]);
    } else {
        render_roster(f, app, area);
    }
}

fn render_roster(f: &mut Frame, app: &mut App, area: Rect) {
    let mut title = format!("Agents ({}) sort: {}", app.view_ids.len(), app.query.sort.label());
    if !app.query.search.is_empty() {
        title.push_str(&format!("  filter: \"{}\"", app.query.search));
    }

    let open_id = app.detail.open_id();
    let rows: Vec<Row> = app
        .visible_agents()
        .into_iter()
        .enumerate()
        .map(|(index, agent)| {
            let marker = if app.selection.contains(&agent.id) {
                icons::SELECTED
            } else {
                icons::UNSELECTED
            };
            let mut name_spans = Vec::new();
            if open_id == Some(agent.id.as_str()) {
                name_spans.push(Span::styled(format!("{} ", icons::OPEN), theme::ACCENT));
            }
            name_spans.push(Span::raw(agent.name.clone()));

            let mut tag_spans = Vec::new();
            for tag in &agent.tags {
                tag_spans.push(Span::styled(format!("#{tag} "), theme::tag_badge_style(tag)));
            }

            let color = theme::status_color(agent.status);
            Row::new(vec![
                Cell::from(marker),
                Cell::from(agent.id.clone()),
                Cell::from(Span::styled(
                    format!("{} {}", theme::status_icon(agent.status), agent.status),
                    color,
                )),
                Cell::from(Line::from(name_spans)),
                Cell::from(agent.role.clone()),
                Cell::from(agent.tokens_used.to_string()),
                Cell::from(agent.uptime.clone()),
                Cell::from(Line::from(tag_spans)),
            ])
            .style(theme::zebra_row_style(index))
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Min(16),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Min(8),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(theme::BORDER));

    if rows.is_empty() {
        let message = Paragraph::new(Line::from(Span::styled(
            "No agents match the current filter.",
            Color::Yellow,
        )))
        .block(block);
        f.render_widget(message, area);
        return;
    }

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["", "ID", "Status", "Name", "Role", "Tokens", "Uptime", "Tags"])
                .style(theme::HEADER_STYLE),
        )
        .block(block)
        .highlight_style(theme::SELECTED_STYLE);

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_details(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Details")
        .border_style(Style::default().fg(theme::ACCENT));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(agent) = app.detail.record(&app.registry) else {
        let text = Paragraph::new("Agent no longer in roster. Esc to close.");
        f.render_widget(text, inner);
        return;
    };
    let status = app
        .detail
        .displayed_status(&app.registry)
        .unwrap_or(agent.status);
    let label = |text: &str| Span::styled(format!("{text:<15}"), Style::default().fg(theme::MUTED));

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{}  {}", agent.id, agent.name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            label("Status"),
            Span::styled(status.as_str(), theme::status_color(status)),
        ]),
        Line::from(vec![label("Role"), Span::raw(agent.role.clone())]),
        Line::from(vec![
            label("Specialization"),
            Span::raw(agent.specialization.clone()),
        ]),
        Line::from(vec![label("Tokens"), Span::raw(agent.tokens_used.to_string())]),
        Line::from(vec![label("Uptime"), Span::raw(agent.uptime.clone())]),
    ];
    let mut tags = vec![label("Tags")];
    for tag in &agent.tags {
        tags.push(Span::styled(format!("#{tag} "), theme::tag_badge_style(tag)));
    }
    lines.push(Line::from(tags));
    if !agent.description.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(agent.description.clone()));
    }

    lines.push(Line::from(""));
    let subject = app.detail_subject.as_deref().unwrap_or("-");
    lines.push(Line::from(Span::styled(
        format!("Reasoning ({subject})"),
        theme::HEADER_STYLE,
    )));
    push_inference_lines(&mut lines, &app.detail_inference, "a analyze  p grounded report");

    let p = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(p, inner);
}

fn render_feed(f: &mut Frame, feed: &LogFeed, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Live feed ({}/{})", feed.len(), feed.capacity()))
        .border_style(Style::default().fg(theme::BORDER));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<Line> = feed
        .entries()
        .rev()
        .take(inner.height as usize)
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp),
                    Style::default().fg(theme::MUTED),
                ),
                Span::styled(
                    format!("{:<7} ", entry.kind.as_str()),
                    theme::log_kind_color(entry.kind),
                ),
                Span::styled(format!("{:<8} ", entry.agent_id), theme::ACCENT),
                Span::raw(entry.message.clone()),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn render_intelligence(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Intelligence")
        .border_style(Style::default().fg(theme::ACCENT));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    if let Some(question) = &app.last_question {
        lines.push(Line::from(vec![
            Span::styled("> ", theme::ACCENT),
            Span::styled(question.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Line::from(""));
    }
    push_inference_lines(&mut lines, &app.insight, "i to ask the reasoning service");
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn push_inference_lines(lines: &mut Vec<Line<'static>>, slot: &InferenceSlot, hint: &'static str) {
    if slot.in_flight() {
        lines.push(Line::from(Span::styled(
            "thinking...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )));
        return;
    }
    match slot.output() {
        Some(output) => push_output_lines(lines, output),
        None => lines.push(Line::from(Span::styled(hint, Style::default().fg(theme::MUTED)))),
    }
}

fn push_output_lines(lines: &mut Vec<Line<'static>>, output: &InferenceOutput) {
    let style = if output.failed {
        Style::default().fg(Color::Rgb(239, 68, 68))
    } else {
        Style::default()
    };
    for text in output.text.lines() {
        lines.push(Line::from(Span::styled(text.to_string(), style)));
    }
    if !output.sources.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Sources", theme::HEADER_STYLE)));
        for source in &output.sources {
            let title = source.title.clone().unwrap_or_else(|| source.uri.clone());
            lines.push(Line::from(vec![
                Span::raw(format!("- {title} ")),
                Span::styled(source.uri.clone(), Style::default().fg(theme::MUTED)),
            ]));
        }
    }
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let line = if app.input_mode != InputMode::Normal {
        Line::from(vec![
            Span::styled(format!("{}: ", app.input_mode.prompt()), theme::HEADER_STYLE),
            Span::raw(app.input.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    } else if let Some(note) = &app.status_note {
        Line::from(Span::styled(note.clone(), Style::default().fg(Color::Yellow)))
    } else {
        Line::from(Span::styled(
            "? help  q quit  Tab mode  / search  Space select  B/X/R bulk",
            Style::default().fg(theme::MUTED),
        ))
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let keys = [
        ("j / Down", "Next agent"),
        ("k / Up", "Previous agent"),
        ("Tab / 1-4", "Switch view"),
        ("Enter", "Open/close details"),
        ("Esc", "Close details or clear filter"),
        ("/", "Search name, role, specialization, tags"),
        ("s", "Cycle sort (name/usage/uptime)"),
        ("Space", "Toggle selection"),
        ("c", "Clear selection"),
        ("B / X / R", "Bulk start / stop / reset"),
        ("g / x", "Start / stop agent"),
        ("e / o", "Mark error / offline"),
        ("r", "Reset agent"),
        ("t / T", "Add / remove tag"),
        ("a", "Analyze agent"),
        ("p", "Grounded report"),
        ("i", "Ask the reasoning service"),
        ("?", "Toggle help"),
        ("q", "Quit"),
    ];
    let mut text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (key, action) in keys {
        text.push(Line::from(vec![
            Span::styled(format!("{key:<11}"), Color::Cyan),
            Span::raw(action),
        ]));
    }
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

use crate::reasoning::{JobTarget, ReasoningJob, ReasoningOutcome};
use acmd_core::{
    bulk, normalize_tag, AgentRecord, AgentStatus, BulkAction, DetailView, FleetStats,
    InferenceSlot, LogEntry, LogFeed, LogKind, ReasoningError, ReasoningRequest, Registry,
    Selection, SortKey, ViewQuery,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const CONSOLE_SOURCE: &str = "CONSOLE";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Dashboard,
    Agents,
    Live,
    Intelligence,
}

impl Mode {
    pub fn title(self) -> &'static str {
        match self {
            Mode::Dashboard => "Dashboard",
            Mode::Agents => "Agents",
            Mode::Live => "Live",
            Mode::Intelligence => "Intelligence",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Mode::Dashboard => Mode::Agents,
            Mode::Agents => Mode::Live,
            Mode::Live => Mode::Intelligence,
            Mode::Intelligence => Mode::Dashboard,
        }
    }

    /// Per-agent keys only apply where the roster and detail pane are on screen.
    pub fn shows_roster(self) -> bool {
        matches!(self, Mode::Dashboard | Mode::Agents)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    AddTag,
    RemoveTag,
    Query,
}

impl InputMode {
    pub fn prompt(self) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::Search => "search",
            InputMode::AddTag => "add tag",
            InputMode::RemoveTag => "remove tag",
            InputMode::Query => "ask",
        }
    }
}

pub struct App {
    pub registry: Registry,
    pub selection: Selection,
    pub detail: DetailView,
    pub feed: LogFeed,
    pub query: ViewQuery,
    pub mode: Mode,
    pub input_mode: InputMode,
    pub input: String,
    pub table_state: TableState,
    pub view_ids: Vec<String>,
    pub insight: InferenceSlot,
    pub last_question: Option<String>,
    pub detail_inference: InferenceSlot,
    pub detail_subject: Option<String>,
    pub status_note: Option<String>,
    pub show_help: bool,
    should_quit: bool,
    metrics_tick: u64,
    jobs: mpsc::Sender<ReasoningJob>,
}

impl App {
    pub fn new(registry: Registry, feed: LogFeed, jobs: mpsc::Sender<ReasoningJob>) -> Self {
        let mut app = Self {
            registry,
            selection: Selection::new(),
            detail: DetailView::new(),
            feed,
            query: ViewQuery::default(),
            mode: Mode::Dashboard,
            input_mode: InputMode::Normal,
            input: String::new(),
            table_state: TableState::default(),
            view_ids: Vec::new(),
            insight: InferenceSlot::default(),
            last_question: None,
            detail_inference: InferenceSlot::default(),
            detail_subject: None,
            status_note: None,
            show_help: false,
            should_quit: false,
            metrics_tick: 0,
            jobs,
        };
        app.recalc_view();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn stats(&self) -> FleetStats {
        FleetStats::from_agents(self.registry.agents())
    }

    /// Rebuilds the visible id list from the registry and keeps the cursor on the same agent.
    pub fn recalc_view(&mut self) {
        let current = self.cursor_id().map(str::to_string);
        self.view_ids = self
            .query
            .apply(self.registry.agents())
            .into_iter()
            .map(|agent| agent.id.clone())
            .collect();
        self.restore_cursor(current.as_deref());
    }

    fn restore_cursor(&mut self, id: Option<&str>) {
        if self.view_ids.is_empty() {
            self.table_state.select(None);
            return;
        }
        let position = id
            .and_then(|id| self.view_ids.iter().position(|candidate| candidate == id))
            .or_else(|| {
                self.table_state
                    .selected()
                    .map(|index| index.min(self.view_ids.len() - 1))
            })
            .unwrap_or(0);
        self.table_state.select(Some(position));
    }

    pub fn visible_agents(&self) -> Vec<&AgentRecord> {
        self.view_ids
            .iter()
            .filter_map(|id| self.registry.find(id))
            .collect()
    }

    pub fn cursor_id(&self) -> Option<&str> {
        self.table_state
            .selected()
            .and_then(|index| self.view_ids.get(index))
            .map(String::as_str)
    }

    /// The open detail agent, or the one under the cursor.
    fn target_id(&self) -> Option<String> {
        self.detail
            .open_id()
            .or_else(|| self.cursor_id())
            .map(str::to_string)
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.view_ids.is_empty() {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let len = self.view_ids.len() as isize;
        let mut next = current + delta;
        if next < 0 {
            next = len - 1;
        }
        if next >= len {
            next = 0;
        }
        self.table_state.select(Some(next as usize));
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.input_mode != InputMode::Normal {
            self.handle_input_key(key);
            return;
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.mode = self.mode.next(),
            KeyCode::Char('1') => self.mode = Mode::Dashboard,
            KeyCode::Char('2') => self.mode = Mode::Agents,
            KeyCode::Char('3') => self.mode = Mode::Live,
            KeyCode::Char('4') => self.mode = Mode::Intelligence,
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Enter
            | KeyCode::Char(' ' | 'g' | 'x' | 'e' | 'o' | 'r' | 't' | 'T' | 'a' | 'p')
                if !self.mode.shows_roster() =>
            {
                self.status_note = Some(format!("no agent in view on {}", self.mode.title()));
            }
            KeyCode::Enter => self.toggle_detail(),
            KeyCode::Esc => {
                if self.detail.is_open() {
                    self.detail.close();
                } else if !self.query.search.is_empty() {
                    self.query.search.clear();
                    self.recalc_view();
                }
            }
            KeyCode::Char('/') => self.begin_input(InputMode::Search),
            KeyCode::Char('s') => {
                self.query.sort = self.query.sort.next();
                self.recalc_view();
                self.status_note = Some(format!("sort: {}", self.query.sort.label()));
            }
            KeyCode::Char(' ') => self.toggle_selection(),
            KeyCode::Char('c') => {
                self.selection.clear();
                self.status_note = Some("selection cleared".to_string());
            }
            KeyCode::Char('B') => self.apply_bulk(BulkAction::Start),
            KeyCode::Char('X') => self.apply_bulk(BulkAction::Stop),
            KeyCode::Char('R') => self.apply_bulk(BulkAction::Reset),
            KeyCode::Char('g') => self.set_target_status(AgentStatus::Busy),
            KeyCode::Char('x') => self.set_target_status(AgentStatus::Idle),
            KeyCode::Char('e') => self.set_target_status(AgentStatus::Error),
            KeyCode::Char('o') => self.set_target_status(AgentStatus::Offline),
            KeyCode::Char('r') => self.reset_target(),
            KeyCode::Char('t') => self.begin_input(InputMode::AddTag),
            KeyCode::Char('T') => self.begin_input(InputMode::RemoveTag),
            KeyCode::Char('a') => self.request_analysis(),
            KeyCode::Char('p') => self.request_report(),
            KeyCode::Char('i') => {
                self.mode = Mode::Intelligence;
                self.begin_input(InputMode::Query);
            }
            _ => {}
        }
    }

    fn begin_input(&mut self, mode: InputMode) {
        if matches!(mode, InputMode::AddTag | InputMode::RemoveTag) && self.target_id().is_none()
        {
            self.status_note = Some("no agent under cursor".to_string());
            return;
        }
        self.input_mode = mode;
        self.input = if mode == InputMode::Search {
            self.query.search.clone()
        } else {
            String::new()
        };
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if self.input_mode == InputMode::Search {
                    self.query.search.clear();
                    self.recalc_view();
                }
                self.input_mode = InputMode::Normal;
                self.input.clear();
            }
            KeyCode::Enter => {
                let mode = self.input_mode;
                let text = std::mem::take(&mut self.input);
                self.input_mode = InputMode::Normal;
                self.commit_input(mode, text);
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.sync_search();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.sync_search();
            }
            _ => {}
        }
    }

    fn sync_search(&mut self) {
        if self.input_mode == InputMode::Search {
            self.query.search = self.input.clone();
            self.recalc_view();
        }
    }

    fn commit_input(&mut self, mode: InputMode, text: String) {
        match mode {
            InputMode::Normal | InputMode::Search => {}
            InputMode::AddTag => self.edit_tag(&text, true),
            InputMode::RemoveTag => self.edit_tag(&text, false),
            InputMode::Query => self.submit_query(text),
        }
    }

    fn toggle_detail(&mut self) {
        let Some(cursor) = self.cursor_id().map(str::to_string) else {
            return;
        };
        if self.detail.open_id() == Some(cursor.as_str()) {
            self.detail.close();
        } else {
            self.open_detail(&cursor);
        }
    }

    /// Points the detail view at `id`. Reasoning output about another agent is dropped
    /// unless a request is still running; that result is shown when it lands.
    fn open_detail(&mut self, id: &str) {
        self.detail.open(id, &self.registry);
        if !self.detail_inference.in_flight() && self.detail_subject.as_deref() != Some(id) {
            self.detail_inference.clear_output();
            self.detail_subject = None;
        }
    }

    fn toggle_selection(&mut self) {
        let Some(id) = self.cursor_id().map(str::to_string) else {
            return;
        };
        let now_selected = self.selection.toggle(&id);
        debug!(%id, now_selected, "selection toggled");
    }

    fn apply_bulk(&mut self, action: BulkAction) {
        if self.selection.is_empty() {
            self.status_note = Some("nothing selected".to_string());
            return;
        }
        let outcome = bulk::apply(action, &mut self.selection, &mut self.registry);
        let message = format!("bulk {}: {} agent(s)", action.label(), outcome.touched());
        self.push_log(CONSOLE_SOURCE, message.clone(), LogKind::Info);
        if !outcome.missing.is_empty() {
            self.push_log(
                CONSOLE_SOURCE,
                format!("bulk {} skipped {}", action.label(), outcome.missing.join(", ")),
                LogKind::Warning,
            );
        }
        self.status_note = Some(message);
        self.recalc_view();
    }

    fn set_target_status(&mut self, status: AgentStatus) {
        let Some(id) = self.target_id() else {
            return;
        };
        let previous = if self.detail.open_id() == Some(id.as_str()) {
            self.detail.set_status(status, &mut self.registry)
        } else {
            self.registry.set_status(&id, status)
        };
        let Some(previous) = previous else {
            return;
        };
        let kind = match status {
            AgentStatus::Error => LogKind::Error,
            AgentStatus::Offline => LogKind::Warning,
            AgentStatus::Busy | AgentStatus::Idle => LogKind::Info,
        };
        self.push_log(&id, format!("status {previous} -> {status}"), kind);
        self.recalc_view();
    }

    fn reset_target(&mut self) {
        let Some(id) = self.target_id() else {
            return;
        };
        let reset = if self.detail.open_id() == Some(id.as_str()) {
            self.detail.reset(&mut self.registry)
        } else {
            self.registry.reset(&id)
        };
        if reset {
            self.push_log(&id, "agent reset", LogKind::Success);
            self.recalc_view();
        }
    }

    fn edit_tag(&mut self, raw: &str, add: bool) {
        let Some(id) = self.target_id() else {
            return;
        };
        let Some(tag) = normalize_tag(raw) else {
            self.status_note = Some("tag is empty".to_string());
            return;
        };
        let changed = if add {
            self.registry.add_tag(&id, &tag)
        } else {
            self.registry.remove_tag(&id, &tag)
        };
        let verb = if add { "tagged" } else { "untagged" };
        self.status_note = Some(if changed {
            format!("{id} {verb} {tag}")
        } else {
            format!("{id} unchanged")
        });
        self.recalc_view();
    }

    fn submit_query(&mut self, text: String) {
        let question = text.trim();
        if question.is_empty() {
            return;
        }
        if !self.insight.begin() {
            self.status_note = Some("reasoning already in progress".to_string());
            return;
        }
        self.last_question = Some(question.to_string());
        let request = ReasoningRequest::insight(question);
        self.dispatch(JobTarget::Intelligence, request);
    }

    /// Makes sure the detail view is on the target agent and returns it.
    fn focus_detail(&mut self) -> Option<String> {
        let id = self.target_id()?;
        if self.detail.open_id() != Some(id.as_str()) {
            self.open_detail(&id);
        }
        Some(id)
    }

    fn request_analysis(&mut self) {
        let Some(id) = self.focus_detail() else {
            return;
        };
        let Some(context) = self.registry.find(&id).map(AgentRecord::context) else {
            return;
        };
        if !self.detail_inference.begin() {
            self.status_note = Some("reasoning already in progress".to_string());
            return;
        }
        self.detail_subject = Some(id);
        self.dispatch(JobTarget::Detail, ReasoningRequest::analysis(&context));
    }

    fn request_report(&mut self) {
        if self.focus_detail().is_none() {
            return;
        }
        let Some(context) = self.detail.report_context(&self.registry) else {
            return;
        };
        if !self.detail_inference.begin() {
            self.status_note = Some("reasoning already in progress".to_string());
            return;
        }
        self.detail_subject = self.detail.open_id().map(str::to_string);
        self.dispatch(JobTarget::Detail, ReasoningRequest::report(&context));
    }

    fn dispatch(&mut self, target: JobTarget, request: ReasoningRequest) {
        let task = request.task;
        if let Err(err) = self.jobs.try_send(ReasoningJob { target, request }) {
            warn!(task = task.as_str(), error = %err, "reasoning job not queued");
            let outcome = ReasoningOutcome {
                target,
                task,
                result: Err(ReasoningError::Unavailable(err.to_string())),
            };
            self.apply_reasoning(outcome);
        }
    }

    /// Shows a finished job in its area. Results that arrive after a newer request are still shown.
    pub fn apply_reasoning(&mut self, outcome: ReasoningOutcome) {
        let ReasoningOutcome {
            target,
            task,
            result,
        } = outcome;
        let slot = match target {
            JobTarget::Intelligence => &mut self.insight,
            JobTarget::Detail => &mut self.detail_inference,
        };
        let output = slot.finish(task, result);
        let (message, kind) = if output.failed {
            (format!("{} failed", task.as_str()), LogKind::Error)
        } else {
            (format!("{} ready", task.as_str()), LogKind::Success)
        };
        let source = match target {
            JobTarget::Intelligence => CONSOLE_SOURCE.to_string(),
            JobTarget::Detail => self
                .detail_subject
                .clone()
                .unwrap_or_else(|| CONSOLE_SOURCE.to_string()),
        };
        self.push_log(&source, message, kind);
    }

    /// Busy agents consume tokens on every metrics tick.
    pub fn on_metrics_tick(&mut self) {
        self.metrics_tick = self.metrics_tick.wrapping_add(1);
        let busy: Vec<String> = self
            .registry
            .agents()
            .iter()
            .filter(|agent| agent.status == AgentStatus::Busy)
            .map(|agent| agent.id.clone())
            .collect();
        for (index, id) in busy.iter().enumerate() {
            self.registry
                .record_usage(id, usage_increment(self.metrics_tick, index));
        }
        if !busy.is_empty() && self.query.sort == SortKey::Tokens {
            self.recalc_view();
        }
    }

    fn push_log(&mut self, agent_id: &str, message: impl Into<String>, kind: LogKind) {
        self.feed.push(LogEntry::now(agent_id, message, kind));
    }
}

fn usage_increment(tick: u64, index: usize) -> u64 {
    250 + (tick.wrapping_mul(37).wrapping_add(index as u64 * 101)) % 750
}

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use kbchat_core::constants::errors;
use kbchat_core::{
    ChatSession, Role, SessionEvent, Settings, Transcript, TurnOutcome, TurnState,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Terminal,
};
use std::io::{self, Write};
use tokio::sync::mpsc;

use crate::input::InputLine;
use crate::render::{self, LiveReply};
use crate::theme::Theme;

// ── Single-prompt mode ──────────────────────────────────────────────────

/// Ask one question and stream the reply to stdout. A failed turn prints
/// the error banner to stderr.
pub async fn run_single_prompt(session: ChatSession, prompt: &str) -> Result<TurnOutcome> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();

    let session_handle = tokio::spawn({
        let prompt = prompt.to_string();
        let mut session = session;
        async move { session.submit_with_events(prompt, &event_tx).await }
    });

    let mut stdout = io::stdout();
    while let Some(event) = event_rx.recv().await {
        match event {
            SessionEvent::Fragment(text) => {
                write!(stdout, "{text}")?;
                stdout.flush()?;
            }
            SessionEvent::Completed => writeln!(stdout)?,
            SessionEvent::Failed(reason) => {
                eprintln!("{}{}", errors::BANNER_PREFIX, reason);
            }
            SessionEvent::TurnRecorded(_) | SessionEvent::Generating => {}
        }
    }

    Ok(session_handle.await?)
}

// ── TUI state ───────────────────────────────────────────────────────────

struct AppState {
    input: InputLine,
    /// Mirror of the session transcript, fed by `TurnRecorded` events.
    transcript: Transcript,
    timestamps: Vec<String>,
    live: LiveReply,
    turn_state: TurnState,
    error_banner: Option<String>,
    scroll_offset: usize,
    tick: usize,
    title: String,
    description: String,
    input_placeholder: String,
    spinner_text: String,
    theme: Theme,
    model_name: String,
    should_quit: bool,
}

impl AppState {
    fn new(settings: &Settings, session: &ChatSession) -> Self {
        let theme = Theme::by_name(&settings.ui.theme).unwrap_or_else(|| {
            tracing::warn!(
                theme = %settings.ui.theme,
                available = %Theme::all_names().join(", "),
                "unknown theme, using default"
            );
            Theme::default()
        });

        Self {
            input: InputLine::new(),
            transcript: Transcript::new(),
            timestamps: Vec::new(),
            live: LiveReply::new(),
            turn_state: TurnState::AwaitingInput,
            error_banner: None,
            scroll_offset: 0,
            tick: 0,
            title: settings.ui.title.clone(),
            description: settings.ui.description.clone(),
            input_placeholder: settings.ui.input_placeholder.clone(),
            spinner_text: settings.ui.spinner_text.clone(),
            theme,
            model_name: session.model().to_string(),
            should_quit: false,
        }
    }

    /// A turn is in flight from submission until its terminal event.
    fn is_processing(&self) -> bool {
        matches!(
            self.turn_state,
            TurnState::UserSubmitted | TurnState::Generating
        )
    }

    fn status_text(&self) -> &str {
        match self.turn_state {
            TurnState::AwaitingInput | TurnState::Complete => "Ready",
            TurnState::UserSubmitted => "Sending...",
            TurnState::Generating if self.live.fragments() > 0 => "Streaming...",
            TurnState::Generating => self.spinner_text.as_str(),
            TurnState::Failed => "Error",
        }
    }

    fn scroll_to_bottom(&mut self) {
        // Resolved against the real content height at draw time.
        self.scroll_offset = usize::MAX;
    }
}

// ── TUI loop ────────────────────────────────────────────────────────────

pub async fn run_tui(session: ChatSession, settings: &Settings) -> Result<()> {
    let mut state = AppState::new(settings, &session);
    tracing::info!(session = %session.id(), model = %session.model(), "starting chat");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (question_tx, mut question_rx) = mpsc::unbounded_channel::<String>();

    // The worker owns the session; questions are handled one at a time.
    let worker = tokio::spawn(async move {
        let mut session = session;
        while let Some(question) = question_rx.recv().await {
            session.submit_with_events(question, &event_tx).await;
        }
    });

    let result = event_loop(&mut terminal, &mut state, &mut event_rx, &question_tx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Quitting ends the session along with any in-flight request.
    worker.abort();

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    question_tx: &mpsc::UnboundedSender<String>,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw_ui(f, state))?;

        while let Ok(session_event) = event_rx.try_recv() {
            handle_session_event(state, session_event);
        }

        if event::poll(std::time::Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                handle_key(state, key, question_tx);
            }
        }

        if state.is_processing() {
            state.tick = state.tick.wrapping_add(1);
        }

        if state.should_quit {
            return Ok(());
        }
    }
}

fn now_str() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

fn handle_session_event(state: &mut AppState, event: SessionEvent) {
    if let Some(turn_state) = event.turn_state() {
        state.turn_state = turn_state;
    }

    match event {
        SessionEvent::TurnRecorded(turn) => {
            if turn.role() == Role::Assistant && state.live.is_active() {
                let streamed = state.live.finish();
                tracing::debug!(chars = streamed.len(), "live reply replaced by recorded turn");
            }
            state.transcript.append(turn);
            state.timestamps.push(now_str());
            state.scroll_to_bottom();
        }
        SessionEvent::Generating => {
            state.live.begin();
        }
        SessionEvent::Fragment(text) => {
            state.live.push(&text);
            state.scroll_to_bottom();
        }
        SessionEvent::Completed => {}
        SessionEvent::Failed(reason) => {
            state.error_banner = Some(format!("{}{}", errors::BANNER_PREFIX, reason));
            state.scroll_to_bottom();
        }
    }
}

// ── Drawing ─────────────────────────────────────────────────────────────

fn draw_ui(f: &mut ratatui::Frame, state: &mut AppState) {
    let banner_height = if state.error_banner.is_some() { 3 } else { 0 };

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // title + description
            Constraint::Length(banner_height), // error banner
            Constraint::Min(5),                // chat
            Constraint::Length(3),             // input
            Constraint::Length(1),             // status
        ])
        .split(f.area());

    draw_header(f, main_chunks[0], state);
    if let Some(ref banner) = state.error_banner {
        let theme = &state.theme;
        let widget = Paragraph::new(banner.as_str())
            .style(Style::default().fg(theme.error))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.error)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(widget, main_chunks[1]);
    }
    draw_chat(f, main_chunks[2], state);
    draw_input(f, main_chunks[3], state);
    draw_status_bar(f, main_chunks[4], state);
}

fn draw_header(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            state.title.clone(),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            state.description.clone(),
            Style::default().fg(theme.muted),
        )),
    ])
    .wrap(Wrap { trim: true });
    f.render_widget(header, area);
}

fn draw_chat(f: &mut ratatui::Frame, area: Rect, state: &mut AppState) {
    let working = state
        .is_processing()
        .then(|| (render::spinner_frame(state.tick), state.spinner_text.as_str()));
    let chat_lines = render::build_chat_lines(
        &state.transcript,
        &state.timestamps,
        &state.live,
        working,
        &state.theme,
    );
    let total_lines = chat_lines.len();

    // Borders take two rows.
    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = total_lines.saturating_sub(visible_height);
    if state.scroll_offset > max_scroll {
        state.scroll_offset = max_scroll;
    }

    let theme = &state.theme;
    let chat = Paragraph::new(Text::from(chat_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Chat ")
                .border_style(Style::default().fg(theme.border)),
        )
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset.min(u16::MAX as usize) as u16, 0));
    f.render_widget(chat, area);

    if total_lines > visible_height {
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(state.scroll_offset);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("^"))
                .end_symbol(Some("v")),
            area,
            &mut scrollbar_state,
        );
    }
}

fn draw_input(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let processing = state.is_processing();

    let (text, style) = if state.input.is_empty() && !processing {
        (
            state.input_placeholder.as_str(),
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )
    } else if processing {
        (state.input.as_str(), Style::default().fg(theme.muted))
    } else {
        (state.input.as_str(), Style::default().fg(theme.fg))
    };

    let title = if processing {
        " Input (waiting for reply...) "
    } else {
        " Question "
    };

    let input = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(theme.border)),
        )
        .style(style);
    f.render_widget(input, area);

    if !processing {
        let column = state.input.cursor_column().min(u16::MAX as usize) as u16;
        let cursor_x = area.x.saturating_add(column).saturating_add(1);
        let max_x = area.x + area.width.saturating_sub(2);
        f.set_cursor_position((cursor_x.min(max_x), area.y + 1));
    }
}

fn draw_status_bar(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;

    let status_spans = vec![
        Span::styled(
            format!(" {} ", state.model_name),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("| {} turns ", state.transcript.exchanges()),
            Style::default().fg(theme.muted),
        ),
        Span::styled(format!("| {} ", theme.name), Style::default().fg(theme.muted)),
        Span::styled("| ", Style::default().fg(theme.muted)),
        Span::styled(state.status_text().to_string(), Style::default().fg(theme.muted)),
        Span::styled("  Esc quit", Style::default().fg(theme.muted)),
    ];
    f.render_widget(Paragraph::new(Line::from(status_spans)), area);
}

// ── Input handling ──────────────────────────────────────────────────────

fn handle_key(state: &mut AppState, key: KeyEvent, question_tx: &mpsc::UnboundedSender<String>) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    let processing = state.is_processing();

    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Esc) => {
            state.should_quit = true;
        }

        (_, KeyCode::Enter) => {
            if processing {
                return;
            }
            // Every line is a question, sent verbatim.
            let Some(question) = state.input.submit() else {
                return;
            };

            state.error_banner = None;
            state.turn_state = TurnState::UserSubmitted;
            state.tick = 0;
            state.scroll_to_bottom();
            if question_tx.send(question).is_err() {
                state.turn_state = TurnState::Failed;
                state.error_banner = Some(format!("{}session ended", errors::BANNER_PREFIX));
            }
        }

        (_, KeyCode::Backspace) if !processing => state.input.backspace(),
        (_, KeyCode::Delete) if !processing => state.input.delete(),
        (_, KeyCode::Left) => state.input.move_left(),
        (_, KeyCode::Right) => state.input.move_right(),
        (_, KeyCode::Home) => state.input.move_home(),
        (_, KeyCode::End) => state.input.move_end(),

        (_, KeyCode::PageUp) => {
            state.scroll_offset = state.scroll_offset.saturating_sub(10);
        }
        (_, KeyCode::PageDown) => {
            state.scroll_offset = state.scroll_offset.saturating_add(10);
        }

        (_, KeyCode::Up) if !processing => state.input.history_prev(),
        (_, KeyCode::Down) if !processing => state.input.history_next(),

        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) if !processing => {
            state.input.insert(c);
        }

        _ => {}
    }
}

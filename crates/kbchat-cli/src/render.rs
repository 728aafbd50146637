use kbchat_core::constants::{errors, ui};
use kbchat_core::{Role, Transcript, Turn};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::theme::Theme;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Incremental-redraw state for the reply currently streaming in.
///
/// Fragments are appended in arrival order; the partial text is drawn with
/// a trailing cursor until the reply is finished or discarded.
#[derive(Debug, Default)]
pub struct LiveReply {
    buffer: String,
    fragments: usize,
    active: bool,
}

impl LiveReply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.buffer.clear();
        self.fragments = 0;
        self.active = true;
    }

    pub fn push(&mut self, fragment: &str) {
        if !self.active {
            self.begin();
        }
        self.buffer.push_str(fragment);
        self.fragments += 1;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Partial text with the streaming cursor, while a reply is in flight.
    pub fn display(&self) -> Option<String> {
        self.active
            .then(|| format!("{}{}", self.buffer, ui::STREAM_CURSOR))
    }

    /// End the reply and hand back the accumulated text.
    pub fn finish(&mut self) -> String {
        self.active = false;
        self.fragments = 0;
        std::mem::take(&mut self.buffer)
    }
}

pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// Assistant turns recorded for a failed generation.
pub fn is_error_turn(turn: &Turn) -> bool {
    turn.role() == Role::Assistant && turn.content().starts_with(errors::TURN_PREFIX)
}

fn prefixed_lines(
    prefix: &str,
    content: &str,
    color: ratatui::style::Color,
    trailer: Option<Span<'static>>,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let indent = " ".repeat(prefix.chars().count());

    // `lines()` drops a trailing empty line; an empty reply still gets its prefix.
    let mut raw_lines: Vec<&str> = content.lines().collect();
    if raw_lines.is_empty() {
        raw_lines.push("");
    }

    for (i, raw_line) in raw_lines.into_iter().enumerate() {
        if i == 0 {
            let mut spans = vec![
                Span::styled(
                    prefix.to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(raw_line.to_string(), Style::default().fg(color)),
            ];
            if let Some(ref trailer) = trailer {
                spans.push(trailer.clone());
            }
            lines.push(Line::from(spans));
        } else {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(raw_line.to_string(), Style::default().fg(color)),
            ]));
        }
    }

    lines
}

pub fn turn_lines(turn: &Turn, timestamp: &str, theme: &Theme) -> Vec<Line<'static>> {
    let (prefix, color) = match turn.role() {
        Role::User => ("You > ", theme.user_color),
        Role::Assistant if is_error_turn(turn) => ("AI > ", theme.error),
        Role::Assistant => ("AI > ", theme.assistant_color),
    };
    let stamp = Span::styled(
        format!("  {timestamp}"),
        Style::default().fg(theme.muted).add_modifier(Modifier::DIM),
    );
    prefixed_lines(prefix, turn.content(), color, Some(stamp))
}

/// Full chat view: every recorded turn, then the in-flight reply or the
/// working indicator. `timestamps[i]` belongs to the i-th turn.
pub fn build_chat_lines(
    transcript: &Transcript,
    timestamps: &[String],
    live: &LiveReply,
    working: Option<(&str, &str)>,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut chat_lines: Vec<Line<'static>> = Vec::new();

    for (i, turn) in transcript.iter().enumerate() {
        let timestamp = timestamps.get(i).map(String::as_str).unwrap_or("");
        chat_lines.extend(turn_lines(turn, timestamp, theme));
        chat_lines.push(Line::raw(""));
    }

    match live.display() {
        Some(partial) if live.fragments() > 0 => {
            chat_lines.extend(prefixed_lines("AI > ", &partial, theme.assistant_color, None));
            chat_lines.push(Line::raw(""));
        }
        _ => {
            if let Some((frame, text)) = working {
                chat_lines.push(Line::from(Span::styled(
                    format!("  {frame} {text}"),
                    Style::default().fg(theme.accent).add_modifier(Modifier::DIM),
                )));
            }
        }
    }

    chat_lines
}

use kbchat_cli::render::{build_chat_lines, is_error_turn, spinner_frame, turn_lines, LiveReply};
use kbchat_cli::Theme;
use kbchat_core::{Transcript, Turn};
use ratatui::text::Line;

fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

fn all_text(lines: &[Line<'_>]) -> String {
    lines.iter().map(line_text).collect::<Vec<_>>().join("\n")
}

// ========================================================================
// LiveReply Tests
// ========================================================================

#[test]
fn test_live_reply_accumulates_fragments_in_order() {
    let mut live = LiveReply::new();
    live.begin();
    for fragment in ["বাংলাদেশের ", "রাজধানী ", "ঢাকা।"] {
        live.push(fragment);
    }

    assert_eq!(live.fragments(), 3);
    assert_eq!(live.finish(), "বাংলাদেশের রাজধানী ঢাকা।");
}

#[test]
fn test_live_reply_cursor_only_while_active() {
    let mut live = LiveReply::new();
    assert!(live.display().is_none());

    live.begin();
    live.push("partial");
    assert_eq!(live.display().as_deref(), Some("partial▌"));

    live.finish();
    assert!(!live.is_active());
    assert!(live.display().is_none());
    assert_eq!(live.finish(), "");
}

#[test]
fn test_live_reply_begin_discards_previous_text() {
    let mut live = LiveReply::new();
    live.push("stale");
    assert!(live.is_active());

    live.begin();
    assert_eq!(live.fragments(), 0);
    assert_eq!(live.display().as_deref(), Some("▌"));
}

// ========================================================================
// Transcript Rendering Tests
// ========================================================================

#[test]
fn test_turn_lines_prefix_by_role() {
    let theme = Theme::default();

    let user = turn_lines(&Turn::user("hello"), "10:00", &theme);
    assert_eq!(line_text(&user[0]), "You > hello  10:00");

    let reply = turn_lines(&Turn::assistant("line one\nline two"), "10:01", &theme);
    assert_eq!(reply.len(), 2);
    assert_eq!(line_text(&reply[0]), "AI > line one  10:01");
    assert_eq!(line_text(&reply[1]), "     line two");
}

#[test]
fn test_error_turn_uses_error_color() {
    let theme = Theme::default();
    let turn = Turn::assistant("An error occurred: quota");

    assert!(is_error_turn(&turn));
    let lines = turn_lines(&turn, "10:02", &theme);
    assert_eq!(lines[0].spans[1].style.fg, Some(theme.error));
    assert!(!is_error_turn(&Turn::user("An error occurred: x")));
}

#[test]
fn test_empty_reply_still_rendered() {
    let lines = turn_lines(&Turn::assistant(""), "10:03", &Theme::default());
    assert_eq!(lines.len(), 1);
    assert!(line_text(&lines[0]).starts_with("AI > "));
}

#[test]
fn test_chat_lines_replay_transcript_in_order() {
    let mut transcript = Transcript::new();
    transcript.append(Turn::user("/etc/hosts ফাইলটি কী?"));
    transcript.append(Turn::assistant("একটি ফাইল।"));
    let timestamps = vec!["09:00".to_string()];

    let text = all_text(&build_chat_lines(&transcript, &timestamps, &LiveReply::new(), None, &Theme::default()));

    assert_eq!(text, "You > /etc/hosts ফাইলটি কী?  09:00\n\nAI > একটি ফাইল।  \n");
}

#[test]
fn test_chat_lines_show_spinner_until_first_fragment() {
    let theme = Theme::default();
    let mut transcript = Transcript::new();
    transcript.append(Turn::user("q"));
    let timestamps = vec!["10:00".to_string()];
    let mut live = LiveReply::new();
    live.begin();

    let waiting = all_text(&build_chat_lines(&transcript, &timestamps, &live, Some(("⠋", "Thinking...")), &theme));
    assert!(waiting.contains("⠋ Thinking..."));

    live.push("উত্তর");
    let streaming = all_text(&build_chat_lines(&transcript, &timestamps, &live, Some(("⠋", "Thinking...")), &theme));
    assert!(streaming.contains("AI > উত্তর▌"));
    assert!(!streaming.contains("Thinking..."));
}

#[test]
fn test_spinner_frame_wraps() {
    assert_eq!(spinner_frame(0), spinner_frame(10));
    assert_ne!(spinner_frame(0), spinner_frame(1));
}

// ========================================================================
// Theme Tests
// ========================================================================

#[test]
fn test_theme_lookup() {
    for name in Theme::all_names() {
        let theme = Theme::by_name(name).unwrap();
        assert_eq!(theme.name, *name);
    }
    assert!(Theme::by_name("nope").is_none());
    assert_eq!(Theme::default().name, "dark");
}

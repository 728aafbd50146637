use kbchat_core::{
    ChatSession, FragmentStream, GenerationClient, KbChatError, KnowledgeSnippet,
    PromptAssembler, Role, SessionEvent, StreamEvent, TurnOutcome, TurnState,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::unbounded_channel;

/// What the mock does for one request.
enum Script {
    Events(Vec<StreamEvent>),
    Reject(String),
}

/// Mock client that replays scripted responses in order and records
/// every payload it receives.
struct MockClient {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    payloads: Arc<Mutex<Vec<String>>>,
}

impl MockClient {
    fn new(scripts: Vec<Script>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let payloads = Arc::new(Mutex::new(Vec::new()));
        let client = Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            payloads: payloads.clone(),
        };
        (client, payloads)
    }
}

#[async_trait::async_trait]
impl GenerationClient for MockClient {
    async fn generate_stream(&self, payload: &str) -> Result<FragmentStream, KbChatError> {
        self.payloads.lock().unwrap().push(payload.to_string());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Events(vec![StreamEvent::Done]));

        match script {
            Script::Events(events) => Ok(FragmentStream::from_events(events)),
            Script::Reject(reason) => Err(KbChatError::Generation(reason)),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

fn reply(fragments: &[&str]) -> Script {
    let mut events: Vec<StreamEvent> = fragments
        .iter()
        .map(|f| StreamEvent::TextDelta(f.to_string()))
        .collect();
    events.push(StreamEvent::Done);
    Script::Events(events)
}

fn test_assembler() -> PromptAssembler {
    PromptAssembler::new("K={K}", KnowledgeSnippet::new("facts"))
        .with_placeholder("{K}")
        .with_separator("\nQ: ")
}

fn session_with(scripts: Vec<Script>) -> (ChatSession, Arc<Mutex<Vec<String>>>) {
    let (client, payloads) = MockClient::new(scripts);
    (ChatSession::new(Box::new(client), test_assembler()), payloads)
}

#[tokio::test]
async fn test_successful_turns_alternate_roles() {
    let (mut session, _) = session_with(vec![
        reply(&["one"]),
        reply(&["two"]),
        reply(&["three"]),
    ]);

    for question in ["a", "b", "c"] {
        let outcome = session.submit(question).await;
        assert!(outcome.is_complete());
    }

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 6);
    for (i, turn) in transcript.iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(turn.role(), expected);
    }
    assert_eq!(transcript.turns()[5].content(), "three");
}

#[tokio::test]
async fn test_fragments_concatenate_to_recorded_reply() {
    let fragments = ["বাংলাদেশের ", "রাজধানী ", "ঢাকা", "।"];
    let (mut session, _) = session_with(vec![reply(&fragments)]);
    let (tx, mut rx) = unbounded_channel();

    let outcome = session.submit_with_events("রাজধানী?", &tx).await;
    drop(tx);

    let mut streamed = String::new();
    let mut recorded_reply = None;
    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Fragment(text) => streamed.push_str(&text),
            SessionEvent::TurnRecorded(turn) if turn.role() == Role::Assistant => {
                recorded_reply = Some(turn.content().to_string());
            }
            _ => {}
        }
    }

    assert_eq!(streamed, "বাংলাদেশের রাজধানী ঢাকা।");
    assert_eq!(recorded_reply.as_deref(), Some(streamed.as_str()));
    assert_eq!(outcome, TurnOutcome::Complete(streamed));
}

#[tokio::test]
async fn test_event_order_for_successful_turn() {
    let (mut session, _) = session_with(vec![reply(&["hi", " there"])]);
    let (tx, mut rx) = unbounded_channel();

    session.submit_with_events("hello", &tx).await;
    drop(tx);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 6);
    assert!(matches!(&events[0], SessionEvent::TurnRecorded(t) if t.role() == Role::User && t.content() == "hello"));
    assert_eq!(events[1], SessionEvent::Generating);
    assert_eq!(events[2], SessionEvent::Fragment("hi".into()));
    assert_eq!(events[3], SessionEvent::Fragment(" there".into()));
    assert!(matches!(&events[4], SessionEvent::TurnRecorded(t) if t.content() == "hi there"));
    assert_eq!(events[5], SessionEvent::Completed);

    let states: Vec<TurnState> = events.iter().filter_map(|e| e.turn_state()).collect();
    assert_eq!(
        states,
        vec![
            TurnState::UserSubmitted,
            TurnState::Generating,
            TurnState::Generating,
            TurnState::Generating,
            TurnState::Complete,
        ]
    );
    assert!(states.last().unwrap().is_terminal());
}

#[tokio::test]
async fn test_failed_turn_ends_in_failed_state() {
    let (mut session, _) = session_with(vec![Script::Reject("boom".into())]);
    let (tx, mut rx) = unbounded_channel();

    session.submit_with_events("q", &tx).await;
    drop(tx);

    let mut states = Vec::new();
    while let Some(event) = rx.recv().await {
        states.extend(event.turn_state());
    }
    assert_eq!(
        states,
        vec![TurnState::UserSubmitted, TurnState::Generating, TurnState::Failed]
    );
}

#[tokio::test]
async fn test_stream_error_records_error_turn_and_session_recovers() {
    let (mut session, _) = session_with(vec![
        reply(&["ok"]),
        Script::Events(vec![
            StreamEvent::TextDelta("partial ".into()),
            StreamEvent::Error("quota exceeded".into()),
        ]),
        reply(&["back"]),
    ]);

    assert!(session.submit("first").await.is_complete());

    let (tx, mut rx) = unbounded_channel();
    let outcome = session.submit_with_events("second", &tx).await;
    drop(tx);
    assert_eq!(outcome, TurnOutcome::Failed("quota exceeded".into()));

    // k = 2: transcript length is 2k and the last turn is the error turn.
    let transcript = session.transcript();
    assert_eq!(transcript.len(), 4);
    let last = transcript.last().unwrap();
    assert_eq!(last.role(), Role::Assistant);
    assert_eq!(last.content(), "An error occurred: quota exceeded");
    assert!(!last.content().contains("partial"));

    let mut saw_failed = false;
    while let Some(event) = rx.recv().await {
        if let SessionEvent::Failed(reason) = event {
            assert_eq!(reason, "quota exceeded");
            saw_failed = true;
        }
    }
    assert!(saw_failed);

    assert_eq!(session.submit("third").await, TurnOutcome::Complete("back".into()));
    assert_eq!(session.transcript().len(), 6);
}

#[tokio::test]
async fn test_request_rejection_records_error_turn() {
    let (mut session, _) = session_with(vec![Script::Reject("Gemini API error (403): forbidden".into())]);

    let outcome = session.submit("q").await;

    assert_eq!(outcome, TurnOutcome::Failed("Gemini API error (403): forbidden".into()));
    assert_eq!(session.transcript().len(), 2);
    assert_eq!(
        session.transcript().turns()[1].content(),
        "An error occurred: Gemini API error (403): forbidden"
    );
}

#[tokio::test]
async fn test_empty_response_is_complete_with_empty_text() {
    let (mut session, _) = session_with(vec![reply(&[])]);

    assert_eq!(session.submit("q").await, TurnOutcome::Complete(String::new()));
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test]
async fn test_payload_is_assembled_per_turn() {
    let (mut session, payloads) = session_with(vec![reply(&["x"]), reply(&["y"])]);

    session.submit("first?").await;
    session.submit("").await;

    let payloads = payloads.lock().unwrap();
    assert_eq!(payloads.as_slice(), ["K=facts\nQ: first?", "K=facts\nQ: "]);
}

#[tokio::test]
async fn test_slash_prefixed_question_reaches_model() {
    let (mut session, payloads) = session_with(vec![reply(&["hosts file"])]);

    let outcome = session.submit("/etc/hosts ফাইলটি কী?").await;

    assert!(outcome.is_complete());
    assert_eq!(payloads.lock().unwrap().as_slice(), ["K=facts\nQ: /etc/hosts ফাইলটি কী?"]);
    assert_eq!(session.transcript().turns()[0].content(), "/etc/hosts ফাইলটি কী?");
}

#[tokio::test]
async fn test_user_turn_recorded_verbatim() {
    let (mut session, _) = session_with(vec![reply(&["x"])]);

    session.submit("  spaced\tquestion  ").await;

    assert_eq!(session.transcript().turns()[0].content(), "  spaced\tquestion  ");
    assert_eq!(session.model(), "mock-model");
}

#[tokio::test]
async fn test_fragment_stream_stops_after_first_error() {
    let stream = FragmentStream::from_events(vec![
        StreamEvent::TextDelta("a".into()),
        StreamEvent::Error("boom".into()),
        StreamEvent::TextDelta("never".into()),
    ]);

    let err = stream.collect_text().await.unwrap_err();
    assert!(matches!(err, KbChatError::Generation(ref r) if r == "boom"));
}

#[tokio::test]
async fn test_fragment_stream_ends_when_producer_hangs_up() {
    let stream = FragmentStream::from_events(vec![
        StreamEvent::TextDelta("a".into()),
        StreamEvent::TextDelta("".into()),
        StreamEvent::TextDelta("b".into()),
    ]);

    assert_eq!(stream.collect_text().await.unwrap(), "ab");
}

#[test]
fn test_turn_state_terminal_states() {
    assert!(TurnState::Complete.is_terminal());
    assert!(TurnState::Failed.is_terminal());
    assert!(!TurnState::Generating.is_terminal());
    assert!(!TurnState::AwaitingInput.is_terminal());
    assert!(!TurnState::UserSubmitted.is_terminal());
}

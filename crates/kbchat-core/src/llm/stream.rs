use futures::channel::mpsc;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::KbChatError;
use crate::llm::StreamEvent;

/// Lazy, finite, non-restartable sequence of response fragments.
///
/// Yields `Ok(text)` per fragment. The first `Err` ends the sequence; so
/// does `StreamEvent::Done` or the producer hanging up.
pub struct FragmentStream {
    events: mpsc::UnboundedReceiver<StreamEvent>,
    finished: bool,
}

impl FragmentStream {
    pub fn new(events: mpsc::UnboundedReceiver<StreamEvent>) -> Self {
        Self {
            events,
            finished: false,
        }
    }

    /// Build a stream from a fixed event script.
    pub fn from_events(events: impl IntoIterator<Item = StreamEvent>) -> Self {
        let (tx, rx) = mpsc::unbounded();
        for event in events {
            let _ = tx.unbounded_send(event);
        }
        Self::new(rx)
    }

    /// Drain the stream, concatenating fragments in arrival order.
    pub async fn collect_text(mut self) -> Result<String, KbChatError> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for FragmentStream {
    type Item = Result<String, KbChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        loop {
            match self.events.poll_next_unpin(cx) {
                Poll::Ready(Some(StreamEvent::TextDelta(text))) => {
                    if text.is_empty() {
                        continue;
                    }
                    return Poll::Ready(Some(Ok(text)));
                }
                Poll::Ready(Some(StreamEvent::Error(reason))) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(KbChatError::Generation(reason))));
                }
                Poll::Ready(Some(StreamEvent::Done)) | Poll::Ready(None) => {
                    self.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

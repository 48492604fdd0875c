//! Async send orchestration for Session.

use tokio::sync::mpsc;
use tracing::debug;

use crate::{GenerateClient, ProviderError};

use super::manager::Session;
use super::types::{Outbound, SendOutcome};

impl Session {
    /// Drive one full round against the provider: commit the draft, apply
    /// streamed chunks in arrival order, then record the final text (or the
    /// failure) in the transcript.
    ///
    /// Provider failures are absorbed into the transcript as an error
    /// message; the session is back in `Idle` either way and the user may
    /// submit again.
    pub async fn send(&mut self, client: &dyn GenerateClient) -> SendOutcome {
        let Some(outbound) = self.submit_draft() else {
            return SendOutcome::Rejected;
        };
        self.drive(client, outbound).await
    }

    /// Like [`send`](Self::send), but with explicit text and attachments
    /// instead of the draft.
    pub async fn send_text(
        &mut self,
        client: &dyn GenerateClient,
        text: impl AsRef<str>,
        attachments: Vec<tanya_common::Attachment>,
    ) -> SendOutcome {
        let Some(outbound) = self.submit(text, attachments) else {
            return SendOutcome::Rejected;
        };
        self.drive(client, outbound).await
    }

    async fn drive(&mut self, client: &dyn GenerateClient, outbound: Outbound) -> SendOutcome {
        let Outbound {
            id,
            history,
            prompt,
        } = outbound;

        debug!(%id, "dispatching generation request");

        // Chunks cross from the provider callback to the session through a
        // channel so they mutate state on this task, in arrival order.
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let request = client.generate(
            &history,
            &prompt,
            Box::new(move |chunk| {
                let _ = tx.send(chunk);
            }),
        );
        tokio::pin!(request);

        let result: Result<String, ProviderError> = loop {
            tokio::select! {
                Some(text) = rx.recv() => {
                    self.apply_chunk(id, &text);
                }
                result = &mut request => break result,
            }
        };

        // The callback is dropped once the request resolves; drain anything
        // still queued before finishing so chunk order is preserved.
        while let Ok(text) = rx.try_recv() {
            self.apply_chunk(id, &text);
        }

        match result {
            Ok(final_text) => {
                self.complete(id, final_text);
                SendOutcome::Completed
            }
            Err(error) => {
                self.fail(id, &error);
                SendOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tanya_common::{Phase, Role};

    use crate::{Prompt, Turn};

    /// Scripted provider: emits chunks, then resolves or fails.
    struct FakeClient {
        chunks: Vec<&'static str>,
        result: Result<&'static str, fn() -> ProviderError>,
    }

    #[async_trait]
    impl GenerateClient for FakeClient {
        async fn generate(
            &self,
            _history: &[Turn],
            _prompt: &Prompt,
            on_chunk: Box<dyn Fn(String) + Send + Sync>,
        ) -> Result<String, ProviderError> {
            for chunk in &self.chunks {
                on_chunk(chunk.to_string());
                tokio::task::yield_now().await;
            }
            match self.result {
                Ok(text) => Ok(text.to_string()),
                Err(make) => Err(make()),
            }
        }
    }

    #[tokio::test]
    async fn send_streams_then_records_final_text() {
        let client = FakeClient {
            chunks: vec!["Hi", " there"],
            result: Ok("Hi there!"),
        };
        let mut session = Session::new();
        session.set_draft_text("Hello");

        let outcome = session.send(&client).await;

        assert_eq!(outcome, SendOutcome::Completed);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.stream_buffer(), "");
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, "Hi there!");
    }

    #[tokio::test]
    async fn send_with_empty_draft_is_rejected() {
        let client = FakeClient {
            chunks: vec![],
            result: Ok("unreachable"),
        };
        let mut session = Session::new();
        session.set_draft_text("   ");

        assert_eq!(session.send(&client).await, SendOutcome::Rejected);
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn provider_failure_lands_in_transcript() {
        let client = FakeClient {
            chunks: vec!["partial"],
            result: Err(|| ProviderError::Api("quota exceeded".into())),
        };
        let mut session = Session::new();

        let outcome = session.send_text(&client, "X", vec![]).await;

        assert_eq!(outcome, SendOutcome::Failed);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.stream_buffer(), "");
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, Role::Error);
        assert_eq!(transcript[1].content, "Error: quota exceeded");
    }

    #[tokio::test]
    async fn chunks_apply_in_arrival_order() {
        let client = FakeClient {
            chunks: vec!["a", "b", "c"],
            result: Ok("abc"),
        };
        let mut session = Session::new();
        let mut rx = session.subscribe();

        session.send_text(&client, "order test", vec![]).await;

        let mut seen = String::new();
        while let Ok(event) = rx.try_recv() {
            if let tanya_common::SessionEvent::StreamDelta { text } = event {
                seen.push_str(&text);
            }
        }
        assert_eq!(seen, "abc");
    }

    #[tokio::test]
    async fn session_is_reusable_after_failure() {
        let failing = FakeClient {
            chunks: vec![],
            result: Err(|| ProviderError::Timeout),
        };
        let ok = FakeClient {
            chunks: vec!["fine"],
            result: Ok("fine"),
        };
        let mut session = Session::new();

        assert_eq!(
            session.send_text(&failing, "first", vec![]).await,
            SendOutcome::Failed
        );
        assert_eq!(
            session.send_text(&ok, "second", vec![]).await,
            SendOutcome::Completed
        );
        assert_eq!(session.message_count(), 4);
        assert_eq!(session.transcript()[3].content, "fine");
    }
}

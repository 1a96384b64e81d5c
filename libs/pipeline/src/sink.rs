use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use fleet_api::{CapabilityError, MessageSink};

// ═══════════════════════════════════════════════════════════════
//  Cancellable send
// ═══════════════════════════════════════════════════════════════

/// Race one sink send against cancellation and an optional deadline.
///
/// Losing the race drops the send future, which cancels the in-flight
/// publish; a completed publish is never retracted.
pub(crate) async fn send_with_cancel(
    sink: &dyn MessageSink,
    payload: &[u8],
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<(), CapabilityError> {
    let send = async {
        match timeout {
            Some(t) => tokio::time::timeout(t, sink.send(payload))
                .await
                .unwrap_or_else(|_| Err(CapabilityError::io("send deadline exceeded"))),
            None => sink.send(payload).await,
        }
    };

    tokio::select! {
        result = send => result,
        _ = cancel.cancelled() => Err(CapabilityError::io("send cancelled")),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Stdout sink
// ═══════════════════════════════════════════════════════════════

/// Writes each payload as one line on stdout, optionally label-prefixed.
#[derive(Debug, Default)]
pub struct StdoutSink {
    label: Option<String>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self { label: None }
    }

    pub fn labeled(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()) }
    }
}

impl MessageSink for StdoutSink {
    fn send<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), CapabilityError>> + Send + 'a>> {
        Box::pin(async move {
            let text = std::str::from_utf8(payload)?;
            match &self.label {
                Some(label) => println!("[{label}] {text}"),
                None => println!("{text}"),
            }
            Ok(())
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  TCP line sink
// ═══════════════════════════════════════════════════════════════

/// Newline-framed TCP publisher, a local stand-in for a message-bus
/// endpoint. Connects lazily on the first send; a failed write drops the
/// connection so the next send re-dials.
pub struct TcpLineSink {
    addr: String,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpLineSink {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            stream: Mutex::new(None),
        }
    }
}

impl MessageSink for TcpLineSink {
    fn send<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), CapabilityError>> + Send + 'a>> {
        Box::pin(async move {
            let mut guard = self.stream.lock().await;

            if guard.is_none() {
                let stream = TcpStream::connect(&self.addr)
                    .await
                    .map_err(|e| CapabilityError::io(format!("connect {}: {e}", self.addr)))?;
                tracing::info!(addr = %self.addr, "sink connected");
                *guard = Some(stream);
            }

            let stream = guard.as_mut().unwrap();
            let result = async {
                stream.write_all(payload).await?;
                stream.write_all(b"\n").await?;
                stream.flush().await
            }
            .await;

            if let Err(e) = result {
                // Re-dial on the next send.
                *guard = None;
                return Err(CapabilityError::io(format!("write {}: {e}", self.addr)));
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_sink_writes_newline_framed_payloads() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(stream).lines();
            let first = lines.next_line().await.unwrap().unwrap();
            let second = lines.next_line().await.unwrap().unwrap();
            (first, second)
        });

        let sink = TcpLineSink::new(addr.to_string());
        sink.send(br#"{"id":"0"}"#).await.unwrap();
        sink.send(br#"{"id":"1"}"#).await.unwrap();

        let (first, second) = server.await.unwrap();
        assert_eq!(first, r#"{"id":"0"}"#);
        assert_eq!(second, r#"{"id":"1"}"#);
    }

    #[tokio::test]
    async fn tcp_sink_fails_when_nobody_listens() {
        // Bind then drop to get an address that refuses connections.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink = TcpLineSink::new(addr.to_string());
        let err = sink.send(b"{}").await.unwrap_err();
        assert_eq!(err.kind(), fleet_api::ErrorKind::Io);
    }

    /// Sink whose send never completes.
    struct StalledSink;

    impl MessageSink for StalledSink {
        fn send<'a>(
            &'a self,
            _payload: &'a [u8],
        ) -> Pin<Box<dyn Future<Output = Result<(), CapabilityError>> + Send + 'a>> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test]
    async fn cancelled_token_aborts_a_stalled_send() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = send_with_cancel(&StalledSink, b"{}", &cancel, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), fleet_api::ErrorKind::Io);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_a_stalled_send() {
        let cancel = CancellationToken::new();

        let err = send_with_cancel(
            &StalledSink,
            b"{}",
            &cancel,
            Some(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), fleet_api::ErrorKind::Io);
        assert_eq!(err.message(), "send deadline exceeded");
    }
}

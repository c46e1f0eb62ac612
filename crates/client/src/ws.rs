//! WebSocket push transport.

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use snaptrack_protocol::constants::PUSH_MAX_MESSAGE_SIZE;
use snaptrack_tracker::{PushError, PushFrame, PushSubscription, PushTransport};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};
use tracing::{debug, trace};

/// Opens push subscriptions over `ws://` or `wss://` connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsPushTransport;

impl WsPushTransport {
    pub fn new() -> Self {
        Self
    }
}

impl PushTransport for WsPushTransport {
    fn subscribe<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn PushSubscription>, PushError>> {
        Box::pin(async move {
            let mut ws_config = WebSocketConfig::default();
            ws_config.max_message_size = Some(PUSH_MAX_MESSAGE_SIZE);
            ws_config.max_frame_size = Some(PUSH_MAX_MESSAGE_SIZE);

            let (stream, _) = connect_async_with_config(url, Some(ws_config), false)
                .await
                .map_err(|e| PushError::Connect(e.to_string()))?;
            debug!(url, "push channel connected");

            Ok(Box::new(WsSubscription { stream }) as Box<dyn PushSubscription>)
        })
    }
}

struct WsSubscription {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl PushSubscription for WsSubscription {
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<PushFrame, PushError>>> {
        Box::pin(async move {
            loop {
                match self.stream.next().await? {
                    Ok(Message::Text(text)) => {
                        return Some(Ok(PushFrame::Text(text.as_str().to_owned())));
                    }
                    Ok(Message::Binary(data)) => return Some(Ok(PushFrame::Binary(data.to_vec()))),
                    Ok(Message::Close(frame)) => {
                        debug!(?frame, "push channel closed by server");
                        return None;
                    }
                    Ok(other) => trace!(?other, "skipping control frame"),
                    Err(e) => return Some(Err(PushError::Transport(e.to_string()))),
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Err(e) = self.stream.close(None).await {
                trace!(error = %e, "push close failed");
            }
        })
    }
}

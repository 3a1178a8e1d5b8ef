use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

use crate::error::Result;

/// An open text-frame link to the server.
///
/// The link is lost when `inbound` yields `None`. Dropping the link closes
/// the underlying socket.
#[derive(Debug)]
pub struct Link {
    pub outbound: mpsc::Sender<String>,
    pub inbound: mpsc::Receiver<String>,
}

impl Link {
    /// Two linked ends: the first goes to the transport, the second plays the
    /// server. Used by scripted connectors.
    pub fn pair(capacity: usize) -> (Link, Link) {
        let (client_tx, server_rx) = mpsc::channel(capacity);
        let (server_tx, client_rx) = mpsc::channel(capacity);
        (
            Link {
                outbound: client_tx,
                inbound: client_rx,
            },
            Link {
                outbound: server_tx,
                inbound: server_rx,
            },
        )
    }
}

/// Opens links. The transport owns one connector and calls it once per attempt.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, endpoint: &str) -> impl Future<Output = Result<Link>> + Send;
}

/// Connects with tokio-tungstenite and pumps frames between the socket and
/// the link's channels.
#[derive(Debug, Clone)]
pub struct WsConnector {
    queue: usize,
}

impl WsConnector {
    pub fn new(queue: usize) -> Self {
        Self { queue: queue.max(1) }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Connector for WsConnector {
    async fn connect(&self, endpoint: &str) -> Result<Link> {
        let (stream, _) = connect_async(endpoint).await?;
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(self.queue);
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(self.queue);

        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if sink.send(Message::text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(text.as_str().to_owned()).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(error = %e, "Socket read failed");
                        break;
                    }
                }
            }
        });

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

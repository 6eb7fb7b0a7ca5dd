//! Request/response messaging between the page, background and popup contexts.
//!
//! Each context owns an [`Inbox`] and hands out cloneable [`Endpoint`]s. A request
//! is a single round trip: the sender suspends until the handler replies or the
//! serving side goes away.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::results::PageSnapshot;

/// Messages understood by the extension's contexts, tagged by `action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Ask a page's collector for a fresh snapshot
    CollectData,
    /// Liveness probe for a page's collector
    Ping,
    /// Ask the background to analyze a snapshot
    AnalyzePage {
        #[serde(rename = "pageData")]
        page_data: Box<PageSnapshot>,
    },
}

impl Request {
    /// Wire name of the action
    pub fn action(&self) -> &'static str {
        match self {
            Request::CollectData => "collectData",
            Request::Ping => "ping",
            Request::AnalyzePage { .. } => "analyzePage",
        }
    }
}

/// Replies to [`Request`]s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Pong { pong: bool },
    Analysis { analysis: String },
    Snapshot(Box<PageSnapshot>),
}

/// Something that answers requests delivered to an inbox.
///
/// Returning `None` means the request is not addressed to this handler.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: Request) -> Option<Response>;
}

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Option<Response>>,
}

/// Sending side of a context's message channel
#[derive(Clone)]
pub struct Endpoint {
    tx: mpsc::Sender<Envelope>,
}

/// Receiving side of a context's message channel
pub struct Inbox {
    rx: mpsc::Receiver<Envelope>,
}

/// Create a connected endpoint/inbox pair
pub fn channel(buffer: usize) -> (Endpoint, Inbox) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (Endpoint { tx }, Inbox { rx })
}

impl Endpoint {
    /// Send a request and wait for its single response
    pub async fn request(&self, request: Request) -> Result<Response> {
        let action = request.action();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(Envelope {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::ChannelClosed)?;

        match reply_rx.await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(Error::NoResponse(action)),
            Err(_) => Err(Error::ChannelClosed),
        }
    }

    /// Whether the serving side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Inbox {
    /// Answer incoming requests until every endpoint is dropped.
    ///
    /// Each request is handled on its own task, so a slow analysis does not
    /// hold up a ping.
    pub async fn serve(mut self, handler: Arc<dyn Handler>) {
        while let Some(envelope) = self.rx.recv().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let action = envelope.request.action();
                ::log::trace!("Handling '{}' request", action);
                let response = handler.handle(envelope.request).await;
                if envelope.reply.send(response).is_err() {
                    // The requester went away, e.g. the popup was closed mid-run
                    ::log::debug!("Dropping '{}' response; requester is gone", action);
                }
            });
        }
        ::log::debug!("Inbox closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Handler for Echo {
        async fn handle(&self, request: Request) -> Option<Response> {
            match request {
                Request::Ping => Some(Response::Pong { pong: true }),
                Request::AnalyzePage { page_data } => Some(Response::Analysis {
                    analysis: page_data.url,
                }),
                Request::CollectData => None,
            }
        }
    }

    #[test]
    fn test_request_wire_format() {
        let ping = serde_json::to_value(Request::Ping).unwrap();
        assert_eq!(ping, serde_json::json!({"action": "ping"}));

        let collect: Request = serde_json::from_str(r#"{"action": "collectData"}"#).unwrap();
        assert_eq!(collect, Request::CollectData);

        let analyze = Request::AnalyzePage {
            page_data: Box::new(PageSnapshot {
                url: "https://example.com/".to_string(),
                ..PageSnapshot::default()
            }),
        };
        let value = serde_json::to_value(&analyze).unwrap();
        assert_eq!(value["action"], "analyzePage");
        assert_eq!(value["pageData"]["url"], "https://example.com/");
        assert_eq!(analyze.action(), "analyzePage");
    }

    #[test]
    fn test_response_wire_format() {
        let pong: Response = serde_json::from_str(r#"{"pong": true}"#).unwrap();
        assert_eq!(pong, Response::Pong { pong: true });

        let analysis: Response = serde_json::from_str(r#"{"analysis": "Secure"}"#).unwrap();
        assert_eq!(
            analysis,
            Response::Analysis {
                analysis: "Secure".to_string()
            }
        );

        let snapshot = serde_json::to_value(PageSnapshot::default()).unwrap();
        let parsed: Response = serde_json::from_value(snapshot).unwrap();
        assert!(matches!(parsed, Response::Snapshot(_)));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (endpoint, inbox) = channel(8);
        tokio::spawn(inbox.serve(Arc::new(Echo)));

        let response = endpoint.request(Request::Ping).await.unwrap();
        assert_eq!(response, Response::Pong { pong: true });

        let response = endpoint
            .request(Request::AnalyzePage {
                page_data: Box::new(PageSnapshot {
                    url: "https://example.com/a".to_string(),
                    ..PageSnapshot::default()
                }),
            })
            .await
            .unwrap();
        assert_eq!(
            response,
            Response::Analysis {
                analysis: "https://example.com/a".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unanswered_request() {
        let (endpoint, inbox) = channel(8);
        tokio::spawn(inbox.serve(Arc::new(Echo)));

        let err = endpoint.request(Request::CollectData).await.unwrap_err();
        assert!(matches!(err, Error::NoResponse("collectData")));
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (endpoint, inbox) = channel(8);
        drop(inbox);

        assert!(endpoint.is_closed());
        let err = endpoint.request(Request::Ping).await.unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }
}

//! TCP bootstrap for a single two-party negotiation

use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use crate::error::{BargainError, Result};

use super::codec::ActionCodec;

/// A TCP connection speaking negotiation records
pub type RecordStream = Framed<TcpStream, ActionCodec>;

/// Bind the seller's listening socket
pub async fn listen(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| BargainError::NetworkConnection(format!("bind {}: {}", addr, e)))?;

    let local = listener
        .local_addr()
        .map_err(|e| BargainError::NetworkConnection(e.to_string()))?;
    tracing::info!("Listening on {}", local);

    Ok(listener)
}

/// Wait for exactly one buyer to connect
pub async fn accept_one(listener: &TcpListener, wait: Duration) -> Result<RecordStream> {
    let (stream, addr) = tokio::time::timeout(wait, listener.accept())
        .await
        .map_err(|_| {
            BargainError::PeerTimeout(format!("no buyer connected within {:?}", wait))
        })?
        .map_err(|e| BargainError::NetworkConnection(e.to_string()))?;

    tracing::info!("New connection from {}", addr);
    configure(&stream);
    Ok(Framed::new(stream, ActionCodec::new()))
}

/// Connect to the seller
pub async fn connect(addr: &str, wait: Duration) -> Result<RecordStream> {
    let stream = tokio::time::timeout(wait, TcpStream::connect(addr))
        .await
        .map_err(|_| BargainError::PeerTimeout(format!("connect to {} timed out", addr)))?
        .map_err(|e| BargainError::NetworkConnection(format!("connect {}: {}", addr, e)))?;

    tracing::info!("Connected to {}", addr);
    configure(&stream);
    Ok(Framed::new(stream, ActionCodec::new()))
}

fn configure(stream: &TcpStream) {
    // One small record per turn
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Could not set TCP_NODELAY: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::Action;
    use crate::transport::WireRecord;
    use futures::{SinkExt, StreamExt};

    #[tokio::test]
    async fn test_connect_and_exchange_record() {
        let listener = listen("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let mut stream = accept_one(&listener, Duration::from_secs(5)).await.unwrap();
            stream.next().await.unwrap().unwrap().unwrap()
        });

        let mut client = connect(&addr, Duration::from_secs(5)).await.unwrap();
        client
            .send(WireRecord::new(&Action::counter(160_000, "hello"), 1))
            .await
            .unwrap();

        let received = server.await.unwrap();
        assert_eq!(received.round, 1);
        assert_eq!(received.into_action(), Action::counter(160_000, "hello"));
    }

    #[tokio::test]
    async fn test_accept_times_out() {
        let listener = listen("127.0.0.1:0").await.unwrap();

        let result = accept_one(&listener, Duration::from_millis(20)).await;

        assert!(matches!(result, Err(BargainError::PeerTimeout(_))));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = listen("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = connect(&addr, Duration::from_secs(1)).await;

        assert!(result.is_err());
    }
}

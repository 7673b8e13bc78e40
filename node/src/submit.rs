// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Submit sequence
//!
//! Many producers, one consumer. Producers block while the queue is full,
//! up to `submit_timeout`, then get `ProxyError::SubmitTimeout`. A
//! transaction is never dropped silently.

use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use lachesis_proxy::Transaction;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio_stream::wrappers::ReceiverStream;

use crate::errors::{ProxyError, Result};

pub fn submit_channel(capacity: usize, timeout: Duration) -> (SubmitHandle, SubmitStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        SubmitHandle { tx, timeout },
        SubmitStream {
            inner: ReceiverStream::new(rx),
        },
    )
}

/// Producer side. Cheap to clone, one per inbound connection.
#[derive(Debug, Clone)]
pub struct SubmitHandle {
    tx: mpsc::Sender<Transaction>,
    timeout: Duration,
}

impl SubmitHandle {
    pub async fn submit(&self, tx: Transaction) -> Result<()> {
        match self.tx.send_timeout(tx, self.timeout).await {
            Ok(()) => {
                metrics::counter!("lachesis_transactions_submitted_total", 1);
                Ok(())
            }
            Err(SendTimeoutError::Timeout(_)) => {
                tracing::warn!("Submit queue full for {:?}, rejecting transaction", self.timeout);
                metrics::counter!("lachesis_submit_timeouts_total", 1);
                Err(ProxyError::SubmitTimeout(self.timeout))
            }
            Err(SendTimeoutError::Closed(_)) => Err(ProxyError::SubmitClosed),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Consumer side, drained by the consensus core.
#[derive(Debug)]
pub struct SubmitStream {
    inner: ReceiverStream<Transaction>,
}

impl Stream for SubmitStream {
    type Item = Transaction;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Transaction>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Queue owned by an adapter: the handle stays, the stream is handed out once.
#[derive(Debug)]
pub struct SubmitQueue {
    handle: SubmitHandle,
    stream: Mutex<Option<SubmitStream>>,
}

impl SubmitQueue {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        let (handle, stream) = submit_channel(capacity, timeout);
        Self {
            handle,
            stream: Mutex::new(Some(stream)),
        }
    }

    pub fn handle(&self) -> SubmitHandle {
        self.handle.clone()
    }

    pub fn take_stream(&self) -> Option<SubmitStream> {
        self.stream
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_delivers_in_order_single_producer() {
        let (handle, mut stream) = submit_channel(8, Duration::from_millis(100));
        for i in 0..3u8 {
            handle.submit(vec![i]).await.unwrap();
        }
        for i in 0..3u8 {
            assert_eq!(stream.next().await, Some(vec![i]));
        }
    }

    #[tokio::test]
    async fn test_full_queue_times_out() {
        let (handle, _stream) = submit_channel(1, Duration::from_millis(50));
        handle.submit(b"first".to_vec()).await.unwrap();

        let err = handle.submit(b"second".to_vec()).await.unwrap_err();
        assert_eq!(handle.timeout(), Duration::from_millis(50));
        assert!(matches!(err, ProxyError::SubmitTimeout(d) if d == handle.timeout()));
    }

    #[tokio::test]
    async fn test_blocked_producer_resumes_when_drained() {
        let (handle, mut stream) = submit_channel(1, Duration::from_secs(2));
        handle.submit(b"first".to_vec()).await.unwrap();

        let producer = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.submit(b"second".to_vec()).await })
        };

        assert_eq!(stream.next().await, Some(b"first".to_vec()));
        producer.await.unwrap().unwrap();
        assert_eq!(stream.next().await, Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn test_closed_queue() {
        let (handle, stream) = submit_channel(4, Duration::from_millis(50));
        drop(stream);
        assert!(matches!(
            handle.submit(vec![1]).await,
            Err(ProxyError::SubmitClosed)
        ));
    }

    #[test]
    fn test_stream_taken_once() {
        let queue = SubmitQueue::new(4, Duration::from_millis(10));
        assert!(queue.take_stream().is_some());
        assert!(queue.take_stream().is_none());
    }
}

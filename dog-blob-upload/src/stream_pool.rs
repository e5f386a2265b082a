use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

use crate::cancel::ensure_not_cancelled;
use crate::{BlobResult, PoolConfig};

/// Hands out ready-to-read in-memory streams.
///
/// The caller owns the returned stream; dropping it releases the buffer.
#[async_trait]
pub trait MemoryStreamPool: Send + Sync {
    /// Stream over a copy of `bytes`
    async fn get_bytes(&self, bytes: &[u8], cancel: Option<&CancellationToken>) -> BlobResult<PooledStream>;

    /// Stream over the UTF-8 encoding of `text`
    async fn get_text(&self, text: &str, cancel: Option<&CancellationToken>) -> BlobResult<PooledStream> {
        self.get_bytes(text.as_bytes(), cancel).await
    }
}

/// In-memory stream over a pooled buffer.
///
/// Yields the buffer in fixed-size chunks and hands the buffer back to its
/// pool when dropped, whether or not it was read to the end.
pub struct PooledStream {
    buffer: Vec<u8>,
    position: usize,
    chunk_size: usize,
    pool: Option<Arc<PoolShared>>,
}

impl PooledStream {
    /// A stream that is not attached to any pool
    pub fn unpooled(buffer: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            buffer,
            position: 0,
            chunk_size: chunk_size.max(1),
            pool: None,
        }
    }

    /// Total length of the content
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes not yet yielded
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}

impl Stream for PooledStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.position >= this.buffer.len() {
            return Poll::Ready(None);
        }

        let end = (this.position + this.chunk_size).min(this.buffer.len());
        let chunk = Bytes::copy_from_slice(&this.buffer[this.position..end]);
        this.position = end;
        Poll::Ready(Some(Ok(chunk)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let chunks = self.remaining().div_ceil(self.chunk_size);
        (chunks, Some(chunks))
    }
}

impl Drop for PooledStream {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(std::mem::take(&mut self.buffer));
        }
    }
}

impl std::fmt::Debug for PooledStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledStream")
            .field("len", &self.buffer.len())
            .field("position", &self.position)
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

struct PoolShared {
    idle: Mutex<Vec<Vec<u8>>>,
    outstanding: AtomicUsize,
    config: PoolConfig,
}

impl PoolShared {
    fn acquire(&self, len: usize) -> Vec<u8> {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        let mut buffer = self.idle.lock().pop().unwrap_or_default();
        buffer.clear();
        buffer.reserve(len);
        buffer
    }

    fn release(&self, mut buffer: Vec<u8>) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        if buffer.capacity() > self.config.max_retained_capacity {
            return;
        }
        buffer.clear();
        let mut idle = self.idle.lock();
        if idle.len() < self.config.max_retained {
            idle.push(buffer);
        }
    }
}

/// Pool that recycles buffers between uploads
#[derive(Clone)]
pub struct RecyclingStreamPool {
    shared: Arc<PoolShared>,
}

impl RecyclingStreamPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                idle: Mutex::new(Vec::new()),
                outstanding: AtomicUsize::new(0),
                config,
            }),
        }
    }

    /// Streams handed out and not yet dropped
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }

    /// Buffers waiting for reuse
    pub fn idle(&self) -> usize {
        self.shared.idle.lock().len()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }
}

impl Default for RecyclingStreamPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

#[async_trait]
impl MemoryStreamPool for RecyclingStreamPool {
    async fn get_bytes(&self, bytes: &[u8], cancel: Option<&CancellationToken>) -> BlobResult<PooledStream> {
        ensure_not_cancelled(cancel)?;

        let mut buffer = self.shared.acquire(bytes.len());
        buffer.extend_from_slice(bytes);

        Ok(PooledStream {
            buffer,
            position: 0,
            chunk_size: self.shared.config.chunk_size.max(1),
            pool: Some(self.shared.clone()),
        })
    }
}

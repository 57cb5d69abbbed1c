use super::Value;

use std::{
    collections::VecDeque,
    fmt,
    pin::Pin,
    task::{Context, Poll},
};
use tokio_stream::{Stream, StreamExt};

/// A stream of rows returned by a driver.
///
/// Rows are either fully buffered or pulled from an underlying cursor.
/// Dropping the stream releases the cursor.
#[derive(Default)]
pub struct RowStream {
    buffer: VecDeque<Vec<Value>>,
    stream: Option<DynStream>,
}

type DynStream = Pin<Box<dyn Stream<Item = crate::Result<Vec<Value>>> + Send + 'static>>;

impl RowStream {
    pub fn from_vec(rows: Vec<Vec<Value>>) -> Self {
        Self {
            buffer: rows.into(),
            stream: None,
        }
    }

    pub fn from_stream<T>(stream: T) -> Self
    where
        T: Stream<Item = crate::Result<Vec<Value>>> + Send + 'static,
    {
        Self {
            buffer: VecDeque::new(),
            stream: Some(Box::pin(stream)),
        }
    }

    /// Returns the next row in the stream
    pub async fn next(&mut self) -> Option<crate::Result<Vec<Value>>> {
        StreamExt::next(self).await
    }

    pub async fn collect(mut self) -> crate::Result<Vec<Vec<Value>>> {
        let mut ret = Vec::with_capacity(self.buffer.len());

        while let Some(row) = self.next().await {
            ret.push(row?);
        }

        Ok(ret)
    }
}

impl Stream for RowStream {
    type Item = crate::Result<Vec<Value>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(row) = self.buffer.pop_front() {
            return Poll::Ready(Some(Ok(row)));
        }

        match self.stream.as_mut() {
            Some(stream) => stream.as_mut().poll_next(cx),
            None => Poll::Ready(None),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = self.buffer.len();
        match &self.stream {
            Some(stream) => {
                let (low, high) = stream.size_hint();
                (buffered + low, high.map(|high| high + buffered))
            }
            None => (buffered, Some(buffered)),
        }
    }
}

impl fmt::Debug for RowStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStream")
            .field("buffered", &self.buffer.len())
            .field("streaming", &self.stream.is_some())
            .finish()
    }
}

impl From<Vec<Vec<Value>>> for RowStream {
    fn from(rows: Vec<Vec<Value>>) -> Self {
        Self::from_vec(rows)
    }
}

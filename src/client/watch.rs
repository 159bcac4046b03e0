use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};

use super::{decode_body, tenant_path, PermifyClient, PermifyError};
use crate::models::watch::{DataChanges, WatchFrame, WatchPermissionsRequest, WatchRequest};

/// Change batches in commit order. Ends after the first error.
pub type ChangeStream = BoxStream<'static, Result<DataChanges, PermifyError>>;

pub struct WatchService<'a> {
    client: &'a PermifyClient,
}

impl<'a> WatchService<'a> {
    pub(crate) fn new(client: &'a PermifyClient) -> Self {
        Self { client }
    }

    pub async fn changes(&self, request: &WatchRequest) -> Result<ChangeStream, PermifyError> {
        let path = tenant_path(&request.tenant_id, "watch")?;
        let response = self.client.post_stream(&path, request).await?;

        Ok(decode_frames(response.bytes_stream()))
    }

    /// Same stream as [`changes`](Self::changes), with every batch narrowed to
    /// tuple changes on `entity_type` through `permission`. Batches are still
    /// yielded when nothing matches so callers can track the snap token.
    pub async fn permission_changes(
        &self,
        request: &WatchPermissionsRequest,
    ) -> Result<ChangeStream, PermifyError> {
        let watch = WatchRequest::new(&request.tenant_id, request.snap_token.clone());
        let changes = self.changes(&watch).await?;

        let entity_type = request.entity_type.clone();
        let permission = request.permission.clone();

        Ok(changes
            .map(move |item| item.map(|batch| batch.retain_touching(&entity_type, &permission)))
            .boxed())
    }
}

#[derive(Debug, Default)]
struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<BytesMut> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        Some(line)
    }

    fn take_rest(&mut self) -> Option<BytesMut> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split())
        }
    }

    fn clear(&mut self) {
        self.buf.clear();
    }
}

fn parse_frame(line: &[u8]) -> Result<Option<DataChanges>, PermifyError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let frame: WatchFrame = decode_body(line)?;
    if let Some(err) = frame.error {
        return Err(PermifyError::Stream {
            code: err.code,
            message: err.message,
        });
    }

    Ok(frame.result.map(|result| result.changes))
}

struct FrameReader<S> {
    chunks: S,
    lines: LineBuffer,
    done: bool,
}

impl<S> FrameReader<S> {
    fn finish(&mut self) {
        self.done = true;
        self.lines.clear();
    }
}

/// Splits a chunked byte stream into newline-delimited JSON frames.
pub(crate) fn decode_frames<S, E>(chunks: S) -> ChangeStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<PermifyError> + Send + 'static,
{
    let reader = FrameReader {
        chunks: Box::pin(chunks),
        lines: LineBuffer::default(),
        done: false,
    };

    stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(line) = reader.lines.next_line() {
                match parse_frame(&line) {
                    Ok(Some(changes)) => return Some((Ok(changes), reader)),
                    Ok(None) => continue,
                    Err(err) => {
                        reader.finish();
                        return Some((Err(err), reader));
                    }
                }
            }

            if reader.done {
                return None;
            }

            match reader.chunks.next().await {
                Some(Ok(chunk)) => reader.lines.extend(&chunk),
                Some(Err(err)) => {
                    reader.finish();
                    return Some((Err(err.into()), reader));
                }
                None => {
                    reader.done = true;
                    let rest = reader.lines.take_rest()?;
                    return match parse_frame(&rest) {
                        Ok(Some(changes)) => Some((Ok(changes), reader)),
                        Ok(None) => None,
                        Err(err) => Some((Err(err), reader)),
                    };
                }
            }
        }
    })
    .boxed()
}

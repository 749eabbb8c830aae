//! Pre/post-processing against an external processor endpoint.
//!
//! The text travels in numbered chunks under one opaque job token; the
//! processed text comes back the same way and is reassembled by index.

use std::collections::BTreeMap;

use glossa_messaging::{
    ConnectParams, ProcKind, ProcReq, TlsMode, WireMsg, WsConnection,
};
use tracing::debug;

use crate::error::ClientError;

/// Upper bound on one chunk, in characters.
const CHUNK_CHARS: usize = 8 * 1024;

/// Run `text` through the processor at `uri`.
///
/// # Errors
///
/// Returns [`ClientError`] when the endpoint is unreachable or the
/// processor reports a failure or inconsistent chunking.
pub async fn process_text(
    uri: &str,
    tls: TlsMode,
    kind: ProcKind,
    lang: &str,
    text: &str,
) -> Result<String, ClientError> {
    let chunks = chunk_chars(text, CHUNK_CHARS);
    let num_chunks = u32::try_from(chunks.len())
        .map_err(|_| ClientError::Processor("text needs too many chunks".to_owned()))?;
    let token = format!("{:016x}", fastrand::u64(..));

    let mut conn = WsConnection::connect(&ConnectParams::plain(uri).with_tls(tls)).await?;
    for (idx, chunk) in chunks.iter().enumerate() {
        let req = ProcReq::new(
            kind,
            token.clone(),
            lang,
            u32::try_from(idx).expect("chunk count fits u32"),
            num_chunks,
            chunk.clone(),
        );
        conn.send(&WireMsg::ProcReq(req)).await?;
    }
    debug!(%token, chunks = chunks.len(), "processor request sent");

    let mut received: BTreeMap<u32, String> = BTreeMap::new();
    while received.len() < chunks.len() {
        match conn.recv().await? {
            Some(WireMsg::ProcResp(resp)) => {
                resp.ensure_usable()
                    .map_err(|e| ClientError::Processor(e.to_string()))?;
                if resp.job_id != token {
                    return Err(ClientError::Processor(format!(
                        "response for foreign job {}",
                        resp.job_id
                    )));
                }
                received.insert(resp.chunk_idx, resp.chunk);
            }
            Some(other) => {
                return Err(ClientError::Processor(format!(
                    "unexpected message type {:?}",
                    other.msg_type()
                )));
            }
            None => {
                return Err(ClientError::Processor(
                    "processor closed the connection early".to_owned(),
                ));
            }
        }
    }
    let _ = conn.close().await;

    Ok(received.into_values().collect())
}

/// Split on character boundaries into chunks of at most `limit` chars.
fn chunk_chars(text: &str, limit: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;
    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == limit {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_preserves_the_text() {
        let text = "abcdefg".repeat(100);
        let chunks = chunk_chars(&text, 64);
        assert!(chunks.iter().all(|c| c.chars().count() <= 64));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn empty_text_is_one_empty_chunk() {
        assert_eq!(chunk_chars("", 10), vec![String::new()]);
    }
}

//! Response envelopes for the platform.

use crate::event::{BodyEncoding, EdgeResponse, HeaderEntry, HeaderMultimap};
use crate::pipeline::{TransformOutcome, UpstreamStatus};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Strong ETag for content.
///
/// SHA-256 of the bytes, first 16 bytes hex-encoded, quoted.
pub fn etag(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let hash = hasher.finalize();
    format!("\"{}\"", hex::encode(&hash[..16]))
}

/// Response for a transformed image.
///
/// Only `ETag` and `Content-Type` are set. Origin caching and validator
/// headers describe the untransformed entity and are not forwarded.
pub fn build_transformed(upstream: &UpstreamStatus, content_type: &str, bytes: &[u8]) -> EdgeResponse {
    let mut headers = HeaderMultimap::new();
    headers.insert("etag".to_string(), vec![HeaderEntry::new("ETag", etag(bytes))]);
    headers.insert(
        "content-type".to_string(),
        vec![HeaderEntry::new("Content-Type", content_type)],
    );

    EdgeResponse {
        body_encoding: BodyEncoding::Base64,
        body: STANDARD.encode(bytes),
        status: upstream.status,
        status_description: upstream.reason.clone(),
        headers,
    }
}

/// The fixed response for a failed upstream fetch.
pub fn gateway_timeout() -> EdgeResponse {
    EdgeResponse {
        body_encoding: BodyEncoding::Text,
        body: "Gateway Timed Out".to_string(),
        status: 504,
        status_description: "Gateway Timeout".to_string(),
        headers: HeaderMultimap::new(),
    }
}

/// `None` means the original request should go through.
pub fn render(outcome: &TransformOutcome) -> Option<EdgeResponse> {
    match outcome {
        TransformOutcome::Transformed {
            upstream,
            content_type,
            bytes,
        } => Some(build_transformed(upstream, content_type, bytes)),
        TransformOutcome::GatewayTimeout => Some(gateway_timeout()),
        TransformOutcome::PassThrough => None,
    }
}

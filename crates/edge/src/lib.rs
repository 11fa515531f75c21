//! Edge image interceptor.
//!
//! Sits between a CDN and an origin store. Qualifying GET requests for
//! images are fetched from the origin, optionally resized to the caller's
//! `width`/`height`, re-encoded into the best format the caller accepts,
//! and returned as a complete response. Anything that is not clearly safe
//! to transform is handed back to the platform untouched.
//!
//! ```text
//! event ─▶ dispatch ─┬─ ineligible ──────────────────────────▶ request (pass-through)
//!                    └─ negotiate ─▶ origin ─▶ pipeline ─┬─▶ response (transformed)
//!                                                        ├─▶ request  (pass-through)
//!                                                        └─▶ response (504)
//! ```

mod dispatch;
mod error;
mod event;
mod headers;
mod negotiate;
mod origin;
mod pipeline;
mod response;

#[cfg(test)]
mod testing;

pub use dispatch::Handler;
pub use error::{Disposition, EdgeError};
pub use event::{
    extract_request, BodyEncoding, EdgeResponse, HandlerOutput, HeaderEntry, HeaderMultimap,
    InterceptedRequest,
};
pub use headers::{project, set_first_value, HeaderView};
pub use negotiate::{negotiate, parse_capabilities, parse_size, CapabilitySet, DesiredSize, Negotiation};
pub use origin::{resolve, resolve_request, CustomOrigin, ObjectStoreOrigin, OriginDescriptor, ResolvedUpstream};
pub use pipeline::{Candidate, EncodeFn, Pipeline, TransformOutcome, TransformPolicy, UpstreamStatus};
pub use response::{build_transformed, etag, gateway_timeout, render};

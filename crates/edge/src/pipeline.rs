//! Fetch, resize, re-encode and size-check one image.
//!
//! ```text
//! fetch ─▶ classify ─▶ decode+orient ─▶ resize? ─▶ guard ─▶ optimize ─▶ guard ─▶ Transformed
//!   │         │                            │                    │          │
//!   504       pass-through                 keep bytes          keep bytes  pass-through
//! ```
//!
//! Nothing here retries. Each stage either succeeds, degrades to the
//! previous stage's bytes, or gives up on the whole transformation.

use crate::error::{Disposition, EdgeError};
use crate::negotiate::{CapabilitySet, DesiredSize, Negotiation};
use edgepix_core::EdgeConfig;
use edgepix_image::{decode_oriented, resize_to_box, to_rgb, DynamicImage, EncodeOptions, ImageError, OutputFormat};
use edgepix_origin_client::{FetchRequest, FetchedResource, OriginFetcher};
use edgepix_telemetry::Timer;
use tracing::{debug, info, warn};

/// Upstream content types the pipeline will touch.
const TRANSFORMABLE_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// Used when the upstream sent no content type and nothing was re-encoded.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Encoder seam; tests swap in one that fails on demand.
pub type EncodeFn = fn(&DynamicImage, OutputFormat, &EncodeOptions) -> edgepix_image::Result<Vec<u8>>;

/// One entry in the format preference list.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub format: OutputFormat,
    /// Whether the caller's capabilities allow this format
    pub accepted: fn(&CapabilitySet) -> bool,
    /// Composite alpha onto white first (lossy encoders)
    pub flatten: bool,
}

impl Candidate {
    /// AVIF, then WebP, then PNG. PNG is always accepted.
    pub fn preference_order() -> Vec<Candidate> {
        vec![
            Candidate {
                format: OutputFormat::Avif,
                accepted: |caps| caps.accepts_avif,
                flatten: true,
            },
            Candidate {
                format: OutputFormat::WebP,
                accepted: |caps| caps.accepts_webp,
                flatten: false,
            },
            Candidate {
                format: OutputFormat::Png,
                accepted: |_| true,
                flatten: false,
            },
        ]
    }
}

/// Limits and encoder settings for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPolicy {
    pub max_output_bytes: usize,
    pub encode_options: EncodeOptions,
}

impl Default for TransformPolicy {
    fn default() -> Self {
        Self::from(&EdgeConfig::default())
    }
}

impl From<&EdgeConfig> for TransformPolicy {
    fn from(config: &EdgeConfig) -> Self {
        Self {
            max_output_bytes: config.transform.max_output_bytes,
            encode_options: EncodeOptions {
                avif_speed: config.encoding.avif_speed,
                avif_quality: config.encoding.avif_quality,
            },
        }
    }
}

/// Status line of the upstream response a transformation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamStatus {
    pub status: u16,
    pub reason: String,
}

impl From<&FetchedResource> for UpstreamStatus {
    fn from(fetched: &FetchedResource) -> Self {
        Self {
            status: fetched.status,
            reason: fetched.reason.clone(),
        }
    }
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    Transformed {
        upstream: UpstreamStatus,
        content_type: String,
        bytes: Vec<u8>,
    },
    PassThrough,
    GatewayTimeout,
}

/// The transformation pipeline. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    policy: TransformPolicy,
    candidates: Vec<Candidate>,
    encoder: EncodeFn,
    available: fn(OutputFormat) -> bool,
}

impl Pipeline {
    pub fn new(policy: TransformPolicy) -> Self {
        Self {
            policy,
            candidates: Candidate::preference_order(),
            encoder: edgepix_image::encode,
            available: |format| format.is_available(),
        }
    }

    /// Replace the encoder and the availability check.
    #[must_use]
    pub fn with_encoder(mut self, encoder: EncodeFn, available: fn(OutputFormat) -> bool) -> Self {
        self.encoder = encoder;
        self.available = available;
        self
    }

    pub fn policy(&self) -> &TransformPolicy {
        &self.policy
    }

    /// Fetch and transform, folding every failure into an outcome.
    pub async fn run<F: OriginFetcher>(
        &self,
        fetcher: &F,
        request: &FetchRequest,
        negotiation: &Negotiation,
    ) -> TransformOutcome {
        let fetched = match self.fetch(fetcher, request).await {
            Ok(fetched) => fetched,
            Err(err) => return settle(err),
        };

        let upstream = UpstreamStatus::from(&fetched);
        match self.transform(fetched, *negotiation).await {
            Ok((content_type, bytes)) => TransformOutcome::Transformed {
                upstream,
                content_type,
                bytes,
            },
            Err(err) => settle(err),
        }
    }

    /// One GET, then reject anything that is not a 200 PNG or JPEG.
    pub async fn fetch<F: OriginFetcher>(
        &self,
        fetcher: &F,
        request: &FetchRequest,
    ) -> Result<FetchedResource, EdgeError> {
        let _timer = Timer::start("pipeline.fetch_ms");
        let fetched = fetcher.fetch(request).await?;

        let content_type = fetched.content_type();
        let usable = fetched.status == 200
            && content_type.is_some_and(|ct| TRANSFORMABLE_TYPES.contains(&ct));

        if !usable {
            return Err(EdgeError::UnusableOriginResponse {
                status: fetched.status,
                content_type: content_type.map(str::to_string),
            });
        }

        debug!(url = %fetched.url, bytes = fetched.body.len(), "Fetched original image");
        Ok(fetched)
    }

    /// Run the CPU-bound stages off the async executor.
    pub async fn transform(
        &self,
        fetched: FetchedResource,
        negotiation: Negotiation,
    ) -> Result<(String, Vec<u8>), EdgeError> {
        let pipeline = self.clone();

        tokio::task::spawn_blocking(move || {
            pipeline.transform_blocking(&fetched.body, fetched.content_type(), &negotiation)
        })
        .await
        .unwrap_or_else(|e| Err(EdgeError::Internal(format!("transform task failed: {}", e))))
    }

    /// Resize, guard, optimize, guard. Returns the content type and bytes
    /// to serve.
    pub fn transform_blocking(
        &self,
        body: &[u8],
        upstream_content_type: Option<&str>,
        negotiation: &Negotiation,
    ) -> Result<(String, Vec<u8>), EdgeError> {
        let _timer = Timer::start("pipeline.transform_ms");

        let mut content_type = upstream_content_type
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let mut bytes = body.to_vec();
        let mut image = decode_oriented(body);

        if let Err(e) = &image {
            warn!(error = %e, "Could not decode upstream image");
        }

        if let Some(size) = negotiation.size {
            match self.resize(&image, size) {
                Ok((resized, encoded)) => {
                    debug!(bytes = encoded.len(), "Resized");
                    content_type = OutputFormat::PngFast.mime_type().to_string();
                    bytes = encoded;
                    image = Ok(resized);
                }
                Err(err) => warn!(error = %err, "Resize failed, keeping original bytes"),
            }
        }

        self.check_size(bytes.len(), "resize")?;

        match image
            .map_err(|e| EdgeError::OptimizeFailure(e.to_string()))
            .and_then(|img| self.optimize(&img, &negotiation.capabilities))
        {
            Ok((format, encoded)) => {
                content_type = format.mime_type().to_string();
                bytes = encoded;
            }
            Err(err) => warn!(
                error = %err,
                content_type = %content_type,
                "Optimization failed, keeping current bytes"
            ),
        }

        self.check_size(bytes.len(), "optimize")?;

        Ok((content_type, bytes))
    }

    fn resize(
        &self,
        image: &Result<DynamicImage, ImageError>,
        size: DesiredSize,
    ) -> Result<(DynamicImage, Vec<u8>), EdgeError> {
        let image = image
            .as_ref()
            .map_err(|e| EdgeError::ResizeFailure(ImageError::InvalidData(e.to_string())))?;

        let resized = to_rgb(&resize_to_box(image, size.width(), size.height()));
        let encoded = (self.encoder)(&resized, OutputFormat::PngFast, &self.policy.encode_options)
            .map_err(EdgeError::ResizeFailure)?;

        Ok((resized, encoded))
    }

    /// First candidate that is accepted, available and encodes wins.
    fn optimize(&self, image: &DynamicImage, caps: &CapabilitySet) -> Result<(OutputFormat, Vec<u8>), EdgeError> {
        let mut attempted = Vec::new();

        for candidate in &self.candidates {
            if !(candidate.accepted)(caps) || !(self.available)(candidate.format) {
                continue;
            }

            let flattened;
            let source = if candidate.flatten {
                flattened = to_rgb(image);
                &flattened
            } else {
                image
            };

            match (self.encoder)(source, candidate.format, &self.policy.encode_options) {
                Ok(encoded) => {
                    debug!(format = ?candidate.format, bytes = encoded.len(), "Encoded");
                    return Ok((candidate.format, encoded));
                }
                Err(e) => {
                    warn!(format = ?candidate.format, error = %e, "Encoder failed, trying next format");
                    attempted.push(format!("{:?}", candidate.format));
                }
            }
        }

        Err(EdgeError::OptimizeFailure(format!(
            "no encoder succeeded (tried: {})",
            attempted.join(", ")
        )))
    }

    fn check_size(&self, size: usize, stage: &'static str) -> Result<(), EdgeError> {
        let limit = self.policy.max_output_bytes;
        if size > limit {
            info!(stage, bytes = size, limit, "Output over size ceiling");
            return Err(EdgeError::OversizeOutput { size, limit });
        }
        Ok(())
    }
}

fn settle(err: EdgeError) -> TransformOutcome {
    match err.disposition() {
        Disposition::GatewayTimeout => {
            warn!(error = %err, kind = err.kind(), "Upstream fetch failed");
            TransformOutcome::GatewayTimeout
        }
        _ => {
            info!(error = %err, kind = err.kind(), "Falling back to pass-through");
            TransformOutcome::PassThrough
        }
    }
}

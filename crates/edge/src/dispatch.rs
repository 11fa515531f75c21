//! Entry point: one platform event in, one decision out.

use crate::error::EdgeError;
use crate::event::{extract_request, HandlerOutput, InterceptedRequest};
use crate::headers::{set_first_value, HeaderView};
use crate::negotiate::{negotiate, Negotiation};
use crate::origin::{resolve_request, OriginDescriptor};
use crate::pipeline::{Pipeline, TransformPolicy};
use crate::response::render;
use edgepix_core::EdgeConfig;
use edgepix_origin_client::OriginFetcher;
use edgepix_telemetry::{metrics, Timer};
use serde_json::Value;
use std::fmt::Display;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Handles platform events with a given upstream fetcher.
///
/// Holds no per-request state; one handler serves concurrent invocations.
pub struct Handler<F> {
    fetcher: F,
    config: EdgeConfig,
    pipeline: Pipeline,
}

impl<F: OriginFetcher> Handler<F> {
    pub fn new(fetcher: F, config: EdgeConfig) -> Self {
        let pipeline = Pipeline::new(TransformPolicy::from(&config));
        Self {
            fetcher,
            config,
            pipeline,
        }
    }

    /// Swap the pipeline, e.g. for one with a different encoder.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Handle one event.
    ///
    /// `None` when the event has no usable request. Otherwise either the
    /// request to let through or a response to serve. Never fails.
    pub async fn handle(&self, event: &Value) -> Option<HandlerOutput> {
        let span = info_span!("invocation", id = %Uuid::new_v4());

        async {
            let _timer = Timer::start("handler.duration_ms");

            let request = match extract_request(event) {
                Ok(request) => request,
                Err(err) => {
                    debug!(error = %err, "Nothing to do");
                    metrics().increment("outcome.no_op");
                    return None;
                }
            };

            let output = self.process(request).await;
            record_outcome(&output);
            Some(output)
        }
        .instrument(span)
        .await
    }

    async fn process(&self, request: InterceptedRequest) -> HandlerOutput {
        let headers = HeaderView::from(&request.headers);
        let negotiation = negotiate(&request.querystring, &headers);

        if let Err(err) = self.check_eligible(&request, &negotiation) {
            return self.pass_through(request, &err);
        }

        let upstream = match resolve_request(&request, &headers) {
            Ok(upstream) => upstream,
            Err(err) => return self.pass_through(request, &err),
        };

        info!(
            uri = %request.uri,
            url = %upstream.url,
            size = ?negotiation.size,
            webp = negotiation.capabilities.accepts_webp,
            avif = negotiation.capabilities.accepts_avif,
            "Transforming"
        );

        let outcome = self
            .pipeline
            .run(&self.fetcher, &upstream.into_fetch_request(), &negotiation)
            .await;

        match render(&outcome) {
            Some(response) => HandlerOutput::Response(response),
            None => self.pass_through(request, &"transformation abandoned"),
        }
    }

    /// GET, an allowed extension, and something to do.
    fn check_eligible(&self, request: &InterceptedRequest, negotiation: &Negotiation) -> Result<(), EdgeError> {
        if !request.is_get() {
            return Err(EdgeError::IneligibleRequest("method is not GET"));
        }
        if !request.has_extension(&self.config.transform.allowed_extensions) {
            return Err(EdgeError::IneligibleRequest("extension not allowed"));
        }
        if !negotiation.wants_transform() {
            return Err(EdgeError::IneligibleRequest(
                "no size requested and no modern format accepted",
            ));
        }
        Ok(())
    }

    /// Hand the request back, pointing an existing `host` header at the origin.
    fn pass_through(&self, mut request: InterceptedRequest, reason: &dyn Display) -> HandlerOutput {
        if self.config.transform.rewrite_host_on_pass_through {
            if let Ok(origin) = OriginDescriptor::from_value(&request.origin) {
                let domain = origin.domain().to_string();
                if set_first_value(&mut request.headers, "host", &domain) {
                    debug!(host = %domain, "Rewrote host header");
                }
            }
        }

        debug!(uri = %request.uri, reason = %reason, "Passing request through");
        HandlerOutput::Request(request)
    }
}

fn record_outcome(output: &HandlerOutput) {
    let name = match output {
        HandlerOutput::Request(_) => "outcome.pass_through",
        HandlerOutput::Response(response) if response.status == 504 => "outcome.gateway_timeout",
        HandlerOutput::Response(_) => "outcome.transformed",
    };
    metrics().increment(name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::BodyEncoding;
    use crate::response::etag;
    use crate::testing::{bloated_webp, image_resource, png_bytes, SpyFetcher};
    use edgepix_telemetry::SERIES_WINDOW;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use image::GenericImageView;
    use serde_json::json;

    fn s3_origin() -> Value {
        json!({
            "s3": {
                "authMethod": "none",
                "customHeaders": {},
                "domainName": "bucket.s3.amazonaws.com",
                "path": "/originals",
                "region": "us-east-1"
            }
        })
    }

    fn event_with(method: &str, uri: &str, querystring: &str, headers: Value) -> Value {
        json!({
            "Records": [{
                "cf": {
                    "request": {
                        "clientIp": "203.0.113.178",
                        "method": method,
                        "uri": uri,
                        "querystring": querystring,
                        "headers": headers,
                        "origin": s3_origin()
                    }
                }
            }]
        })
    }

    fn event(method: &str, uri: &str, querystring: &str) -> Value {
        event_with(
            method,
            uri,
            querystring,
            json!({ "accept-encoding": [{ "key": "Accept-Encoding", "value": "gzip" }] }),
        )
    }

    fn request_of(event: &Value) -> Value {
        event["Records"][0]["cf"]["request"].clone()
    }

    fn handler(fetcher: SpyFetcher) -> Handler<SpyFetcher> {
        Handler::new(fetcher, EdgeConfig::default())
    }

    fn as_json(output: &HandlerOutput) -> Value {
        serde_json::to_value(output).unwrap()
    }

    #[tokio::test]
    async fn test_non_get_passes_through_untouched() {
        let handler = handler(SpyFetcher::returning(image_resource(png_bytes(10, 10), "image/png")));

        for method in ["POST", "HEAD", "PUT"] {
            let event = event(method, "/a.png", "width=5");
            let output = handler.handle(&event).await.unwrap();
            assert_eq!(as_json(&output), request_of(&event));
        }
        assert_eq!(handler.fetcher().calls(), 0);
    }

    #[tokio::test]
    async fn test_disallowed_extension_passes_through_untouched() {
        let handler = handler(SpyFetcher::returning(image_resource(png_bytes(10, 10), "image/png")));

        for uri in ["/a.gif", "/a.webp", "/a", "/png"] {
            let event = event("GET", uri, "width=5");
            let output = handler.handle(&event).await.unwrap();
            assert_eq!(as_json(&output), request_of(&event));
        }
        assert_eq!(handler.fetcher().calls(), 0);
    }

    #[tokio::test]
    async fn test_nothing_requested_never_fetches() {
        let handler = handler(SpyFetcher::returning(image_resource(png_bytes(10, 10), "image/png")));

        let event = event_with(
            "GET",
            "/a.jpg",
            "width=abc&height=10",
            json!({ "accept": [{ "key": "Accept", "value": "image/png, image/webp" }] }),
        );
        let output = handler.handle(&event).await.unwrap();

        assert_eq!(as_json(&output), request_of(&event));
        assert_eq!(handler.fetcher().calls(), 0);
    }

    #[tokio::test]
    async fn test_pass_through_rewrites_host() {
        let handler = handler(SpyFetcher::timing_out());
        let event = event_with(
            "GET",
            "/a.png",
            "",
            json!({ "host": [{ "key": "Host", "value": "d111111abcdef8.cloudfront.net" }] }),
        );

        let output = handler.handle(&event).await.unwrap();
        let request = output.as_request().unwrap();
        assert_eq!(request.headers["host"][0].value, "bucket.s3.amazonaws.com");
        assert_eq!(request.headers["host"][0].key.as_deref(), Some("Host"));
        assert_eq!(request.extra["clientIp"], "203.0.113.178");
    }

    #[tokio::test]
    async fn test_host_rewrite_can_be_disabled() {
        let mut config = EdgeConfig::default();
        config.transform.rewrite_host_on_pass_through = false;
        let handler = Handler::new(SpyFetcher::timing_out(), config);

        let event = event_with(
            "GET",
            "/a.png",
            "",
            json!({ "host": [{ "key": "Host", "value": "d111111abcdef8.cloudfront.net" }] }),
        );
        let output = handler.handle(&event).await.unwrap();
        assert_eq!(as_json(&output), request_of(&event));
    }

    #[tokio::test]
    async fn test_timeout_yields_exact_504() {
        let handler = handler(SpyFetcher::timing_out());
        let output = handler.handle(&event("GET", "/a.png", "width=500")).await.unwrap();

        assert_eq!(
            as_json(&output),
            json!({
                "status": "504",
                "statusDescription": "Gateway Timeout",
                "bodyEncoding": "text",
                "body": "Gateway Timed Out",
                "headers": {}
            })
        );
        assert_eq!(handler.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn test_resizes_to_requested_width() {
        let handler = handler(SpyFetcher::returning(image_resource(png_bytes(2000, 1000), "image/png")));
        let output = handler
            .handle(&event("GET", "/photos/big.PNG", "width=500"))
            .await
            .unwrap();

        let response = output.as_response().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body_encoding, BodyEncoding::Base64);
        assert_eq!(response.headers.len(), 2);
        assert_eq!(response.headers["content-type"][0].value, "image/png");

        let bytes = STANDARD.decode(&response.body).unwrap();
        assert_eq!(response.headers["etag"][0].value, etag(&bytes));

        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.dimensions(), (500, 250));

        let sent = handler.fetcher().last_request().unwrap();
        assert_eq!(sent.url, "https://bucket.s3.amazonaws.com:443/originals/photos/big.PNG?width=500");
        assert!(sent.headers.contains(&("host".to_string(), "bucket.s3.amazonaws.com".to_string())));
        assert!(!sent.headers.iter().any(|(name, _)| name == "accept-encoding"));
    }

    #[tokio::test]
    async fn test_accept_webp_without_size() {
        let handler = handler(SpyFetcher::returning(image_resource(png_bytes(40, 30), "image/png")));
        let event = event_with(
            "GET",
            "/a.png",
            "",
            json!({ "accept": [{ "key": "Accept", "value": "image/webp,*/*" }] }),
        );

        let output = handler.handle(&event).await.unwrap();
        let response = output.as_response().unwrap();
        assert_eq!(response.headers["content-type"][0].value, "image/webp");

        let bytes = STANDARD.decode(&response.body).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.dimensions(), (40, 30));
    }

    #[tokio::test]
    async fn test_oversize_output_passes_through() {
        let mut config = EdgeConfig::default();
        config.transform.max_output_bytes = 64;
        config.transform.rewrite_host_on_pass_through = false;
        let handler = Handler::new(
            SpyFetcher::returning(image_resource(png_bytes(300, 300), "image/png")),
            config,
        );

        let event = event("GET", "/a.png", "width=200");
        let output = handler.handle(&event).await.unwrap();

        assert_eq!(as_json(&output), request_of(&event));
        assert_eq!(handler.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn test_optimized_output_over_ceiling_passes_through() {
        let mut config = EdgeConfig::default();
        config.transform.max_output_bytes = 4000;
        config.transform.rewrite_host_on_pass_through = false;
        let pipeline = Pipeline::new(TransformPolicy::from(&config))
            .with_encoder(bloated_webp, |_| true);
        let handler = Handler::new(
            SpyFetcher::returning(image_resource(png_bytes(8, 8), "image/png")),
            config,
        )
        .with_pipeline(pipeline);

        let event = event_with(
            "GET",
            "/a.png",
            "",
            json!({ "accept": [{ "key": "Accept", "value": "image/webp" }] }),
        );
        let output = handler.handle(&event).await.unwrap();

        assert_eq!(as_json(&output), request_of(&event));
        assert_eq!(handler.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn test_extension_gate_is_case_insensitive_and_allows_jfif() {
        let handler = handler(SpyFetcher::timing_out());
        let uris = ["/a.jfif", "/a.JFIF", "/a.JPG", "/a.JPEG", "/a.jpeg", "/a.Png"];

        for uri in uris {
            let output = handler.handle(&event("GET", uri, "width=5")).await.unwrap();
            assert_eq!(output.as_response().unwrap().status, 504, "uri {uri}");
        }
        assert_eq!(handler.fetcher().calls(), uris.len());
    }

    #[tokio::test]
    async fn test_many_invocations_keep_timing_series_bounded() {
        let handler = handler(SpyFetcher::timing_out());
        let event = event("POST", "/a.png", "");

        for _ in 0..SERIES_WINDOW + 50 {
            handler.handle(&event).await;
        }
        assert!(metrics().retained("handler.duration_ms") <= SERIES_WINDOW);
    }

    #[tokio::test]
    async fn test_unusable_origin_response_passes_through() {
        let handler = handler(SpyFetcher::returning(image_resource(b"<html/>".to_vec(), "text/html")));
        let event = event("GET", "/a.png", "width=200");
        let output = handler.handle(&event).await.unwrap();
        assert_eq!(as_json(&output), request_of(&event));
    }

    #[tokio::test]
    async fn test_unsupported_origin_passes_through_without_fetch() {
        let handler = handler(SpyFetcher::timing_out());
        let mut event = event("GET", "/a.png", "width=200");
        event["Records"][0]["cf"]["request"]["origin"] = json!({ "unknown": {} });

        let output = handler.handle(&event).await.unwrap();
        assert_eq!(as_json(&output), request_of(&event));
        assert_eq!(handler.fetcher().calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_event_is_a_no_op() {
        let handler = handler(SpyFetcher::timing_out());

        assert!(handler.handle(&json!({ "Records": [] })).await.is_none());
        assert!(handler.handle(&json!({ "Records": [{ "cf": {} }] })).await.is_none());
        assert!(metrics().counter("outcome.no_op") >= 2);
        assert_eq!(handler.fetcher().calls(), 0);
    }
}

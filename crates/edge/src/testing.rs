//! Shared fixtures for the unit tests in this crate.

use edgepix_origin_client::{FetchError, FetchRequest, FetchResult, FetchedResource, OriginFetcher};
use edgepix_image::{EncodeOptions, OutputFormat};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

fn encode_as(img: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_as(&gradient(width, height), ImageOutputFormat::Png)
}

pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_as(&gradient(width, height), ImageOutputFormat::Jpeg(85))
}

/// Real encoder, except WebP always comes out at 5000 bytes.
pub(crate) fn bloated_webp(
    img: &DynamicImage,
    format: OutputFormat,
    options: &EncodeOptions,
) -> edgepix_image::Result<Vec<u8>> {
    match format {
        OutputFormat::WebP => Ok(vec![0u8; 5000]),
        other => edgepix_image::encode(img, other, options),
    }
}

/// A 200 OK carrying `body` with the given content type.
pub(crate) fn image_resource(body: Vec<u8>, content_type: &str) -> FetchedResource {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), content_type.to_string());
    headers.insert("cache-control".to_string(), "max-age=3600".to_string());
    headers.insert("etag".to_string(), "\"upstream\"".to_string());

    FetchedResource {
        url: "https://bucket.example.com:443/a.png".to_string(),
        status: 200,
        reason: "OK".to_string(),
        headers,
        body,
    }
}

enum Canned {
    Resource(FetchedResource),
    Timeout,
}

/// Fetcher that records every call and returns a canned answer.
pub(crate) struct SpyFetcher {
    canned: Canned,
    calls: AtomicUsize,
    last: Mutex<Option<FetchRequest>>,
}

impl SpyFetcher {
    pub(crate) fn returning(resource: FetchedResource) -> Self {
        Self::with(Canned::Resource(resource))
    }

    pub(crate) fn timing_out() -> Self {
        Self::with(Canned::Timeout)
    }

    fn with(canned: Canned) -> Self {
        Self {
            canned,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<FetchRequest> {
        self.last.lock().unwrap().clone()
    }
}

impl OriginFetcher for SpyFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchedResource> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());

        match &self.canned {
            Canned::Resource(resource) => Ok(resource.clone()),
            Canned::Timeout => Err(FetchError::Timeout(Duration::from_secs(10))),
        }
    }
}

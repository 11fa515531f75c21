//! What the caller asked for: a size box and the formats it accepts.

use crate::headers::HeaderView;
use url::form_urlencoded;

/// Requested bounding box. At least one side is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredSize {
    width: Option<u32>,
    height: Option<u32>,
}

impl DesiredSize {
    /// `None` when neither side is given.
    pub fn new(width: Option<u32>, height: Option<u32>) -> Option<Self> {
        if width.is_none() && height.is_none() {
            return None;
        }
        Some(Self { width, height })
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }
}

/// Modern encodings named in `Accept`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    pub accepts_webp: bool,
    pub accepts_avif: bool,
}

impl CapabilitySet {
    pub fn any(&self) -> bool {
        self.accepts_webp || self.accepts_avif
    }
}

/// Result of negotiation for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Negotiation {
    pub size: Option<DesiredSize>,
    pub capabilities: CapabilitySet,
}

impl Negotiation {
    /// Without a size or a modern format there is nothing to gain by fetching.
    pub fn wants_transform(&self) -> bool {
        self.size.is_some() || self.capabilities.any()
    }
}

/// Negotiate from the raw query string and the projected headers.
pub fn negotiate(query: &str, headers: &HeaderView) -> Negotiation {
    Negotiation {
        size: parse_size(query),
        capabilities: parse_capabilities(headers.get("accept")),
    }
}

/// Read `width` and `height` from a query string.
///
/// The first occurrence of each parameter counts and empty values are
/// ignored. A value that is not a positive integer discards the whole pair,
/// not just that side. Keys and values are form-decoded first, so
/// `width=5%30%30` asks for 500.
pub fn parse_size(query: &str) -> Option<DesiredSize> {
    let width = first_param(query, "width");
    let height = first_param(query, "height");

    let width = match width {
        Some(raw) => Some(parse_dimension(raw)?),
        None => None,
    };
    let height = match height {
        Some(raw) => Some(parse_dimension(raw)?),
        None => None,
    };

    DesiredSize::new(width, height)
}

fn first_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key.as_ref() == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

fn parse_dimension(raw: String) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// Exact token match on the comma-split `Accept` value. Tokens are not
/// trimmed, so `"image/png, image/webp"` does not accept WebP.
pub fn parse_capabilities(accept: Option<&str>) -> CapabilitySet {
    let Some(accept) = accept else {
        return CapabilitySet::default();
    };

    let mut caps = CapabilitySet::default();
    for token in accept.split(',') {
        match token {
            "image/webp" => caps.accepts_webp = true,
            "image/avif" => caps.accepts_avif = true,
            _ => {}
        }
    }
    caps
}

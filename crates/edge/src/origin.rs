//! Origin resolution: which upstream to call, and with which headers.

use crate::error::EdgeError;
use crate::event::{HeaderMultimap, InterceptedRequest};
use crate::headers::HeaderView;
use edgepix_origin_client::FetchRequest;
use serde::Deserialize;
use serde_json::Value;

/// Object stores are always reached over TLS on the standard port.
const OBJECT_STORE_PROTOCOL: &str = "https";
const OBJECT_STORE_PORT: u16 = 443;

/// A custom HTTP origin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOrigin {
    pub protocol: String,
    pub domain_name: String,
    #[serde(deserialize_with = "crate::event::numeric_string::deserialize")]
    pub port: u16,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub custom_headers: HeaderMultimap,
}

/// An object-store origin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStoreOrigin {
    pub domain_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub custom_headers: HeaderMultimap,
}

/// The origin a request is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDescriptor {
    Custom(CustomOrigin),
    ObjectStore(ObjectStoreOrigin),
}

impl OriginDescriptor {
    /// Read the platform's `origin` object. `custom` is preferred when both
    /// keys are present.
    pub fn from_value(origin: &Value) -> Result<Self, EdgeError> {
        if let Some(custom) = origin.get("custom") {
            return CustomOrigin::deserialize(custom)
                .map(Self::Custom)
                .map_err(|e| EdgeError::UnsupportedOrigin(format!("custom: {}", e)));
        }

        if let Some(store) = origin.get("s3") {
            return ObjectStoreOrigin::deserialize(store)
                .map(Self::ObjectStore)
                .map_err(|e| EdgeError::UnsupportedOrigin(format!("s3: {}", e)));
        }

        Err(EdgeError::UnsupportedOrigin(
            "neither a custom nor an s3 origin".to_string(),
        ))
    }

    pub fn protocol(&self) -> &str {
        match self {
            Self::Custom(origin) => &origin.protocol,
            Self::ObjectStore(_) => OBJECT_STORE_PROTOCOL,
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            Self::Custom(origin) => &origin.domain_name,
            Self::ObjectStore(origin) => &origin.domain_name,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Self::Custom(origin) => origin.port,
            Self::ObjectStore(_) => OBJECT_STORE_PORT,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Custom(origin) => &origin.path,
            Self::ObjectStore(origin) => &origin.path,
        }
    }

    pub fn custom_headers(&self) -> &HeaderMultimap {
        match self {
            Self::Custom(origin) => &origin.custom_headers,
            Self::ObjectStore(origin) => &origin.custom_headers,
        }
    }
}

/// Where and how to fetch the original resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUpstream {
    pub url: String,
    pub headers: HeaderView,
}

impl ResolvedUpstream {
    pub fn into_fetch_request(self) -> FetchRequest {
        FetchRequest {
            url: self.url,
            headers: self.headers.into_pairs(),
        }
    }
}

/// Build the upstream URL and forwarded headers.
///
/// `accept-encoding` is dropped so the body arrives uncompressed, `host`
/// names the origin, and origin-injected headers override the caller's.
pub fn resolve(
    origin: &OriginDescriptor,
    uri: &str,
    querystring: &str,
    headers: &HeaderView,
) -> ResolvedUpstream {
    let mut forwarded = headers.clone();
    forwarded.remove("accept-encoding");
    forwarded.set("host", origin.domain());
    forwarded.merge(HeaderView::from(origin.custom_headers()));

    let query = if querystring.is_empty() {
        String::new()
    } else {
        format!("?{}", querystring)
    };

    let url = format!(
        "{}://{}:{}{}{}{}",
        origin.protocol(),
        origin.domain(),
        origin.port(),
        origin.path(),
        uri,
        query
    );

    ResolvedUpstream {
        url,
        headers: forwarded,
    }
}

/// Resolve straight from an intercepted request.
pub fn resolve_request(request: &InterceptedRequest, headers: &HeaderView) -> Result<ResolvedUpstream, EdgeError> {
    let origin = OriginDescriptor::from_value(&request.origin)?;
    Ok(resolve(&origin, &request.uri, &request.querystring, headers))
}

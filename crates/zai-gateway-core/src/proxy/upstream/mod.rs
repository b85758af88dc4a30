//! Outbound side: browser fingerprint headers and the HTTP transport.

pub mod fingerprint;
pub mod transport;

pub use fingerprint::{build_browser_headers, BrowserFamily, BrowserProfile, SiteIdentity};
pub use transport::{
    build_http_client, ByteStream, HttpTransport, OutboundRequest, UpstreamResponse,
    UpstreamTransport,
};

//! Browser fingerprint headers.
//!
//! Each outbound request picks a browser family by weighted draw (Chrome and
//! Edge favored), then a User-Agent from that family's pool. Client hints are
//! derived from the chosen UA so the header set stays self-consistent;
//! Firefox and Safari send none.
//!
//! Selection is a pure function of the supplied RNG, so tests can pin it with
//! a seeded generator.

use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION,
    CONTENT_TYPE, ORIGIN, PRAGMA, REFERER, USER_AGENT,
};

/// Fallback Chromium major version when the UA carries none.
const DEFAULT_CHROME_MAJOR: &str = "139";

pub const X_FE_VERSION: HeaderName = HeaderName::from_static("x-fe-version");
const SEC_CH_UA: HeaderName = HeaderName::from_static("sec-ch-ua");
const SEC_CH_UA_MOBILE: HeaderName = HeaderName::from_static("sec-ch-ua-mobile");
const SEC_CH_UA_PLATFORM: HeaderName = HeaderName::from_static("sec-ch-ua-platform");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Firefox,
    Safari,
}

/// Weighted draw table: Chrome x3, Edge x2, Firefox x1, Safari x1.
const WEIGHTED_FAMILIES: &[BrowserFamily] = &[
    BrowserFamily::Chrome,
    BrowserFamily::Chrome,
    BrowserFamily::Chrome,
    BrowserFamily::Edge,
    BrowserFamily::Edge,
    BrowserFamily::Firefox,
    BrowserFamily::Safari,
];

const CHROME_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36",
];

const EDGE_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36 Edg/139.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0",
];

const FIREFOX_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:141.0) Gecko/20100101 Firefox/141.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:140.0) Gecko/20100101 Firefox/140.0",
];

const SAFARI_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.5 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
];

impl BrowserFamily {
    fn agents(self) -> &'static [&'static str] {
        match self {
            BrowserFamily::Chrome => CHROME_AGENTS,
            BrowserFamily::Edge => EDGE_AGENTS,
            BrowserFamily::Firefox => FIREFOX_AGENTS,
            BrowserFamily::Safari => SAFARI_AGENTS,
        }
    }
}

/// A chosen browser identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserProfile {
    pub family: BrowserFamily,
    pub user_agent: &'static str,
}

impl BrowserProfile {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let family = WEIGHTED_FAMILIES[rng.gen_range(0..WEIGHTED_FAMILIES.len())];
        let agents = family.agents();
        Self { family, user_agent: agents[rng.gen_range(0..agents.len())] }
    }

    /// `sec-ch-ua` value, or `None` for families that don't send client hints.
    pub fn client_hints(&self) -> Option<String> {
        let chrome = version_after(self.user_agent, "Chrome/").unwrap_or(DEFAULT_CHROME_MAJOR);
        match self.family {
            BrowserFamily::Firefox | BrowserFamily::Safari => None,
            BrowserFamily::Edge => {
                let edge = version_after(self.user_agent, "Edg/").unwrap_or(chrome);
                Some(format!(
                    r#""Microsoft Edge";v="{edge}", "Chromium";v="{chrome}", "Not_A Brand";v="24""#
                ))
            },
            BrowserFamily::Chrome => Some(format!(
                r#""Not_A Brand";v="8", "Chromium";v="{chrome}", "Google Chrome";v="{chrome}""#
            )),
        }
    }
}

/// Major version following `marker` in a UA string.
fn version_after<'a>(user_agent: &'a str, marker: &str) -> Option<&'a str> {
    let rest = user_agent.split_once(marker)?.1;
    let major = rest.split('.').next()?;
    (!major.is_empty()).then_some(major)
}

/// Site identity the headers impersonate.
#[derive(Debug, Clone)]
pub struct SiteIdentity {
    pub base_url: String,
    pub fe_version: String,
}

/// Full browser-like header set for one request. The referer points at the
/// chat page when a chat id is known, else the site root.
pub fn build_browser_headers(
    profile: &BrowserProfile,
    site: &SiteIdentity,
    chat_id: Option<&str>,
) -> HeaderMap {
    let origin = site.base_url.trim_end_matches('/');
    let referer = match chat_id {
        Some(id) => format!("{origin}/c/{id}"),
        None => format!("{origin}/"),
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/event-stream"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"));
    headers.insert(USER_AGENT, HeaderValue::from_static(profile.user_agent));
    insert_dynamic(&mut headers, X_FE_VERSION, &site.fe_version);
    insert_dynamic(&mut headers, ORIGIN, origin);
    insert_dynamic(&mut headers, REFERER, &referer);

    if let Some(hints) = profile.client_hints() {
        insert_dynamic(&mut headers, SEC_CH_UA, &hints);
        headers.insert(SEC_CH_UA_MOBILE, HeaderValue::from_static("?0"));
        headers.insert(SEC_CH_UA_PLATFORM, HeaderValue::from_static("\"Windows\""));
    }

    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
    headers
}

fn insert_dynamic(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        },
        Err(_) => tracing::warn!("Dropping header {} with non-visible characters", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn site() -> SiteIdentity {
        SiteIdentity { base_url: "https://chat.z.ai".into(), fe_version: "prod-fe-1.0.79".into() }
    }

    #[test]
    fn test_seeded_selection_is_stable() {
        let a = BrowserProfile::random(&mut StdRng::seed_from_u64(7));
        let b = BrowserProfile::random(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_family_weights_favor_chrome_and_edge() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut mainstream = 0;
        for _ in 0..700 {
            let profile = BrowserProfile::random(&mut rng);
            if matches!(profile.family, BrowserFamily::Chrome | BrowserFamily::Edge) {
                mainstream += 1;
            }
        }
        // 5/7 expected
        assert!(mainstream > 400, "got {mainstream}");
    }

    #[test]
    fn test_edge_hints_match_agent() {
        let profile = BrowserProfile { family: BrowserFamily::Edge, user_agent: EDGE_AGENTS[1] };
        assert_eq!(
            profile.client_hints().as_deref(),
            Some(r#""Microsoft Edge";v="138", "Chromium";v="138", "Not_A Brand";v="24""#)
        );
    }

    #[test]
    fn test_firefox_sends_no_client_hints() {
        let profile =
            BrowserProfile { family: BrowserFamily::Firefox, user_agent: FIREFOX_AGENTS[0] };
        let headers = build_browser_headers(&profile, &site(), None);
        assert!(headers.get("sec-ch-ua").is_none());
        assert!(headers.get("sec-ch-ua-platform").is_none());
        assert_eq!(headers.get(REFERER).unwrap(), "https://chat.z.ai/");
    }

    #[test]
    fn test_chrome_headers_carry_chat_referer() {
        let profile = BrowserProfile { family: BrowserFamily::Chrome, user_agent: CHROME_AGENTS[0] };
        let headers = build_browser_headers(&profile, &site(), Some("abc"));

        assert_eq!(headers.get(REFERER).unwrap(), "https://chat.z.ai/c/abc");
        assert_eq!(headers.get(ORIGIN).unwrap(), "https://chat.z.ai");
        assert_eq!(headers.get("x-fe-version").unwrap(), "prod-fe-1.0.79");
        assert_eq!(
            headers.get("sec-ch-ua").unwrap(),
            r#""Not_A Brand";v="8", "Chromium";v="139", "Google Chrome";v="139""#
        );
        assert_eq!(headers.get("sec-ch-ua-mobile").unwrap(), "?0");
    }

    #[test]
    fn test_agent_pools_are_family_consistent() {
        assert!(EDGE_AGENTS.iter().all(|ua| ua.contains("Edg/")));
        assert!(FIREFOX_AGENTS.iter().all(|ua| ua.contains("Firefox/")));
        assert!(CHROME_AGENTS.iter().all(|ua| ua.contains("Chrome/") && !ua.contains("Edg/")));
    }
}

//! Scraper configuration: session credentials, cache policy and page URLs.
//!
//! Everything the HTTP/cache layer needs is carried by [`ScraperConfig`]
//! and handed over at construction time. Values are resolved in order of
//! priority: explicit value, then `FBSCRAPE_*` environment variable, then
//! the built-in default.

use crate::error::{ScrapeError, ScrapeResult};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Mobile basic site; serves JavaScript-free markup that still carries user ids.
pub const DEFAULT_BASE_URL: &str = "https://mbasic.facebook.com";

/// Undocumented chat endpoint answering with buddy-list presence.
pub const DEFAULT_PRESENCE_URL: &str = "https://5-edge-chat.facebook.com/pull";

/// Default request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Default cache lifetime when nothing else is configured (one hour).
pub const DEFAULT_CACHE_SECS: u64 = 3600;

/// How long fetched pages are reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Every fetch goes to the network.
    Disabled,
    /// Cached pages never expire.
    Unbounded,
    /// Cached pages expire after the given duration.
    Bounded(Duration),
}

impl CacheMode {
    /// Whether a cached entry of the given age may still be served.
    pub fn is_fresh(&self, age: Duration) -> bool {
        match self {
            CacheMode::Disabled => false,
            CacheMode::Unbounded => true,
            CacheMode::Bounded(ttl) => age < *ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, CacheMode::Disabled)
    }
}

impl Default for CacheMode {
    fn default() -> Self {
        CacheMode::Bounded(Duration::from_secs(DEFAULT_CACHE_SECS))
    }
}

impl FromStr for CacheMode {
    type Err = ScrapeError;

    /// Accepts `off`, `forever`, or a number of seconds.
    fn from_str(s: &str) -> ScrapeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "disabled" | "none" => Ok(CacheMode::Disabled),
            "forever" | "unbounded" => Ok(CacheMode::Unbounded),
            other => other
                .parse::<u64>()
                .map(|secs| CacheMode::Bounded(Duration::from_secs(secs)))
                .map_err(|_| {
                    ScrapeError::Validation(format!(
                        "invalid cache mode: {s}. Use off, forever, or a number of seconds"
                    ))
                }),
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheMode::Disabled => write!(f, "off"),
            CacheMode::Unbounded => write!(f, "forever"),
            CacheMode::Bounded(ttl) => write!(f, "{}", ttl.as_secs()),
        }
    }
}

/// The two session cookies obtained from a logged-in browser.
///
/// Treated as bearer credentials: `Debug` never prints the values.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookies {
    c_user: String,
    xs: String,
}

impl SessionCookies {
    pub fn new(c_user: impl Into<String>, xs: impl Into<String>) -> ScrapeResult<Self> {
        let c_user = c_user.into().trim().to_string();
        let xs = xs.into().trim().to_string();
        if c_user.is_empty() || xs.is_empty() {
            return Err(ScrapeError::Validation(
                "both session cookies (c_user and xs) are required".to_string(),
            ));
        }
        Ok(Self { c_user, xs })
    }

    /// Read the cookies from `FBSCRAPE_C_USER` and `FBSCRAPE_XS`.
    pub fn from_env() -> ScrapeResult<Self> {
        let c_user = std::env::var("FBSCRAPE_C_USER").unwrap_or_default();
        let xs = std::env::var("FBSCRAPE_XS").unwrap_or_default();
        Self::new(c_user, xs)
    }

    /// Numeric id of the logged-in account; also the cache's session identity.
    pub fn user_id(&self) -> &str {
        &self.c_user
    }

    /// Value for the `Cookie` request header.
    pub fn header_value(&self) -> String {
        format!("c_user={}; xs={}", self.c_user, self.xs)
    }
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookies")
            .field("c_user", &self.c_user)
            .field("xs", &"<redacted>")
            .finish()
    }
}

/// Explicit configuration for the HTTP/cache layer and URL construction.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub presence_url: String,
    pub session: SessionCookies,
    pub cache: CacheMode,
    pub cache_dir: PathBuf,
    pub timeout_ms: u64,
}

impl ScraperConfig {
    pub fn new(session: SessionCookies) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            presence_url: DEFAULT_PRESENCE_URL.to_string(),
            session,
            cache: CacheMode::default(),
            cache_dir: default_cache_dir(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Build a config from explicit values, falling back to the environment.
    pub fn resolve(
        c_user: Option<&str>,
        xs: Option<&str>,
        cache: Option<&str>,
        cache_dir: Option<&str>,
    ) -> ScrapeResult<Self> {
        let c_user = c_user
            .map(str::to_string)
            .or_else(|| std::env::var("FBSCRAPE_C_USER").ok())
            .unwrap_or_default();
        let xs = xs
            .map(str::to_string)
            .or_else(|| std::env::var("FBSCRAPE_XS").ok())
            .unwrap_or_default();
        let mut config = Self::new(SessionCookies::new(c_user, xs)?);

        if let Some(mode) = cache
            .map(str::to_string)
            .or_else(|| std::env::var("FBSCRAPE_CACHE").ok())
        {
            config.cache = mode.parse()?;
        }
        if let Some(dir) = cache_dir
            .map(str::to_string)
            .or_else(|| std::env::var("FBSCRAPE_CACHE_DIR").ok())
            .filter(|d| !d.is_empty())
        {
            config.cache_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Resolve a site-relative href against the base URL.
    pub fn absolute(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }

    pub fn friends_url(&self) -> String {
        self.absolute("/friends/center/friends/")
    }

    pub fn about_url(&self, key: &str) -> String {
        if is_numeric_key(key) {
            self.absolute(&format!("/profile.php?v=info&id={key}"))
        } else {
            self.absolute(&format!("/{key}/about"))
        }
    }

    pub fn timeline_url(&self, key: &str) -> String {
        if is_numeric_key(key) {
            self.absolute(&format!("/profile.php?id={key}&v=timeline"))
        } else {
            self.absolute(&format!("/{key}?v=timeline"))
        }
    }

    pub fn mutual_friends_url(&self, key: &str) -> String {
        if is_numeric_key(key) {
            self.absolute(&format!("/profile.php?v=friends&mutual=1&id={key}"))
        } else {
            self.absolute(&format!("/{key}/friends?mutual=1"))
        }
    }

    pub fn likers_url(&self, post_id: u64) -> String {
        self.absolute(&format!(
            "/ufi/reaction/profile/browser/?ft_ent_identifier={post_id}"
        ))
    }

    /// Presence endpoint for the logged-in account's buddy list.
    pub fn presence_url(&self) -> String {
        let uid = self.session.user_id();
        format!(
            "{}?channel=p_{uid}&seq=1&partition=-2&clientid=1&cb=1&idle=0&qp=y&cap=8\
             &msgs_recv=0&uid={uid}&viewer_uid={uid}&state=active",
            self.presence_url
        )
    }
}

fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_digit())
}

fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fbscrape")
        .join("cache")
}

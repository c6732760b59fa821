//! Session cookies
//!
//! Both tokens travel as HttpOnly cookies scoped to `/`. Clients that cannot
//! use cookies may send `Authorization: Bearer` and `X-Refresh-Token`.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::net::Ipv4Addr;
use tracing::warn;

use crate::auth::config::{CookieConfig, SameSitePolicy};
use crate::auth::session::SessionTokens;
use crate::config::Environment;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const REFRESH_HEADER: &str = "x-refresh-token";

/// Resolved cookie attributes
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    secure: bool,
    same_site: SameSite,
    domain: Option<String>,
}

impl CookiePolicy {
    pub fn from_config(config: &CookieConfig, environment: Environment) -> Self {
        let secure = config.secure.unwrap_or_else(|| environment.is_production());

        let same_site = match config.same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None if secure => SameSite::None,
            SameSitePolicy::None => {
                warn!("cookie.same_site = none requires secure cookies; falling back to lax");
                SameSite::Lax
            }
        };

        let domain = match config.domain.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(domain) if is_bare_hostname(domain) => Some(domain.to_string()),
            Some(domain) => {
                warn!(domain, "Ignoring cookie.domain: not a bare hostname");
                None
            }
        };

        Self {
            secure,
            same_site,
            domain,
        }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Add both session cookies to `jar`
    pub fn set_session(&self, jar: CookieJar, tokens: &SessionTokens) -> CookieJar {
        let now = chrono::Utc::now();
        let access_age = (tokens.access.expires_at - now).num_seconds().max(0);
        let refresh_age = (tokens.refresh.expires_at - now).num_seconds().max(0);

        jar.add(self.build(ACCESS_COOKIE, tokens.access.token.clone(), access_age))
            .add(self.build(REFRESH_COOKIE, tokens.refresh.token.clone(), refresh_age))
    }

    /// Expire both session cookies, whether or not the request carried them
    pub fn clear_session(&self, jar: CookieJar) -> CookieJar {
        let mut access = self.build(ACCESS_COOKIE, String::new(), 0);
        access.make_removal();
        let mut refresh = self.build(REFRESH_COOKIE, String::new(), 0);
        refresh.make_removal();

        jar.add(access).add(refresh)
    }

    fn build(&self, name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
        let mut builder = Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/")
            .max_age(time::Duration::seconds(max_age_secs));

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }
}

/// Refresh token from its cookie, else from the `X-Refresh-Token` header
pub fn extract_refresh_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get(REFRESH_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
}

/// Hostname without scheme, port or path, and not an IPv4 literal
fn is_bare_hostname(domain: &str) -> bool {
    let host = domain.strip_prefix('.').unwrap_or(domain);

    !host.is_empty()
        && host.parse::<Ipv4Addr>().is_err()
        && host.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

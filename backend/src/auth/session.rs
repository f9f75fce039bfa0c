//! Session cookie handling.
//!
//! The cookie only carries an opaque random token; the session itself lives
//! in the `sessions` table.

use crate::config::Config;
use axum::http::{HeaderMap, header};

pub const SESSION_COOKIE_NAME: &str = "sessionid";

/// Session cookie attributes.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: &'static str,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl SessionCookie {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: SESSION_COOKIE_NAME,
            secure: config.session_cookie_secure,
            max_age_secs: config.session_ttl_seconds,
        }
    }

    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.name, token, self.max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Build Set-Cookie header for deletion (expired)
    pub fn build_delete_cookie(&self) -> String {
        format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", self.name)
    }
}

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::http::HeaderValue;

    #[test]
    fn test_build_set_cookie() {
        let mut config = test_config();
        let cookie = SessionCookie::from_config(&config);
        assert_eq!(
            cookie.build_set_cookie("abc"),
            "sessionid=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600"
        );

        config.session_cookie_secure = true;
        let cookie = SessionCookie::from_config(&config);
        assert!(cookie.build_set_cookie("abc").ends_with("; Secure"));
        assert!(cookie.build_delete_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sessionid=tok123; lang=zh"),
        );
        assert_eq!(
            extract_cookie(&headers, SESSION_COOKIE_NAME).as_deref(),
            Some("tok123")
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sessionid="));
        assert_eq!(extract_cookie(&headers, SESSION_COOKIE_NAME), None);
    }
}

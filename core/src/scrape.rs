// core/src/scrape.rs
//
// All regex-skraping av HTML ligger her. Endrer serveren markup, er det denne
// fila (og fixturene i testene) som skal oppdateres.
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{Error, Result};

static SOURCE_PAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="_sourcePage".*?value="([^"]+)""#).expect("valid regex"));
static FP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="__fp".*?value="([^"]+)""#).expect("valid regex"));

static USER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"userId=([a-zA-Z0-9]+)").expect("valid regex"));
static USER_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"/user/([a-zA-Z0-9]+)""#).expect("valid regex"));

/// De to skjulte feltene login-skjemaet krever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTokens {
    pub source_page: String,
    pub fp: String,
}

fn capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn login_tokens(html: &str) -> Result<LoginTokens> {
    let source_page =
        capture(&SOURCE_PAGE_RE, html).ok_or(Error::Scrape { what: "_sourcePage token" })?;
    let fp = capture(&FP_RE, html).ok_or(Error::Scrape { what: "__fp token" })?;
    Ok(LoginTokens { source_page, fp })
}

/// Bruker-id fra landingssiden: `userId=...` først, deretter `/user/..."`.
pub fn user_id(html: &str) -> Result<String> {
    capture(&USER_ID_RE, html)
        .or_else(|| capture(&USER_PATH_RE, html))
        .ok_or(Error::Scrape { what: "user id" })
}

/// URL-ene en vellykket innlogging kan ende på.
pub fn landing_urls(base_url: &str) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    let mut urls = Vec::with_capacity(4);
    if let Some(host) = Url::parse(base).ok().and_then(|u| u.host_str().map(str::to_string)) {
        urls.push(format!("http://{host}/"));
        urls.push(format!("https://{host}/"));
        urls.push(format!("https://{host}:443/"));
    }
    let own = format!("{base}/");
    if !urls.contains(&own) {
        urls.push(own);
    }
    urls
}

pub fn is_landing_url(base_url: &str, final_url: &str) -> bool {
    landing_urls(base_url).iter().any(|u| u == final_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"
<form method="post" action="https://www.fitbit.com/login" id="loginForm">
  <input type="hidden" name="_sourcePage" value="Nh3jYg8v0Jk_Sx-2Q==" />
  <input type="hidden" name="__fp" value="dW5pcXVlZnA=" />
  <input type="email" name="email" value="" />
</form>"#;

    const DASHBOARD: &str = r#"
<script>var trackerSync = "/ajaxTrackerSync?userId=22ABCD&ts=1";</script>
<a href="/user/22ABCD" class="profile">me</a>"#;

    #[test]
    fn tokens_are_scraped_from_login_form() {
        let t = login_tokens(LOGIN_PAGE).unwrap();
        assert_eq!(t.source_page, "Nh3jYg8v0Jk_Sx-2Q==");
        assert_eq!(t.fp, "dW5pcXVlZnA=");
    }

    #[test]
    fn missing_fp_token_is_a_scrape_error() {
        let html = r#"<input type="hidden" name="_sourcePage" value="abc" />"#;
        match login_tokens(html) {
            Err(Error::Scrape { what }) => assert!(what.contains("__fp")),
            other => panic!("expected scrape error, got {other:?}"),
        }
    }

    #[test]
    fn user_id_prefers_query_pattern() {
        assert_eq!(user_id(DASHBOARD).unwrap(), "22ABCD");
    }

    #[test]
    fn user_id_falls_back_to_profile_link() {
        let html = r#"<a href="/user/7XYZ9" class="avatar">"#;
        assert_eq!(user_id(html).unwrap(), "7XYZ9");
    }

    #[test]
    fn user_id_missing_is_a_scrape_error() {
        assert!(matches!(user_id("<html></html>"), Err(Error::Scrape { .. })));
    }

    #[test]
    fn landing_urls_cover_scheme_and_port_variants() {
        let base = "https://www.fitbit.com";
        assert!(is_landing_url(base, "http://www.fitbit.com/"));
        assert!(is_landing_url(base, "https://www.fitbit.com/"));
        assert!(is_landing_url(base, "https://www.fitbit.com:443/"));
        assert!(!is_landing_url(base, "https://www.fitbit.com/login"));
        assert!(!is_landing_url(base, "https://www.fitbit.com/login?disableThirdPartyLogin=true"));
    }

    #[test]
    fn landing_url_includes_base_with_explicit_port() {
        assert!(is_landing_url("http://127.0.0.1:4321/", "http://127.0.0.1:4321/"));
        assert!(!is_landing_url("http://127.0.0.1:4321", "http://127.0.0.1:4321/login"));
    }
}

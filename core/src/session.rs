// core/src/session.rs
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use ureq::Agent;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::observer::{LogObserver, Method, RequestEvent, RequestObserver, ResponseEvent};
use crate::scrape;
use crate::xml::{self, XmlElement};

/// Øvre grense for en svarkropp (samme som ureq sin `into_string`).
const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Én HTTP-runde: endelig URL (etter redirects), status og kropp.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Innlogget sesjon mot nettsiden.
///
/// `Clone` deler agenten og dermed cookie-jaret. Cookies oppdateres av
/// ureq ved hvert kall; ellers endres ingenting etter innlogging.
#[derive(Clone)]
pub struct Session {
    user_id: String,
    base_url: String,
    agent: Agent,
    observer: Arc<dyn RequestObserver>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    fn build(user_id: String, config: &ClientConfig, observer: Arc<dyn RequestObserver>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build();
        Self {
            user_id,
            base_url: config.normalized_base_url().to_string(),
            agent,
            observer,
        }
    }

    /// Sesjon for en kjent bruker-id uten innlogging (tom cookie-jar).
    pub fn from_parts(user_id: impl Into<String>, config: &ClientConfig) -> Self {
        Self::build(user_id.into(), config, Arc::new(LogObserver))
    }

    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn login(email: &str, password: &str, config: &ClientConfig) -> Result<Session> {
        Self::login_with_observer(email, password, config, Arc::new(LogObserver))
    }

    /// Innloggingshåndtrykket:
    /// 1) GET `/` for første cookie (login-siden gir 500 uten)
    /// 2) GET `/login` og skrap `_sourcePage` + `__fp`
    /// 3) POST skjemaet
    /// 4) sjekk at vi havnet på en kjent landingsside
    /// 5) skrap bruker-id fra landingssiden
    pub fn login_with_observer(
        email: &str,
        password: &str,
        config: &ClientConfig,
        observer: Arc<dyn RequestObserver>,
    ) -> Result<Session> {
        let mut session = Self::build(String::new(), config, observer);

        session.send(Method::Get, "/", &[], "")?;

        let login_page = session.send(Method::Get, "/login", &[], "")?;
        let tokens = scrape::login_tokens(&login_page.body)?;

        let form = [
            ("email", email.to_string()),
            ("password", password.to_string()),
            ("_sourcePage", tokens.source_page),
            ("__fp", tokens.fp),
            ("login", "Log In".to_string()),
            ("includeWorkflow", "false".to_string()),
            ("redirect", String::new()),
            ("rememberMe", "true".to_string()),
        ];
        let landed = session.send(Method::Post, "/login", &form, "")?;

        if !scrape::is_landing_url(&session.base_url, &landed.url) {
            log::info!("login rejected, landed on {}", landed.url);
            return Err(Error::Auth("Incorrect username or password".to_string()));
        }

        session.user_id = scrape::user_id(&landed.body)?;
        log::info!("logged in as user {}", session.user_id);
        Ok(session)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Rå forespørsel; returnerer kroppen (trimmet) også for 4xx/5xx.
    ///
    /// Kroppen dekodes som UTF-8 med tap: ugyldige bytes (f.eks. en Latin-1
    /// feilside) blir U+FFFD i stedet for å gi feil. Alt nettsiden svarer med
    /// av XML og JSON er UTF-8.
    ///
    /// GET: parametre med tom verdi droppes før query-koding, `request_body`
    /// ignoreres. POST: `request_body` sendes som den er hvis den ikke er tom,
    /// ellers form-kodes parametrene.
    pub fn request_raw(
        &self,
        path: &str,
        params: &[(&str, String)],
        method: Method,
        request_body: &str,
    ) -> Result<String> {
        Ok(self.send(method, path, params, request_body)?.body)
    }

    pub fn request_xml(&self, path: &str, params: &[(&str, String)]) -> Result<XmlElement> {
        let raw = self.request_raw(path, params, Method::Get, "")?;
        xml::parse_graph_xml(&raw)
    }

    pub fn request_json(
        &self,
        path: &str,
        params: &[(&str, String)],
        method: Method,
    ) -> Result<Value> {
        let raw = self.request_raw(path, params, method, "")?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// POST med ferdig form-kodet kropp (AJAX-API-et).
    pub fn request_json_body(&self, path: &str, request_body: &str) -> Result<Value> {
        let raw = self.request_raw(path, &[], Method::Post, request_body)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn url_for(&self, method: Method, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if method == Method::Get {
            let kept: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
            if !kept.is_empty() {
                url.query_pairs_mut()
                    .extend_pairs(kept.iter().map(|(k, v)| (*k, v.as_str())));
            }
        }
        Ok(url)
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        request_body: &str,
    ) -> Result<RawResponse> {
        let url = self.url_for(method, path, params)?;
        self.observer.on_request(&RequestEvent {
            method,
            path,
            url: url.as_str(),
            params,
        });

        let request = self.agent.request_url(method.as_str(), &url);
        let outcome = match method {
            Method::Get => request.call(),
            Method::Post if !request_body.is_empty() => request
                .set("Content-Type", "application/x-www-form-urlencoded")
                .send_string(request_body),
            Method::Post => {
                let form: Vec<(&str, &str)> =
                    params.iter().map(|(k, v)| (*k, v.as_str())).collect();
                request.send_form(&form)
            }
        };

        // 4xx/5xx er data, ikke feil
        let response = match outcome {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(t)) => return Err(Error::Transport(Box::new(t))),
        };

        let final_url = response.get_url().to_string();
        let status = response.status();
        let mut raw = Vec::new();
        response.into_reader().take(MAX_BODY_BYTES).read_to_end(&mut raw)?;
        let body = decode_body(&raw);

        self.observer.on_response(&ResponseEvent {
            method,
            path,
            final_url: &final_url,
            status,
            bytes: raw.len(),
        });

        Ok(RawResponse { url: final_url, status, body })
    }
}

/// UTF-8 med tap, trimmet.
fn decode_body(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

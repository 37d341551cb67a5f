// core/src/observer.rs
use std::fmt;
use std::sync::Arc;

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Utgående forespørsel, slik observatører ser den.
#[derive(Debug, Clone, Copy)]
pub struct RequestEvent<'a> {
    pub method: Method,
    pub path: &'a str,
    pub url: &'a str,
    pub params: &'a [(&'a str, String)],
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseEvent<'a> {
    pub method: Method,
    pub path: &'a str,
    /// URL etter eventuelle redirects
    pub final_url: &'a str,
    pub status: u16,
    pub bytes: usize,
}

/// Kroken sesjonen kaller ved hver forespørsel/respons.
///
/// Erstatter global loggkonfig: sesjonen får en observatør inn ved
/// konstruksjon, og tester kan gi sin egen.
pub trait RequestObserver: Send + Sync {
    fn on_request(&self, event: &RequestEvent<'_>);
    fn on_response(&self, event: &ResponseEvent<'_>);
}

/// Felt som aldri skal ut i logger.
const SECRET_KEYS: &[&str] = &["password"];

pub(crate) fn redacted(params: &[(&str, String)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| {
            let v = if SECRET_KEYS.contains(k) { "***".to_string() } else { v.clone() };
            (k.to_string(), v)
        })
        .collect()
}

/// Standard: strukturert logging via `log`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RequestObserver for LogObserver {
    fn on_request(&self, event: &RequestEvent<'_>) {
        log::debug!(
            "request method={} path={} url={} params={:?}",
            event.method,
            event.path,
            event.url,
            redacted(event.params)
        );
    }

    fn on_response(&self, event: &ResponseEvent<'_>) {
        if event.status >= 400 {
            log::warn!(
                "response method={} path={} status={} bytes={} (body returned as data)",
                event.method,
                event.path,
                event.status,
                event.bytes
            );
        } else {
            log::debug!(
                "response method={} path={} final_url={} status={} bytes={}",
                event.method,
                event.path,
                event.final_url,
                event.status,
                event.bytes
            );
        }
    }
}

/// Prometheus-tellere for forespørsler og svar.
#[derive(Clone)]
pub struct MetricsObserver {
    requests: IntCounterVec,
    responses: IntCounterVec,
    response_bytes: IntCounter,
}

impl MetricsObserver {
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let requests = IntCounterVec::new(
            Opts::new("fitdump_requests_total", "HTTP requests issued by the session"),
            &["method"],
        )?;
        let responses = IntCounterVec::new(
            Opts::new("fitdump_responses_total", "HTTP responses by status class"),
            &["status_class"],
        )?;
        let response_bytes = IntCounter::new(
            "fitdump_response_bytes_total",
            "Response body bytes received",
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(responses.clone()))?;
        registry.register(Box::new(response_bytes.clone()))?;

        Ok(Self { requests, responses, response_bytes })
    }

    pub fn requests(&self, method: Method) -> u64 {
        self.requests.with_label_values(&[method.as_str()]).get()
    }

    pub fn responses(&self, status_class: &str) -> u64 {
        self.responses.with_label_values(&[status_class]).get()
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

impl RequestObserver for MetricsObserver {
    fn on_request(&self, event: &RequestEvent<'_>) {
        self.requests.with_label_values(&[event.method.as_str()]).inc();
    }

    fn on_response(&self, event: &ResponseEvent<'_>) {
        self.responses.with_label_values(&[status_class(event.status)]).inc();
        self.response_bytes.inc_by(event.bytes as u64);
    }
}

/// Sender hver hendelse videre til alle observatørene i rekkefølge.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn RequestObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl RequestObserver for ObserverSet {
    fn on_request(&self, event: &RequestEvent<'_>) {
        for o in &self.observers {
            o.on_request(event);
        }
    }

    fn on_response(&self, event: &ResponseEvent<'_>) {
        for o in &self.observers {
            o.on_response(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_masked() {
        let params = vec![("email", "a@b.c".to_string()), ("password", "hunter2".to_string())];
        let out = redacted(&params);
        assert_eq!(out[0].1, "a@b.c");
        assert_eq!(out[1].1, "***");
    }

    #[test]
    fn metrics_observer_counts_by_method_and_status_class() {
        let registry = Registry::new();
        let metrics = MetricsObserver::register(&registry).unwrap();
        let set = ObserverSet::new()
            .with(Arc::new(LogObserver))
            .with(Arc::new(metrics.clone()));

        let params = vec![];
        let req = RequestEvent { method: Method::Get, path: "/", url: "http://x/", params: &params };
        set.on_request(&req);
        set.on_request(&req);
        set.on_response(&ResponseEvent {
            method: Method::Get,
            path: "/",
            final_url: "http://x/",
            status: 500,
            bytes: 12,
        });

        assert_eq!(metrics.requests(Method::Get), 2);
        assert_eq!(metrics.requests(Method::Post), 0);
        assert_eq!(metrics.responses("5xx"), 1);
        assert_eq!(registry.gather().len(), 3);
    }
}

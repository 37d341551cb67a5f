// core/tests/common/mod.rs
#![allow(dead_code)]

use fitdump_core::{Client, ClientConfig, Session};
use wiremock::MockServer;

pub const USER_ID: &str = "22ABCD";

pub const LOGIN_PAGE: &str = r#"<html><body>
<form method="post" action="/login" id="loginForm">
  <input type="hidden" name="_sourcePage" value="src-token-1" />
  <input type="hidden" name="__fp" value="fp-token-2" />
  <input type="email" name="email" />
  <input type="password" name="password" />
</form></body></html>"#;

pub const DASHBOARD: &str = r#"<html><body>
<script>var syncUrl = "/ajaxTrackerSync?userId=22ABCD&amp;ts=1";</script>
<a href="/user/22ABCD" class="avatar">me</a>
</body></html>"#;

/// Kjør blokkerende klientkode utenfor async-runtimen (wiremock kjører på egen tråd).
pub async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    let mut cfg = ClientConfig::with_base_url(server.uri());
    cfg.timeout_secs = 5;
    cfg
}

/// Klient med kjent bruker-id, uten innlogging.
pub fn client_for(server: &MockServer) -> Client {
    Client::new(Session::from_parts(USER_ID, &config_for(server)))
}

/// Legacy amchart-XML med én `<value>` per element i `values`.
pub fn legacy_xml(values: &[(String, Option<String>)]) -> String {
    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<settings><data><chart>\
         <title>Steps taken&hellip;</title><graphs><graph gid=\"0\">",
    );
    for (i, (value, description)) in values.iter().enumerate() {
        match description {
            Some(d) => body.push_str(&format!(
                "<value xid=\"{i}\" description=\"{d}\">{value}</value>"
            )),
            None => body.push_str(&format!("<value xid=\"{i}\">{value}</value>")),
        }
    }
    body.push_str("</graph></graphs></chart></data></settings>\n");
    body
}

// core/src/error.rs
use thiserror::Error;

/// Feil fra klienten og arkivet.
///
/// HTTP-statusfeil (4xx/5xx) finnes bevisst ikke her: kroppen returneres som
/// vanlige data og kalleren må se på innholdet.
#[derive(Debug, Error)]
pub enum Error {
    /// Innlogging endte på en URL som ikke er en kjent landingsside.
    #[error("{0}")]
    Auth(String),

    /// Forventet markup (token, bruker-id) mangler i HTML fra serveren.
    #[error("could not find {what} in the page markup")]
    Scrape { what: &'static str },

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON var gyldig, men hadde ikke forventet form.
    #[error("unexpected JSON shape at {}: {}", .0.path(), .0.inner())]
    Decode(#[from] serde_path_to_error::Error<serde_json::Error>),

    /// Felt finnes men lar seg ikke tolke (tall, klokkeslett, distanse, varighet).
    #[error("invalid {what}: {value:?}")]
    Value { what: &'static str, value: String },

    /// Ingen av service-kallene i AJAX-konvolutten svarte med status 200.
    #[error("service call failed: {0}")]
    ServiceCall(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Nettverksfeil (DNS, tilkobling, TLS, I/O), aldri HTTP-status.
    #[error("transport error: {0}")]
    Transport(#[from] Box<ureq::Transport>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("no data recorded in the last {days} days")]
    NoRecentData { days: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn value(what: &'static str, value: impl Into<String>) -> Self {
        Error::Value { what, value: value.into() }
    }
}

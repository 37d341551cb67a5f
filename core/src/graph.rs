// core/src/graph.rs
//
// De tre svarformatene fra nettsidens graf-endepunkter. Hvert format har sin
// egen dekoder; de er for ulike til å dele én.
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use serde_path_to_error as spte;

use crate::error::{Error, Result};
use crate::models::{Sample, Series};
use crate::xml::XmlElement;

const LEGACY_VALUE_PATH: &str = "data/chart/graphs/graph/value";

// ──────────────────────────────────────────────────────────────────────────────
// Legacy XML (`/graph/getGraphData`, amchart)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyPoint {
    pub value: i64,
    pub description: Option<String>,
}

/// Alle `<value>` under `data/chart/graphs/graph`, tekst som float kuttet til heltall.
pub fn decode_legacy(root: &XmlElement) -> Result<Vec<LegacyPoint>> {
    root.find_all(LEGACY_VALUE_PATH)
        .into_iter()
        .map(|el| {
            let text = el.text.as_deref().unwrap_or("").trim();
            let value = text
                .parse::<f64>()
                .map_err(|_| Error::value("graph value", text))?;
            Ok(LegacyPoint {
                value: value.trunc() as i64,
                description: el.attr("description").map(str::to_string),
            })
        })
        .collect()
}

// ──────────────────────────────────────────────────────────────────────────────
// Ny JSON-graf (`/graph/getNewGraphData?apiFormat=json`)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct NewGraphPayload {
    #[serde(default)]
    graph: Option<GraphBody>,
}

#[derive(Debug, Deserialize)]
struct GraphBody {
    #[serde(rename = "dataSets")]
    data_sets: DataSets,
}

#[derive(Debug, Deserialize)]
struct DataSets {
    activity: DataSet,
}

#[derive(Debug, Deserialize)]
struct DataSet {
    #[serde(rename = "dataPoints", default)]
    data_points: Vec<DataPoint>,
}

#[derive(Debug, Deserialize)]
struct DataPoint {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(default)]
    value: Value,
}

/// Mangler `graph` helt, er det ingen finkornet logg: tom serie, ikke feil.
pub fn decode_new_graph(payload: Value) -> Result<Series> {
    let parsed: NewGraphPayload = spte::deserialize(payload)?;
    let Some(graph) = parsed.graph else {
        return Ok(Vec::new());
    };
    graph
        .data_sets
        .activity
        .data_points
        .into_iter()
        .map(|p| {
            let timestamp = parse_datetime(&p.date_time)?;
            let value = coerce_i64(&p.value).ok_or_else(|| Error::value("data point", p.value.to_string()))?;
            Ok(Sample::new(timestamp, value))
        })
        .collect()
}

// ──────────────────────────────────────────────────────────────────────────────
// AJAX-konvolutt (`POST /ajaxapi`)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceResponse {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub result: Option<Value>,
}

/// Forespørsels-id → `{status, result}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct AjaxEnvelope {
    pub calls: BTreeMap<String, ServiceResponse>,
}

impl AjaxEnvelope {
    pub fn decode(payload: Value) -> Result<Self> {
        Ok(spte::deserialize(payload)?)
    }

    /// `result` fra første kall med status 200.
    pub fn into_first_success(self) -> Result<Value> {
        let mut failed = Vec::new();
        for (id, call) in self.calls {
            match (call.status, call.result) {
                (Some(200), Some(result)) => return Ok(result),
                (status, _) => failed.push(format!("{id} (status {status:?})")),
            }
        }
        Err(Error::ServiceCall(if failed.is_empty() {
            "empty response envelope".to_string()
        } else {
            failed.join(", ")
        }))
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// HJELPERE
// ──────────────────────────────────────────────────────────────────────────────

/// Tall som kan komme som JSON-tall, streng eller null. Null/"" → None.
pub fn coerce_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

/// ISO-8601 med eller uten offset/brøkdelssekunder. Med offset beholdes
/// veggklokke-tiden (lokal tid hos brukeren).
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.naive_local());
        }
    }
    Err(Error::value("timestamp", s))
}

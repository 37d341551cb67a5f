// core/src/activity.rs
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use serde_path_to_error as spte;
use url::form_urlencoded;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::graph::{coerce_i64, decode_new_graph, parse_datetime, AjaxEnvelope};
use crate::models::{ActivityLogEntry, ActivityLogSample, Series};
use crate::observer::Method;

pub const KM_PER_MILE: f64 = 1.609344;

const AJAX_PATH: &str = "/ajaxapi";
const AJAX_TEMPLATE: &str = "activities/modules/models/ajax.response.json.jsp";
const NEW_GRAPH_PATH: &str = "/graph/getNewGraphData";

static DISTANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9.]+) +(.*)$").expect("valid regex"));

/// Minuttserier knyttet til én aktivitetslogg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActivityRecord {
    CaloriesBurned,
    Steps,
    Floors,
    Pace,
}

impl ActivityRecord {
    pub const ALL: [ActivityRecord; 4] = [
        ActivityRecord::CaloriesBurned,
        ActivityRecord::Steps,
        ActivityRecord::Floors,
        ActivityRecord::Pace,
    ];

    pub fn graph_type(self) -> &'static str {
        match self {
            ActivityRecord::CaloriesBurned => "activityRecordCaloriesBurned",
            ActivityRecord::Steps => "activityRecordSteps",
            ActivityRecord::Floors => "activityRecordFloors",
            ActivityRecord::Pace => "activityRecordPace",
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Aktivitetslogger (AJAX getActivitiesLogs)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawActivityLog {
    id: Value,
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "defaultName", default)]
    default_name: Option<String>,
    #[serde(default)]
    steps: Value,
    #[serde(default)]
    calories: Value,
    #[serde(rename = "formattedDistance", default)]
    formatted_distance: Option<String>,
    #[serde(rename = "formattedDuration", default)]
    formatted_duration: Option<String>,
}

/// Tomt/null/manglende teller som 0; ikke-numerisk tekst er en feil.
fn count_or_zero(what: &'static str, v: &Value) -> Result<u64> {
    match v {
        Value::Null => Ok(0),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        other => coerce_i64(other)
            .map(|n| n.max(0) as u64)
            .ok_or_else(|| Error::value(what, other.to_string())),
    }
}

/// "3.1 miles" → 4.989 km, "5.0 km" → 5.0. Mangler → 0.
pub fn parse_distance_km(formatted: &str) -> Result<f64> {
    let formatted = formatted.trim();
    if formatted.is_empty() {
        return Ok(0.0);
    }
    let caps = DISTANCE_RE
        .captures(formatted)
        .ok_or_else(|| Error::value("distance", formatted))?;
    let amount: f64 = caps[1]
        .parse()
        .map_err(|_| Error::value("distance", formatted))?;
    if caps[2].trim() == "miles" {
        Ok(amount * KM_PER_MILE)
    } else {
        Ok(amount)
    }
}

/// "1:02:03", "45:12" eller "7": venstrefylles med nuller til t:m:s.
pub fn parse_duration(formatted: &str) -> Result<Duration> {
    let formatted = formatted.trim();
    if formatted.is_empty() {
        return Ok(Duration::zero());
    }
    let mut parts = formatted
        .split(':')
        .map(|p| p.trim().parse::<i64>().map_err(|_| Error::value("duration", formatted)))
        .collect::<Result<Vec<_>>>()?;
    if parts.len() > 3 {
        return Err(Error::value("duration", formatted));
    }
    while parts.len() < 3 {
        parts.insert(0, 0);
    }
    let invalid = || Error::value("duration", formatted);
    let h = Duration::try_hours(parts[0]).ok_or_else(invalid)?;
    let m = Duration::try_minutes(parts[1]).ok_or_else(invalid)?;
    let s = Duration::try_seconds(parts[2]).ok_or_else(invalid)?;
    h.checked_add(&m)
        .and_then(|hm| hm.checked_add(&s))
        .ok_or_else(invalid)
}

fn id_string(v: &Value) -> Result<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(Error::value("activity id", other.to_string())),
    }
}

fn marshal_activity_log(raw: RawActivityLog) -> Result<ActivityLogEntry> {
    let name = raw
        .name
        .filter(|n| !n.is_empty())
        .or(raw.default_name)
        .unwrap_or_default();
    Ok(ActivityLogEntry {
        id: id_string(&raw.id)?,
        timestamp: parse_datetime(&raw.date_time)?,
        name,
        steps: count_or_zero("steps", &raw.steps)?,
        distance_km: parse_distance_km(raw.formatted_distance.as_deref().unwrap_or(""))?,
        duration: parse_duration(raw.formatted_duration.as_deref().unwrap_or(""))?,
        calories: count_or_zero("calories", &raw.calories)?,
    })
}

/// Dekoder `result`-lista og filtrerer på dato: serverens datofilter slipper
/// gjennom logger fra andre dager.
pub fn decode_activity_logs(result: Value, date: NaiveDate) -> Result<Vec<ActivityLogEntry>> {
    let raw: Vec<RawActivityLog> = spte::deserialize(result)?;
    let mut logs = Vec::with_capacity(raw.len());
    for r in raw {
        let entry = marshal_activity_log(r)?;
        if entry.timestamp.date() == date {
            logs.push(entry);
        } else {
            log::debug!("dropping activity log {} dated {}", entry.id, entry.timestamp);
        }
    }
    Ok(logs)
}

// ──────────────────────────────────────────────────────────────────────────────
// Sammenslåing av minuttseriene
// ──────────────────────────────────────────────────────────────────────────────

/// Ytre join på tidsstempel; hull fylles med `None`. Sortert kronologisk.
pub fn join_activity_series(
    calories: &Series,
    steps: &Series,
    floors: &Series,
    pace: &Series,
) -> Vec<ActivityLogSample> {
    let mut rows: BTreeMap<NaiveDateTime, ActivityLogSample> = BTreeMap::new();
    let mut put = |series: &Series, set: fn(&mut ActivityLogSample, i64)| {
        for s in series {
            let row = rows.entry(s.timestamp).or_insert(ActivityLogSample {
                timestamp: s.timestamp,
                calories: None,
                steps: None,
                floors: None,
                pace: None,
            });
            set(row, s.value);
        }
    };
    put(calories, |r, v| r.calories = Some(v));
    put(steps, |r, v| r.steps = Some(v));
    put(floors, |r, v| r.floors = Some(v));
    put(pace, |r, v| r.pace = Some(v));
    rows.into_values().collect()
}

fn service_call(id: &str, name: &str, method: &str, args: Value) -> Value {
    json!({
        "serviceCalls": [{ "id": id, "name": name, "method": method, "args": args }],
        "template": AJAX_TEMPLATE,
    })
}

impl Client {
    /// Ett service-kall mot `/ajaxapi`; returnerer `result` for kallet med status 200.
    pub fn ajax_call(&self, id: &str, name: &str, method: &str, args: Value) -> Result<Value> {
        let request = service_call(id, name, method, args);
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("request", &serde_json::to_string(&request)?)
            .finish();
        let payload = self.session().request_json_body(AJAX_PATH, &body)?;
        AjaxEnvelope::decode(payload)?.into_first_success()
    }

    /// Aktivitetslogger for `date` (maks 10, slik nettsiden selv spør).
    pub fn activity_logs(&self, date: NaiveDate) -> Result<Vec<ActivityLogEntry>> {
        let result = self.ajax_call(
            "GET /api/2/user/activities/logs",
            "user",
            "getActivitiesLogs",
            json!({
                "fromDate": date.to_string(),
                "toDate": date.to_string(),
                "period": "day",
                "offset": 0,
                "limit": 10,
            }),
        )?;
        decode_activity_logs(result, date)
    }

    pub fn activity_log_data_calories(&self, date: NaiveDate, log_id: &str) -> Result<Series> {
        self.activity_log_data(date, log_id, ActivityRecord::CaloriesBurned)
    }

    pub fn activity_log_data_steps(&self, date: NaiveDate, log_id: &str) -> Result<Series> {
        self.activity_log_data(date, log_id, ActivityRecord::Steps)
    }

    pub fn activity_log_data_floors(&self, date: NaiveDate, log_id: &str) -> Result<Series> {
        self.activity_log_data(date, log_id, ActivityRecord::Floors)
    }

    pub fn activity_log_data_pace(&self, date: NaiveDate, log_id: &str) -> Result<Series> {
        self.activity_log_data(date, log_id, ActivityRecord::Pace)
    }

    /// Minuttserie for én logg; logger uten finkornet spor gir tom serie.
    pub fn activity_log_data(
        &self,
        date: NaiveDate,
        log_id: &str,
        record: ActivityRecord,
    ) -> Result<Series> {
        let params = [
            ("userId", self.user_id().to_string()),
            ("type", record.graph_type().to_string()),
            ("dateFrom", date.to_string()),
            ("dateTo", date.to_string()),
            ("arg", log_id.to_string()),
            ("apiFormat", "json".to_string()),
        ];
        let payload = self.session().request_json(NEW_GRAPH_PATH, &params, Method::Get)?;
        decode_new_graph(payload)
    }

    /// Fire runder (kalorier, skritt, etasjer, tempo), slått sammen på tidsstempel.
    pub fn activity_log_data_all(
        &self,
        date: NaiveDate,
        log_id: &str,
    ) -> Result<Vec<ActivityLogSample>> {
        let calories = self.activity_log_data_calories(date, log_id)?;
        let steps = self.activity_log_data_steps(date, log_id)?;
        let floors = self.activity_log_data_floors(date, log_id)?;
        let pace = self.activity_log_data_pace(date, log_id)?;
        Ok(join_activity_series(&calories, &steps, &floors, &pace))
    }

    /// Minuttdata for et vilkårlig tidsvindu.
    ///
    /// Nettsiden gir bare minuttserier for loggede aktiviteter, så vi lager en
    /// midlertidig annotasjon for vinduet, henter seriene for den og sletter
    /// den igjen (også når hentingen feiler).
    pub fn day_details(
        &self,
        date: NaiveDate,
        records: &[ActivityRecord],
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<BTreeMap<ActivityRecord, Series>> {
        let activity = json!({
            "isAnnotation": true,
            "date": date.to_string(),
            "clock": "24",
            "create": "on",
            "apiFormat": "htmljson",
            "name": "test",
            "annotationStartTimeHours": start.hour().to_string(),
            "annotationStartTimeMinutes": start.minute().to_string(),
            "annotationEndTimeHours": end.hour().to_string(),
            "annotationEndTimeMinutes": end.minute().to_string(),
            "annotationEndTimeDay": "same",
            "note": "Virtual day activity",
            "manualCaloriesEnabled": false,
        });
        let created = self.ajax_call(
            "POST /api/2/user/activities/annotations",
            "user",
            "postActivitiesAnnotations",
            json!({ "activity": serde_json::to_string(&activity)? }),
        )?;

        let annotation_id = id_string(created.get("id").unwrap_or(&Value::Null))?;
        let annotation_date = match created.get("date").and_then(Value::as_str) {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| Error::value("annotation date", s))?,
            None => date,
        };
        log::debug!("created annotation {annotation_id} for {annotation_date}");

        let fetched = self.annotation_series(annotation_date, &annotation_id, records);

        let deleted = self.ajax_call(
            &format!("DELETE /api/2/user/activities/annotations/{annotation_id}"),
            "user",
            "deleteActivitiesAnnotations",
            json!({ "activityId": annotation_id }),
        );
        if let Err(e) = &deleted {
            log::warn!("could not delete annotation {annotation_id}: {e}");
        }

        fetched
    }

    fn annotation_series(
        &self,
        date: NaiveDate,
        annotation_id: &str,
        records: &[ActivityRecord],
    ) -> Result<BTreeMap<ActivityRecord, Series>> {
        let mut out: BTreeMap<ActivityRecord, Series> = BTreeMap::new();
        for &record in records {
            // ts: cache-buster, slik nettsiden selv gjør
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            let params = [
                ("userId", self.user_id().to_string()),
                ("type", record.graph_type().to_string()),
                ("apiFormat", "json".to_string()),
                ("dateFrom", date.to_string()),
                ("dateTo", date.to_string()),
                ("arg", annotation_id.to_string()),
                ("ts", ts.to_string()),
            ];
            let payload = self.session().request_json(NEW_GRAPH_PATH, &params, Method::Get)?;
            out.entry(record).or_default().extend(decode_new_graph(payload)?);
        }
        Ok(out)
    }
}

// core/src/intraday.rs
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::graph::{decode_legacy, LegacyPoint};
use crate::models::{Sample, Series};
use crate::xml::XmlElement;

/// 24 t / 5 min
pub const SAMPLES_PER_DAY: usize = 288;
pub const SAMPLE_MINUTES: i64 = 5;

const GRAPH_PATH: &str = "/graph/getGraphData";
const DATA_VERSION: u32 = 2108;
const SLEEP_DATA_VERSION: u32 = 2112;
const SLEEP_GRAPH_TYPE: &str = "intradaySleep";

/// 5-minutters metrikker fra legacy-endepunktet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntradayMetric {
    Steps,
    CaloriesBurned,
    ActiveScore,
    Floors,
}

impl IntradayMetric {
    pub fn graph_type(self) -> &'static str {
        match self {
            IntradayMetric::Steps => "intradaySteps",
            IntradayMetric::CaloriesBurned => "intradayCaloriesBurned",
            IntradayMetric::ActiveScore => "intradayActiveScore",
            IntradayMetric::Floors => "intradayFloors",
        }
    }
}

/// `date 00:00`, `00:05`, ... `23:55`.
pub fn five_minute_timestamps(date: NaiveDate) -> impl Iterator<Item = NaiveDateTime> {
    let start = date.and_time(NaiveTime::MIN);
    (0..SAMPLES_PER_DAY as i64).map(move |i| start + Duration::minutes(SAMPLE_MINUTES * i))
}

/// Siste ord i `description`, f.eks. "asleep at 11:58pm" → 11:58pm.
/// Hele serien tolkes som 12-timers klokke; feiler ett punkt, prøves 24-timers.
pub fn parse_sleep_times(descriptions: &[&str]) -> Result<Vec<NaiveTime>> {
    let tokens: Vec<&str> = descriptions
        .iter()
        .map(|d| d.split_whitespace().last().unwrap_or(""))
        .collect();

    let parse_all = |fmt: &str| -> Option<Vec<NaiveTime>> {
        tokens
            .iter()
            .map(|t| NaiveTime::parse_from_str(t, fmt).ok())
            .collect()
    };

    parse_all("%I:%M%p")
        .or_else(|| parse_all("%H:%M"))
        .ok_or_else(|| {
            let bad = tokens
                .iter()
                .find(|t| {
                    NaiveTime::parse_from_str(t, "%I:%M%p").is_err()
                        && NaiveTime::parse_from_str(t, "%H:%M").is_err()
                })
                .copied()
                .unwrap_or_default();
            Error::value("sleep time", bad)
        })
}

/// Gir klokkeslettene datoer, slik at en søvnøkt over midnatt blir stigende.
///
/// Hver gang et klokkeslett er mindre enn det forrige, har vi passert
/// midnatt. Første runde teller overgangene og trekker like mange dager fra
/// `date` (første punkt kan høre til kvelden før); andre runde går fremover
/// og legger til en dag ved hver overgang.
pub fn reconstruct_sleep_datetimes(date: NaiveDate, times: &[NaiveTime]) -> Vec<NaiveDateTime> {
    let rollovers = times.windows(2).filter(|w| w[1] < w[0]).count() as i64;

    let mut day = date - Duration::days(rollovers);
    let mut out = Vec::with_capacity(times.len());
    let mut last: Option<NaiveTime> = None;
    for &t in times {
        if matches!(last, Some(prev) if t < prev) {
            day += Duration::days(1);
        }
        out.push(day.and_time(t));
        last = Some(t);
    }
    out
}

impl Client {
    pub fn intraday_steps(&self, date: NaiveDate) -> Result<Series> {
        self.intraday(IntradayMetric::Steps, date)
    }

    pub fn intraday_calories_burned(&self, date: NaiveDate) -> Result<Series> {
        self.intraday(IntradayMetric::CaloriesBurned, date)
    }

    pub fn intraday_active_score(&self, date: NaiveDate) -> Result<Series> {
        self.intraday(IntradayMetric::ActiveScore, date)
    }

    pub fn intraday_floors_climbed(&self, date: NaiveDate) -> Result<Series> {
        self.intraday(IntradayMetric::Floors, date)
    }

    /// Verdier zippes med 288 syntetiske 5-minutters tidsstempler fra midnatt.
    /// Avvikende antall aksepteres (korteste side bestemmer), men logges.
    pub fn intraday(&self, metric: IntradayMetric, date: NaiveDate) -> Result<Series> {
        let root = self.legacy_graph(metric.graph_type(), date, DATA_VERSION, None)?;
        let points = decode_legacy(&root)?;
        if points.len() != SAMPLES_PER_DAY {
            log::warn!(
                "{} for {}: expected {} values, got {}",
                metric.graph_type(),
                date,
                SAMPLES_PER_DAY,
                points.len()
            );
        }
        Ok(five_minute_timestamps(date)
            .zip(points)
            .map(|(ts, p)| Sample::new(ts, p.value))
            .collect())
    }

    /// Søvnstatus per minutt. Verdiene er:
    ///   0: ingen data, 1: sover, 2: urolig, 3: våken
    ///
    /// Dager med flere søvnøkter krever `sleep_id`, ellers kommer første økt.
    pub fn intraday_sleep(&self, date: NaiveDate, sleep_id: Option<&str>) -> Result<Series> {
        let root = self.legacy_graph(SLEEP_GRAPH_TYPE, date, SLEEP_DATA_VERSION, sleep_id)?;
        let points = decode_legacy(&root)?;

        let descriptions = points
            .iter()
            .map(|p| p.description.as_deref().ok_or_else(|| Error::value("sleep description", "")))
            .collect::<Result<Vec<_>>>()?;
        let times = parse_sleep_times(&descriptions)?;
        let datetimes = reconstruct_sleep_datetimes(date, &times);

        Ok(datetimes
            .into_iter()
            .zip(points.iter().map(|p: &LegacyPoint| p.value))
            .map(|(ts, v)| Sample::new(ts, v))
            .collect())
    }

    fn legacy_graph(
        &self,
        graph_type: &str,
        date: NaiveDate,
        data_version: u32,
        arg: Option<&str>,
    ) -> Result<XmlElement> {
        let mut params = vec![
            ("userId", self.user_id().to_string()),
            ("type", graph_type.to_string()),
            ("version", "amchart".to_string()),
            ("dataVersion", data_version.to_string()),
            ("chart_Type", "column2d".to_string()),
            ("period", "1d".to_string()),
            ("dateTo", date.to_string()),
        ];
        if let Some(arg) = arg {
            params.push(("arg", arg.to_string()));
        }
        self.session().request_xml(GRAPH_PATH, &params)
    }
}

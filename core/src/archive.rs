// core/src/archive.rs
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, NaiveDate};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::intraday::IntradayMetric;
use crate::models::Series;

/// Hvor langt bakover vi leter etter siste synkroniserte dag.
pub const LOOKBACK_DAYS: u32 = 365;

/// Metrikkene som dumpes per dag, i skriverekkefølge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Steps,
    Calories,
    ActiveScore,
    Floors,
    Sleep,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Steps,
        Metric::Calories,
        Metric::ActiveScore,
        Metric::Floors,
        Metric::Sleep,
    ];

    pub fn file_stem(self) -> &'static str {
        match self {
            Metric::Steps => "steps",
            Metric::Calories => "calories",
            Metric::ActiveScore => "active_score",
            Metric::Floors => "floors",
            Metric::Sleep => "sleep",
        }
    }
}

/// Det arkivet trenger fra klienten (prod: [`Client`], test: falsk kilde).
pub trait MetricSource {
    fn series(&self, metric: Metric, date: NaiveDate) -> Result<Series>;
}

impl MetricSource for Client {
    fn series(&self, metric: Metric, date: NaiveDate) -> Result<Series> {
        match metric {
            Metric::Steps => self.intraday(IntradayMetric::Steps, date),
            Metric::Calories => self.intraday(IntradayMetric::CaloriesBurned, date),
            Metric::ActiveScore => self.intraday(IntradayMetric::ActiveScore, date),
            Metric::Floors => self.intraday(IntradayMetric::Floors, date),
            Metric::Sleep => self.intraday_sleep(date, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSummary {
    /// Nyeste dag med data.
    pub latest: NaiveDate,
    /// Dager som ble skrevet, i den rekkefølgen de ble skrevet.
    pub written: Vec<NaiveDate>,
}

/// Katalogtre `root/<år>/<YYYY-MM-DD>/<metrikk>.csv`.
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
    pause: StdDuration,
}

impl Archive {
    pub fn new(root: impl Into<PathBuf>, pause: StdDuration) -> Self {
        Self { root: root.into(), pause }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn day_dir(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(date.year().to_string())
            .join(date.format("%Y-%m-%d").to_string())
    }

    pub fn previously_dumped(&self, date: NaiveDate) -> bool {
        self.day_dir(date).is_dir()
    }

    /// Én `timestamp,value`-linje per punkt, uten header.
    pub fn write_series(&self, metric: Metric, date: NaiveDate, series: &Series) -> Result<PathBuf> {
        let dir = self.day_dir(date);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.csv", metric.file_stem()));

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        for s in series {
            writer.write_record([
                s.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                s.value.to_string(),
            ])?;
        }
        writer.flush()?;
        log::debug!("wrote {} rows to {}", series.len(), path.display());

        if !self.pause.is_zero() {
            std::thread::sleep(self.pause);
        }
        Ok(path)
    }

    /// Dumper én dag. Er alle skritt 0, regnes dagen som uten data og
    /// ingenting skrives.
    pub fn dump_day(&self, source: &dyn MetricSource, date: NaiveDate) -> Result<bool> {
        let steps = source.series(Metric::Steps, date)?;
        if steps.iter().all(|s| s.value == 0) {
            log::info!("{date}: no steps recorded, treating as no data");
            return Ok(false);
        }

        self.write_series(Metric::Steps, date, &steps)?;
        for metric in Metric::ALL.into_iter().filter(|m| *m != Metric::Steps) {
            let series = source.series(metric, date)?;
            self.write_series(metric, date, &series)?;
        }
        log::info!("{date}: dumped");
        Ok(true)
    }

    /// 1) Finn nyeste dag med data (maks [`LOOKBACK_DAYS`] tilbake).
    /// 2) Fortsett bakover til en dag som allerede er dumpet, eller uten data.
    /// 3) Dump alltid den siste dagen på nytt: den kan ha blitt dumpet før
    ///    dagen var ferdig.
    pub fn run(&self, source: &dyn MetricSource, today: NaiveDate) -> Result<DumpSummary> {
        let mut written = Vec::new();

        let mut latest = None;
        for offset in 0..i64::from(LOOKBACK_DAYS) {
            let date = today - Duration::days(offset);
            if self.dump_day(source, date)? {
                written.push(date);
                latest = Some(date);
                break;
            }
        }
        let latest = latest.ok_or(Error::NoRecentData { days: LOOKBACK_DAYS })?;

        let mut date = latest - Duration::days(1);
        while !self.previously_dumped(date) {
            let had_data = self.dump_day(source, date)?;
            if had_data {
                written.push(date);
            }
            date -= Duration::days(1);
            if !had_data {
                break;
            }
        }

        if self.dump_day(source, date)? {
            written.push(date);
        }

        Ok(DumpSummary { latest, written })
    }
}

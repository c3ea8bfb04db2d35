use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::scorer::compute_trend;
use crate::types::{NicheRecord, NicheSummary};

// ---------------------------------------------------------------------------
// NicheDatabase — the persisted document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheDatabase {
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_updated: DateTime<Utc>,
    /// niche key → record
    pub niches: BTreeMap<String, NicheRecord>,
    /// date → region code → raw summaries stored that day
    pub historical_data: BTreeMap<NaiveDate, BTreeMap<String, Vec<NicheSummary>>>,
}

/// RFC 3339, or an ISO-8601 timestamp without offset read as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

impl NicheDatabase {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            last_updated: now,
            niches: BTreeMap::new(),
            historical_data: BTreeMap::new(),
        }
    }

    /// Merge one day's summaries for `region` into the database in memory.
    ///
    /// Same-day reruns overwrite the day's CPM, engagement and snapshot entries,
    /// so applying identical input twice leaves the same state as applying it once.
    pub fn apply(
        &mut self,
        summaries: &[NicheSummary],
        region: &str,
        as_of: NaiveDate,
        now: DateTime<Utc>,
    ) {
        self.historical_data
            .entry(as_of)
            .or_default()
            .insert(region.to_string(), summaries.to_vec());

        for summary in summaries {
            let record = self
                .niches
                .entry(summary.key())
                .or_insert_with(|| NicheRecord::new(&summary.category, &summary.subcategory, as_of));

            record.last_seen = as_of;
            record.historical_cpm.insert(as_of, summary.estimated_cpm);
            record
                .historical_engagement
                .insert(as_of, summary.avg_engagement_rate);
            record.trend = compute_trend(record);
        }

        self.last_updated = now;
    }

    pub fn has_snapshot(&self, date: NaiveDate) -> bool {
        self.historical_data.contains_key(&date)
    }

    pub fn snapshot(&self, date: NaiveDate) -> Option<&BTreeMap<String, Vec<NicheSummary>>> {
        self.historical_data.get(&date)
    }

    pub fn niche(&self, key: &str) -> Option<&NicheRecord> {
        self.niches.get(key)
    }
}

// ---------------------------------------------------------------------------
// NicheStore — file-backed owner of the database
// ---------------------------------------------------------------------------

/// Owns the niche database and its JSON file.
///
/// Every update rewrites the whole file. There is no locking: with several
/// processes on one file the last writer wins.
pub struct NicheStore {
    path: PathBuf,
    db: NicheDatabase,
}

impl NicheStore {
    /// Load the database at `path`.
    ///
    /// A missing or malformed file is replaced by an empty database, which is
    /// written out immediately. Other I/O failures are returned.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if path.exists() {
            let contents = fs::read(&path)?;
            match serde_json::from_slice::<NicheDatabase>(&contents) {
                Ok(db) => {
                    info!(
                        path = %path.display(),
                        niches = db.niches.len(),
                        snapshots = db.historical_data.len(),
                        "Niche database loaded"
                    );
                    return Ok(Self { path, db });
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        "Niche database is corrupt ({e}); starting from an empty one"
                    );
                }
            }
        } else {
            info!(path = %path.display(), "No niche database found; creating an empty one");
        }

        let store = Self {
            path,
            db: NicheDatabase::empty(Utc::now()),
        };
        store.save()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database(&self) -> &NicheDatabase {
        &self.db
    }

    /// Apply one day's summaries for `region` and flush the full database.
    pub fn update(&mut self, summaries: &[NicheSummary], region: &str, as_of: NaiveDate) -> Result<()> {
        self.db.apply(summaries, region, as_of, Utc::now());
        self.save()?;
        info!(
            region,
            date = %as_of,
            summaries = summaries.len(),
            niches = self.db.niches.len(),
            "Niche database updated"
        );
        Ok(())
    }

    /// Write the database to a temp file next to the target, then rename it
    /// over the target so readers never see a half-written file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let json = serde_json::to_string_pretty(&self.db)?;
        let result = fs::write(&tmp_path, json).and_then(|_| fs::rename(&tmp_path, &self.path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result?;

        debug!(path = %self.path.display(), "Niche database saved");
        Ok(())
    }
}

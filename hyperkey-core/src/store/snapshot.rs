use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// A named copy of a layout the user can go back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedSnapshot {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub config: Config,
}

impl NamedSnapshot {
    pub fn new(name: impl Into<String>, config: Config) -> Self {
        Self::at(name, config, Utc::now())
    }

    pub fn at(name: impl Into<String>, config: Config, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at,
            config,
        }
    }
}

/// Puts `snapshots` in creation order, then drops the oldest until at most `max` remain.
/// Zero means unbounded.
pub fn bound(snapshots: &mut Vec<NamedSnapshot>, max: usize) {
    snapshots.sort_by_key(|s| s.created_at);
    if max > 0 && snapshots.len() > max {
        let excess = snapshots.len() - max;
        tracing::debug!("evicting {} oldest snapshot(s)", excess);
        snapshots.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(name: &str, minute: u32) -> NamedSnapshot {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap();
        NamedSnapshot::at(name, Config::new(), created_at)
    }

    #[test]
    fn evicts_oldest_first() {
        let mut snapshots = vec![snapshot("a", 0), snapshot("b", 1), snapshot("c", 2)];
        bound(&mut snapshots, 2);
        let names: Vec<_> = snapshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["b", "c"]);

        bound(&mut snapshots, 0);
        assert_eq!(snapshots.len(), 2);
    }

    #[test]
    fn evicts_by_creation_time_not_position() {
        let mut snapshots = vec![snapshot("newest", 9), snapshot("old", 1), snapshot("mid", 4)];
        bound(&mut snapshots, 2);
        let names: Vec<_> = snapshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["mid", "newest"]);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(snapshot("a", 0).id, snapshot("a", 0).id);
    }

    #[test]
    fn serializes_created_at_as_rfc3339() {
        let value = serde_json::to_value(snapshot("a", 5)).unwrap();
        assert_eq!(value["createdAt"], "2024-05-01T12:05:00Z");
    }
}

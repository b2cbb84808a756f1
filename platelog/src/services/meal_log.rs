use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::models::{DailyStats, LogStats, MealBreakdown, MealLogEntry};

/// Entries matching a history query, newest first, with stats over every
/// match (not just the returned page).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub entries: Vec<MealLogEntry>,
    pub stats: LogStats,
}

/// Process-lifetime meal log.
///
/// All mutations take the write lock and return the resulting log from under
/// that same lock, so a response never shows a half-applied change.
#[derive(Debug, Clone, Default)]
pub struct MealLog {
    entries: Arc<RwLock<Vec<MealLogEntry>>>,
}

impl MealLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a completed estimate and returns the log in append order.
    pub async fn append(&self, entry: MealLogEntry) -> Vec<MealLogEntry> {
        let mut entries = self.entries.write().await;
        tracing::debug!(id = %entry.id, total_calories = entry.total_calories(), "Appending meal");
        entries.push(entry);
        entries.clone()
    }

    /// Replaces the estimate of an existing entry, keeping its id, creation
    /// time and position. `None` when no entry has this id.
    pub async fn replace(
        &self,
        id: &str,
        description: &str,
        breakdown: MealBreakdown,
    ) -> Option<(MealLogEntry, Vec<MealLogEntry>)> {
        let mut entries = self.entries.write().await;
        let entry = entries.iter_mut().find(|entry| entry.id == id)?;

        entry.description = description.to_string();
        entry.breakdown = breakdown;
        entry.updated_at = Some(Utc::now());
        let updated = entry.clone();

        Some((updated, entries.clone()))
    }

    /// Removes an entry. Unknown ids leave the log unchanged.
    pub async fn remove(&self, id: &str) -> (bool, Vec<MealLogEntry>) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        (entries.len() != before, entries.clone())
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.iter().any(|entry| entry.id == id)
    }

    pub async fn entries(&self) -> Vec<MealLogEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn query(&self, date: Option<NaiveDate>, limit: usize) -> HistoryPage {
        let entries = self.entries.read().await;
        let mut matching: Vec<&MealLogEntry> = entries
            .iter()
            .filter(|entry| date.map_or(true, |date| entry.date() == date))
            .collect();

        let stats = LogStats::from_entries(matching.iter().copied());

        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        HistoryPage {
            entries: matching.into_iter().take(limit).cloned().collect(),
            stats,
        }
    }

    pub async fn daily_stats(&self, date: NaiveDate) -> DailyStats {
        let entries = self.entries.read().await;
        DailyStats {
            date,
            stats: LogStats::from_entries(entries.iter().filter(|entry| entry.date() == date)),
        }
    }

    /// Drops every entry.
    pub async fn reset(&self) {
        self.entries.write().await.clear();
    }
}

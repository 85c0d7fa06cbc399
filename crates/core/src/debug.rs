//! Debug collection of cache commands
//!
//! [`Collected`] wraps any [`Cache`] backend and records every single-key
//! command it forwards into a shared [`CacheCollector`]. Batch operations and
//! counters are recorded as the single-key commands they are made of.

use crate::cache::Cache;
use crate::errors::Result;
use crate::serializer::Serializer;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::time::Instant;

/// Command recorded by a collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Get,
    Set,
    Delete,
    Flush,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Command::Get => "GET",
            Command::Set => "SET",
            Command::Delete => "DELETE",
            Command::Flush => "FLUSH",
        })
    }
}

/// One executed command
#[derive(Debug, Clone)]
pub struct CommandRecord {
    pub command: Command,
    pub ok: bool,
    pub key: Option<String>,
    /// JSON rendering of the written value, for writes
    pub value: Option<String>,
    /// Effective TTL in seconds, for writes
    pub ttl: Option<i64>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub elapsed_micros: u128,
}

impl CommandRecord {
    pub fn status(&self) -> &'static str {
        if self.ok {
            "OK"
        } else {
            "FAIL"
        }
    }

    /// Expiry moment of a write
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.ttl
            .map(|ttl| self.start + chrono::Duration::seconds(ttl))
    }
}

/// Timeline entry, one per recorded command
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub collector: &'static str,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Backend description captured when a collector is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorInfo {
    pub handler: &'static str,
    pub serializer: Serializer,
    pub prefix: Option<String>,
}

#[derive(Debug, Default)]
struct CollectorState {
    info: Option<CollectorInfo>,
    records: Vec<CommandRecord>,
}

/// Shared, cloneable sink for command records
#[derive(Debug, Clone, Default)]
pub struct CacheCollector {
    state: Arc<Mutex<CollectorState>>,
}

impl CacheCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_info(&self, info: CollectorInfo) {
        self.state.lock().info = Some(info);
    }

    pub fn info(&self) -> Option<CollectorInfo> {
        self.state.lock().info.clone()
    }

    /// Name of the attached backend, if any
    pub fn handler(&self) -> Option<&'static str> {
        self.state.lock().info.as_ref().map(|info| info.handler)
    }

    pub fn records(&self) -> Vec<CommandRecord> {
        self.state.lock().records.clone()
    }

    pub fn has_records(&self) -> bool {
        !self.state.lock().records.is_empty()
    }

    pub fn add(&self, record: CommandRecord) {
        tracing::debug!(
            command = %record.command,
            status = record.status(),
            key = record.key.as_deref().unwrap_or(""),
            elapsed_micros = record.elapsed_micros as u64,
            "cache command"
        );
        self.state.lock().records.push(record);
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.state
            .lock()
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| Activity {
                collector: "cache",
                description: format!("Run command {}", index + 1),
                start: record.start,
                end: record.end,
            })
            .collect()
    }

    /// Total time spent in recorded commands, in milliseconds
    pub fn commands_time_ms(&self) -> f64 {
        let micros: u128 = self
            .state
            .lock()
            .records
            .iter()
            .map(|r| r.elapsed_micros)
            .sum();
        micros as f64 / 1000.0
    }

    /// Plain-text summary of the backend and every recorded command
    pub fn report(&self) -> String {
        let state = self.state.lock();
        let Some(info) = &state.info else {
            return "This collector has not been added to a Cache instance.\n".to_string();
        };

        let mut out = String::new();
        let _ = writeln!(out, "Handler: {}", info.handler);
        if let Some(prefix) = &info.prefix {
            let _ = writeln!(out, "Keys Prefix: {prefix}");
        }
        let _ = writeln!(out, "Serializer: {}", info.serializer);
        let _ = writeln!(out, "Commands");

        if state.records.is_empty() {
            let _ = writeln!(out, "No command was run.");
            return out;
        }

        let count = state.records.len();
        let total: u128 = state.records.iter().map(|r| r.elapsed_micros).sum();
        let _ = writeln!(
            out,
            "Ran {count} command{} in {:.3} ms:",
            if count == 1 { "" } else { "s" },
            total as f64 / 1000.0
        );
        for (index, record) in state.records.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>3}  {:<6} {:<4} {:<24} {:>6} {:<19} {:>9.3}  {}",
                index + 1,
                record.command,
                record.status(),
                record.key.as_deref().unwrap_or(""),
                record.ttl.map(|t| t.to_string()).unwrap_or_default(),
                record
                    .expires_at()
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
                record.elapsed_micros as f64 / 1000.0,
                record.value.as_deref().map(preview).unwrap_or_default()
            );
        }
        out
    }
}

const PREVIEW_CHARS: usize = 40;

fn preview(value: &str) -> String {
    if value.chars().count() <= PREVIEW_CHARS {
        return value.to_string();
    }
    let mut short: String = value.chars().take(PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}

/// Cache decorator that times every command into a [`CacheCollector`]
pub struct Collected<C> {
    inner: C,
    collector: CacheCollector,
}

impl<C: Cache> Collected<C> {
    pub fn new(inner: C, collector: CacheCollector) -> Self {
        collector.set_info(CollectorInfo {
            handler: inner.handler(),
            serializer: inner.serializer(),
            prefix: inner.prefix().map(str::to_string),
        });
        Self { inner, collector }
    }

    pub fn collector(&self) -> &CacheCollector {
        &self.collector
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn timed<R>(
        &self,
        command: Command,
        key: Option<&str>,
        value: Option<String>,
        ttl: Option<i64>,
        run: impl FnOnce(&C) -> R,
        ok: impl FnOnce(&R) -> bool,
    ) -> R {
        let start = Utc::now();
        let clock = Instant::now();
        let result = run(&self.inner);
        let elapsed = clock.elapsed();
        self.collector.add(CommandRecord {
            command,
            ok: ok(&result),
            key: key.map(str::to_string),
            value,
            ttl,
            start,
            end: start + chrono::Duration::microseconds(elapsed.as_micros() as i64),
            elapsed_micros: elapsed.as_micros(),
        });
        result
    }
}

impl<C: Cache> Cache for Collected<C> {
    fn handler(&self) -> &'static str {
        self.inner.handler()
    }

    fn serializer(&self) -> Serializer {
        self.inner.serializer()
    }

    fn prefix(&self) -> Option<&str> {
        self.inner.prefix()
    }

    fn default_ttl(&self) -> i64 {
        self.inner.default_ttl()
    }

    fn set_default_ttl(&mut self, ttl: i64) -> Result<()> {
        self.inner.set_default_ttl(ttl)
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.timed(
            Command::Get,
            Some(key),
            None,
            None,
            |cache| cache.get(key),
            Option::is_some,
        )
    }

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<i64>) -> Result<bool> {
        let effective = crate::cache::resolve_ttl(ttl, self.inner.default_ttl());
        // Values serde_json cannot represent (non-string map keys) are not shown
        let rendered = serde_json::to_string(value).ok();
        self.timed(
            Command::Set,
            Some(key),
            rendered,
            Some(effective),
            |cache| cache.set(key, value, ttl),
            |result| matches!(result, Ok(true)),
        )
    }

    fn delete(&self, key: &str) -> bool {
        self.timed(
            Command::Delete,
            Some(key),
            None,
            None,
            |cache| cache.delete(key),
            |ok| *ok,
        )
    }

    fn flush(&self) -> bool {
        self.timed(Command::Flush, None, None, None, |cache| cache.flush(), |ok| *ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::MemoryCache;

    #[test]
    fn test_detached_collector() {
        let collector = CacheCollector::new();
        assert!(collector
            .report()
            .contains("This collector has not been added to a Cache instance"));
        assert_eq!(collector.handler(), None);
    }

    #[test]
    fn test_attached_collector_reports_backend() {
        let cache = Collected::new(MemoryCache::new(), CacheCollector::new());
        let report = cache.collector().report();
        assert!(report.contains("Handler: memory"));
        assert!(report.contains("Serializer: json"));
        assert!(report.contains("No command was run."));
        assert!(cache.collector().activities().is_empty());
    }

    #[test]
    fn test_commands_are_recorded() {
        let collector = CacheCollector::new();
        let cache = Collected::new(MemoryCache::new(), collector.clone());

        let _: Option<String> = cache.get("foo");
        assert!(collector.report().contains("Ran 1 command in"));
        assert!(collector.report().contains("GET"));

        cache.set("xxx", "foo", Some(1)).unwrap();
        assert!(collector.report().contains("Ran 2 commands"));
        assert!(collector.report().contains("SET"));

        cache.delete("xxx");
        assert!(collector.report().contains("Ran 3 commands"));
        assert!(collector.report().contains("DELETE"));

        cache.flush();
        assert!(collector.report().contains("Ran 4 commands"));
        assert!(collector.report().contains("FLUSH"));

        let records = collector.records();
        assert!(!records[0].ok);
        assert!(records[1].ok);
        assert_eq!(records[1].ttl, Some(1));
        assert!(records[1].expires_at().is_some());

        let activities = collector.activities();
        assert_eq!(activities.len(), 4);
        assert_eq!(activities[0].description, "Run command 1");
        assert!(activities[0].start <= activities[0].end);
    }

    #[test]
    fn test_set_records_value() {
        let collector = CacheCollector::new();
        let cache = Collected::new(MemoryCache::new(), collector.clone());
        cache.set("k", "foo", None).unwrap();
        cache.set("long", &"x".repeat(100), None).unwrap();
        let _: Option<String> = cache.get("k");

        let records = collector.records();
        assert_eq!(records[0].value.as_deref(), Some("\"foo\""));
        assert_eq!(records[2].value, None);

        let report = collector.report();
        assert!(report.contains("\"foo\""));
        assert!(report.contains(&format!("\"{}...", "x".repeat(39))));
        assert!(!report.contains(&"x".repeat(41)));
    }

    #[test]
    fn test_set_records_default_ttl() {
        let collector = CacheCollector::new();
        let cache = Collected::new(MemoryCache::new(), collector.clone());
        cache.set("k", &1, None).unwrap();
        assert_eq!(collector.records()[0].ttl, Some(60));
    }

    #[test]
    fn test_batch_operations_are_recorded_per_key() {
        let collector = CacheCollector::new();
        let cache = Collected::new(MemoryCache::new(), collector.clone());
        cache.set_multi([("a", 1), ("b", 2)], None).unwrap();
        cache.increment("a", 1, None).unwrap();

        let commands: Vec<Command> = collector.records().iter().map(|r| r.command).collect();
        assert_eq!(
            commands,
            vec![Command::Set, Command::Set, Command::Get, Command::Set]
        );
    }
}

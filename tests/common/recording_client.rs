use async_trait::async_trait;
use parking_lot::Mutex;
use sheet_transfer::client::{InMemoryTableClient, RemoteResult, RemoteTableClient};
use sheet_transfer::error::{RemoteError, RemoteErrorKind};
use sheet_transfer::types::Row;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Get,
    Update,
    Append,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Started,
    Finished,
}

/// One entry of the call log
#[derive(Debug, Clone)]
pub struct CallEvent {
    pub kind: CallKind,
    pub phase: CallPhase,
    pub table_id: String,
    pub range: String,
    pub rows: usize,
    pub at: Instant,
    pub ok: bool,
}

/// Injected failure for calls matching `kind`, `table_id` and optionally `range`.
/// The first `after` matching calls pass, then up to `times` calls fail.
#[derive(Debug, Clone)]
pub struct FailureRule {
    pub kind: CallKind,
    pub table_id: String,
    pub range: Option<String>,
    pub error_kind: RemoteErrorKind,
    pub after: usize,
    pub times: Option<usize>,
    seen: usize,
    fired: usize,
}

impl FailureRule {
    pub fn always(kind: CallKind, table_id: &str, error_kind: RemoteErrorKind) -> Self {
        Self {
            kind,
            table_id: table_id.to_string(),
            range: None,
            error_kind,
            after: 0,
            times: None,
            seen: 0,
            fired: 0,
        }
    }

    pub fn on_range(mut self, range: &str) -> Self {
        self.range = Some(range.to_string());
        self
    }

    pub fn after(mut self, calls: usize) -> Self {
        self.after = calls;
        self
    }

    pub fn times(mut self, times: usize) -> Self {
        self.times = Some(times);
        self
    }

    fn matches(&self, kind: CallKind, table_id: &str, range: &str) -> bool {
        self.kind == kind
            && self.table_id == table_id
            && self.range.as_deref().map_or(true, |r| r == range)
    }
}

/// Wraps an [`InMemoryTableClient`], logging every call and injecting failures
#[derive(Debug, Default)]
pub struct RecordingClient {
    pub inner: InMemoryTableClient,
    events: Mutex<Vec<CallEvent>>,
    rules: Mutex<Vec<FailureRule>>,
    get_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `get` take `delay` to complete
    pub fn with_get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = delay;
        self
    }

    pub fn fail(&self, rule: FailureRule) {
        self.rules.lock().push(rule);
    }

    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().clone()
    }

    /// Started calls of one kind, in call order
    pub fn calls(&self, kind: CallKind) -> Vec<CallEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind && e.phase == CallPhase::Started)
            .cloned()
            .collect()
    }

    /// Started calls against one table, in call order
    pub fn calls_to(&self, table_id: &str) -> Vec<CallEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.table_id == table_id && e.phase == CallPhase::Started)
            .cloned()
            .collect()
    }

    pub fn max_concurrent_gets(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, kind: CallKind, phase: CallPhase, table_id: &str, range: &str, rows: usize, ok: bool) {
        self.events.lock().push(CallEvent {
            kind,
            phase,
            table_id: table_id.to_string(),
            range: range.to_string(),
            rows,
            at: Instant::now(),
            ok,
        });
    }

    fn injected(&self, kind: CallKind, table_id: &str, range: &str) -> RemoteResult<()> {
        let mut rules = self.rules.lock();
        for rule in rules.iter_mut().filter(|r| r.matches(kind, table_id, range)) {
            rule.seen += 1;
            if rule.seen > rule.after && rule.times.map_or(true, |t| rule.fired < t) {
                rule.fired += 1;
                let message = format!("injected {kind:?} failure on {table_id}/{range}");
                return Err(match rule.error_kind {
                    RemoteErrorKind::Transient => RemoteError::transient(message),
                    RemoteErrorKind::Permanent => RemoteError::permanent(message),
                });
            }
        }
        Ok(())
    }

    fn finish<T>(&self, kind: CallKind, table_id: &str, range: &str, rows: usize, result: RemoteResult<T>) -> RemoteResult<T> {
        self.record(kind, CallPhase::Finished, table_id, range, rows, result.is_ok());
        result
    }
}

#[async_trait]
impl RemoteTableClient for RecordingClient {
    async fn get(&self, table_id: &str, range: &str) -> RemoteResult<Vec<Row>> {
        self.record(CallKind::Get, CallPhase::Started, table_id, range, 0, true);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.get_delay.is_zero() {
            sleep(self.get_delay).await;
        }
        let result = match self.injected(CallKind::Get, table_id, range) {
            Ok(()) => self.inner.get(table_id, range).await,
            Err(error) => Err(error),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let rows = result.as_ref().map_or(0, Vec::len);
        self.finish(CallKind::Get, table_id, range, rows, result)
    }

    async fn update(&self, table_id: &str, range: &str, rows: &[Row]) -> RemoteResult<()> {
        self.record(CallKind::Update, CallPhase::Started, table_id, range, rows.len(), true);
        let result = match self.injected(CallKind::Update, table_id, range) {
            Ok(()) => self.inner.update(table_id, range, rows).await,
            Err(error) => Err(error),
        };
        self.finish(CallKind::Update, table_id, range, rows.len(), result)
    }

    async fn append(&self, table_id: &str, range: &str, rows: &[Row]) -> RemoteResult<()> {
        self.record(CallKind::Append, CallPhase::Started, table_id, range, rows.len(), true);
        let result = match self.injected(CallKind::Append, table_id, range) {
            Ok(()) => self.inner.append(table_id, range, rows).await,
            Err(error) => Err(error),
        };
        self.finish(CallKind::Append, table_id, range, rows.len(), result)
    }

    async fn clear(&self, table_id: &str, range: &str) -> RemoteResult<()> {
        self.record(CallKind::Clear, CallPhase::Started, table_id, range, 0, true);
        let result = match self.injected(CallKind::Clear, table_id, range) {
            Ok(()) => self.inner.clear(table_id, range).await,
            Err(error) => Err(error),
        };
        self.finish(CallKind::Clear, table_id, range, 0, result)
    }
}

//! The placeholder ledger and its snapshot/commit protocol.
//!
//! Reconciliation is a two-call protocol:
//!
//! 1. [`PlaceholderLedger::list_all`] returns the current placeholder set and
//!    starts queueing every later add/remove in memory.
//! 2. [`PlaceholderLedger::commit_reconciled`] rewrites the log as the
//!    caller's reconciled set followed by the queued mutations, then stops
//!    queueing.
//!
//! The log lock is held while the snapshot is read and the queue is created,
//! so each concurrent mutation ends up either in the snapshot or in the
//! queue.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use phold_log::{LogRecord, RecordLog};
use phold_types::{ContentHash, PlaceholderRecord};
use tracing::{debug, info};

use crate::codec::PlaceholderCodec;
use crate::config::{LedgerConfig, PathCase};
use crate::error::{LedgerError, LedgerResult};

type PlaceholderMutation = LogRecord<String, ContentHash>;

/// Protocol state kept under the log lock.
#[derive(Debug)]
enum SnapshotState {
    Idle,
    /// A snapshot was handed out; mutations since then, in append order.
    Outstanding(Vec<PlaceholderMutation>),
}

impl SnapshotState {
    fn begin(&mut self) -> LedgerResult<()> {
        match self {
            SnapshotState::Outstanding(_) => Err(LedgerError::SnapshotAlreadyOutstanding),
            SnapshotState::Idle => {
                *self = SnapshotState::Outstanding(Vec::new());
                Ok(())
            }
        }
    }

    fn record(&mut self, mutation: PlaceholderMutation) {
        if let SnapshotState::Outstanding(pending) = self {
            pending.push(mutation);
        }
    }
}

/// Persistent set of placeholders, keyed by path.
///
/// Safe to share between threads. Every mutation is durable before it is
/// reflected in [`estimated_count`](Self::estimated_count) or in a pending
/// snapshot queue.
pub struct PlaceholderLedger {
    log: RecordLog<PlaceholderCodec, SnapshotState>,
    /// Best-effort live count; exact after open and after each commit.
    estimated_count: AtomicI64,
    path_case: PathCase,
}

impl std::fmt::Debug for PlaceholderLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderLedger")
            .field("path", &self.log.path())
            .field("estimated_count", &self.estimated_count())
            .field("path_case", &self.path_case)
            .finish()
    }
}

impl PlaceholderLedger {
    /// Open the ledger at `path` with the default configuration.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        Self::open_with_config(path, LedgerConfig::default())
    }

    /// Open the ledger at `path`, replaying it once to count live entries.
    pub fn open_with_config(path: &Path, config: LedgerConfig) -> LedgerResult<Self> {
        let log = RecordLog::open(path, config.log, SnapshotState::Idle)?;

        let mut entries = BTreeMap::new();
        let summary = log.load::<LedgerError, _, _>(
            |_| Ok(()),
            |mutation| {
                apply(&mut entries, mutation, config.path_case);
            },
        )?;

        info!(
            path = %path.display(),
            live = entries.len(),
            adds = summary.adds,
            removes = summary.removes,
            "placeholder ledger opened"
        );
        Ok(Self {
            log,
            estimated_count: AtomicI64::new(entries.len() as i64),
            path_case: config.path_case,
        })
    }

    /// Path to the backing log file.
    pub fn path(&self) -> &Path {
        self.log.path()
    }

    /// Approximate number of live placeholders.
    ///
    /// Adding an already-present path or removing an absent one still moves
    /// the count, so it can drift until the next commit recounts it.
    pub fn estimated_count(&self) -> i64 {
        self.estimated_count.load(Ordering::Relaxed)
    }

    /// Record that `path` is a placeholder for `hash`.
    ///
    /// Pass [`ContentHash::ZERO`] for a directory placeholder.
    pub fn add(&self, path: &str, hash: ContentHash) -> LedgerResult<()> {
        validate_path(path)?;
        self.log.append_add(path.to_string(), hash, |state, mutation| {
            self.estimated_count.fetch_add(1, Ordering::Relaxed);
            state.record(mutation);
        })?;
        Ok(())
    }

    /// Record a file placeholder.
    pub fn add_file(&self, path: &str, hash: ContentHash) -> LedgerResult<()> {
        self.add(path, hash)
    }

    /// Record a directory placeholder.
    pub fn add_folder(&self, path: &str) -> LedgerResult<()> {
        self.add(path, ContentHash::ZERO)
    }

    /// Record that `path` is no longer a placeholder.
    pub fn remove(&self, path: &str) -> LedgerResult<()> {
        validate_path(path)?;
        self.log.append_remove(path.to_string(), |state, mutation| {
            self.estimated_count.fetch_sub(1, Ordering::Relaxed);
            state.record(mutation);
        })?;
        Ok(())
    }

    /// Snapshot every live placeholder and start queueing later mutations.
    ///
    /// Must be followed by exactly one [`commit_reconciled`](Self::commit_reconciled).
    /// Calling it again first fails with
    /// [`LedgerError::SnapshotAlreadyOutstanding`]. Results are ordered by
    /// path comparison key.
    pub fn list_all(&self) -> LedgerResult<Vec<PlaceholderRecord>> {
        let mut entries = BTreeMap::new();
        let path_case = self.path_case;
        self.log.load::<LedgerError, _, _>(
            |state| state.begin(),
            |mutation| {
                apply(&mut entries, mutation, path_case);
            },
        )?;

        debug!(entries = entries.len(), "placeholder snapshot taken");
        Ok(entries.into_values().collect())
    }

    /// [`list_all`](Self::list_all), split into `(files, folders)`.
    pub fn list_partitioned(
        &self,
    ) -> LedgerResult<(Vec<PlaceholderRecord>, Vec<PlaceholderRecord>)> {
        let all = self.list_all()?;
        Ok(all.into_iter().partition(|record| !record.is_folder()))
    }

    /// Persist the reconciled placeholder set and end the snapshot.
    ///
    /// The log is rewritten as one add per distinct path in `reconciled`
    /// (first occurrence wins), followed by every mutation queued since
    /// [`list_all`](Self::list_all), so nothing applied during
    /// reconciliation is lost. On failure the snapshot stays outstanding and
    /// the call may be retried.
    pub fn commit_reconciled(&self, reconciled: Vec<PlaceholderRecord>) -> LedgerResult<()> {
        let path_case = self.path_case;
        let summary = self.log.replace_all::<i64, LedgerError, _, _>(
            move |state, sink| {
                let SnapshotState::Outstanding(pending) = state else {
                    return Err(LedgerError::NoSnapshotOutstanding);
                };

                let mut live = HashSet::new();
                let mut count = 0i64;
                for record in reconciled {
                    validate_path(&record.path)?;
                    if live.insert(path_case.key(&record.path)) {
                        sink.push(&LogRecord::Add(record.path, record.content_hash))?;
                        count += 1;
                    } else {
                        debug!(path = %record.path, "skipping duplicate reconciled placeholder");
                    }
                }

                for mutation in pending {
                    match mutation {
                        LogRecord::Add(path, _) => {
                            if live.insert(path_case.key(path)) {
                                count += 1;
                            }
                            sink.push(mutation)?;
                        }
                        LogRecord::Remove(path) => {
                            if live.remove(&path_case.key(path)) {
                                count -= 1;
                                sink.push(mutation)?;
                            }
                        }
                    }
                }

                debug!(queued = pending.len(), "merged mutations made during snapshot");
                Ok(count)
            },
            |state, count| {
                self.estimated_count.store(count, Ordering::Relaxed);
                *state = SnapshotState::Idle;
            },
        )?;

        info!(
            records = summary.records,
            bytes = summary.bytes,
            live = self.estimated_count(),
            "placeholder ledger compacted"
        );
        Ok(())
    }

    /// Returns `true` between a `list_all` and its `commit_reconciled`.
    pub fn is_snapshot_outstanding(&self) -> LedgerResult<bool> {
        Ok(self
            .log
            .with_state(|state| matches!(state, SnapshotState::Outstanding(_)))?)
    }

    /// Number of mutations queued since the outstanding snapshot, if any.
    pub fn pending_mutations(&self) -> LedgerResult<Option<usize>> {
        Ok(self.log.with_state(|state| match state {
            SnapshotState::Outstanding(pending) => Some(pending.len()),
            SnapshotState::Idle => None,
        })?)
    }
}

/// Fold one replayed mutation into `entries`, keyed by comparison key.
fn apply(
    entries: &mut BTreeMap<String, PlaceholderRecord>,
    mutation: PlaceholderMutation,
    path_case: PathCase,
) {
    match mutation {
        LogRecord::Add(path, hash) => {
            entries.insert(path_case.key(&path), PlaceholderRecord::new(path, hash));
        }
        LogRecord::Remove(path) => {
            entries.remove(&path_case.key(&path));
        }
    }
}

fn validate_path(path: &str) -> LedgerResult<()> {
    let reason = if path.is_empty() {
        "empty path"
    } else if path.contains('\0') {
        "path contains NUL"
    } else if path.contains('\n') {
        "path contains a line break"
    } else {
        return Ok(());
    };
    Err(LedgerError::InvalidPath {
        path: path.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use phold_log::LogError;
    use proptest::prelude::*;

    use super::*;

    fn hash(b: u8) -> ContentHash {
        ContentHash::from_raw([b; 20])
    }

    fn open(dir: &tempfile::TempDir) -> PlaceholderLedger {
        PlaceholderLedger::open(&dir.path().join("placeholders.dat")).unwrap()
    }

    fn snapshot(ledger: &PlaceholderLedger) -> Vec<PlaceholderRecord> {
        let all = ledger.list_all().unwrap();
        ledger.commit_reconciled(all.clone()).unwrap();
        all
    }

    #[test]
    fn add_then_remove_updates_count() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        let aaaa = ContentHash::from_hex(&"a".repeat(40)).unwrap();

        ledger.add("foo.txt", aaaa).unwrap();
        assert_eq!(ledger.estimated_count(), 1);

        ledger.remove("foo.txt").unwrap();
        assert_eq!(ledger.estimated_count(), 0);

        assert!(ledger.list_all().unwrap().is_empty());
    }

    #[test]
    fn zero_hash_marks_folder() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);

        ledger.add("dir/", ContentHash::ZERO).unwrap();
        ledger.add_file("dir/a.txt", hash(1)).unwrap();

        let all = ledger.list_all().unwrap();
        let folder = all.iter().find(|r| r.path == "dir/").unwrap();
        assert!(folder.is_folder());
        let file = all.iter().find(|r| r.path == "dir/a.txt").unwrap();
        assert!(!file.is_folder());
    }

    #[test]
    fn list_partitioned_splits_files_and_folders() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add_folder("src").unwrap();
        ledger.add_file("src/main.rs", hash(2)).unwrap();
        ledger.add_file("README", hash(3)).unwrap();

        let (files, folders) = ledger.list_partitioned().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(folders, vec![PlaceholderRecord::folder("src")]);
    }

    #[test]
    fn later_add_wins() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add("a", hash(1)).unwrap();
        ledger.add("a", hash(2)).unwrap();

        assert_eq!(
            ledger.list_all().unwrap(),
            vec![PlaceholderRecord::file("a", hash(2))]
        );
    }

    #[test]
    fn paths_compare_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add("Dir/File.TXT", hash(1)).unwrap();
        ledger.add("dir/file.txt", hash(2)).unwrap();

        let all = ledger.list_all().unwrap();
        assert_eq!(all, vec![PlaceholderRecord::file("dir/file.txt", hash(2))]);

        ledger.commit_reconciled(all).unwrap();
        ledger.remove("DIR/FILE.txt").unwrap();
        assert!(ledger.list_all().unwrap().is_empty());
    }

    #[test]
    fn case_sensitive_config_keeps_both() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig {
            path_case: PathCase::Sensitive,
            ..LedgerConfig::default()
        };
        let ledger =
            PlaceholderLedger::open_with_config(&dir.path().join("p.dat"), config).unwrap();
        ledger.add("A", hash(1)).unwrap();
        ledger.add("a", hash(2)).unwrap();

        assert_eq!(ledger.list_all().unwrap().len(), 2);
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);

        for bad in ["", "a\0b", "a\nb"] {
            let err = ledger.add(bad, hash(1)).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidPath { .. }), "{bad:?}");
        }
        assert!(ledger.remove("").is_err());
        assert_eq!(ledger.estimated_count(), 0);
    }

    #[test]
    fn second_list_all_is_protocol_violation() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add("a", hash(1)).unwrap();

        ledger.list_all().unwrap();
        let err = ledger.list_all().unwrap_err();
        assert!(matches!(err, LedgerError::SnapshotAlreadyOutstanding));
        assert!(err.is_protocol_violation());
        assert!(ledger.is_snapshot_outstanding().unwrap());
    }

    #[test]
    fn commit_without_snapshot_is_protocol_violation() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add("a", hash(1)).unwrap();

        let err = ledger.commit_reconciled(Vec::new()).unwrap_err();
        assert!(matches!(err, LedgerError::NoSnapshotOutstanding));
        // The log was not rewritten.
        assert_eq!(snapshot(&ledger).len(), 1);
    }

    #[test]
    fn commit_ends_snapshot_mode() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        assert!(!ledger.is_snapshot_outstanding().unwrap());
        assert_eq!(ledger.pending_mutations().unwrap(), None);

        let all = ledger.list_all().unwrap();
        assert_eq!(ledger.pending_mutations().unwrap(), Some(0));
        ledger.commit_reconciled(all).unwrap();

        assert!(!ledger.is_snapshot_outstanding().unwrap());
        ledger.list_all().unwrap();
    }

    #[test]
    fn compaction_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add("b", hash(1)).unwrap();
        ledger.add("a", hash(2)).unwrap();
        ledger.add("a", hash(3)).unwrap();
        ledger.remove("b").unwrap();
        ledger.add("c", ContentHash::ZERO).unwrap();
        // The duplicate add of "a" leaves the estimate one high.
        assert_eq!(ledger.estimated_count(), 3);

        let first = snapshot(&ledger);
        let compacted = fs::read(ledger.path()).unwrap();
        assert_eq!(ledger.estimated_count(), 2);

        let second = snapshot(&ledger);
        assert_eq!(first, second);
        assert_eq!(fs::read(ledger.path()).unwrap(), compacted);
        assert_eq!(ledger.estimated_count(), 2);
    }

    #[test]
    fn compacted_file_holds_only_live_adds() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add("x", hash(1)).unwrap();
        ledger.remove("x").unwrap();
        ledger.add("y", hash(0xff)).unwrap();

        snapshot(&ledger);
        let contents = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(contents, format!("A y\0{}\n", "ff".repeat(20)));
    }

    #[test]
    fn mutations_during_snapshot_survive_commit() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add("kept", hash(1)).unwrap();
        ledger.add("gone", hash(2)).unwrap();

        let snap = ledger.list_all().unwrap();
        ledger.add("new", hash(3)).unwrap();
        ledger.remove("gone").unwrap();
        ledger.add("kept", hash(4)).unwrap();
        assert_eq!(ledger.pending_mutations().unwrap(), Some(3));

        ledger.commit_reconciled(snap).unwrap();

        let all = snapshot(&ledger);
        assert_eq!(
            all,
            vec![
                PlaceholderRecord::file("kept", hash(4)),
                PlaceholderRecord::file("new", hash(3)),
            ]
        );
        assert_eq!(ledger.estimated_count(), 2);
    }

    #[test]
    fn reconciled_set_replaces_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add("stale", hash(1)).unwrap();

        ledger.list_all().unwrap();
        ledger
            .commit_reconciled(vec![
                PlaceholderRecord::file("fresh", hash(2)),
                PlaceholderRecord::file("FRESH", hash(3)),
            ])
            .unwrap();

        assert_eq!(
            snapshot(&ledger),
            vec![PlaceholderRecord::file("fresh", hash(2))]
        );
        assert_eq!(ledger.estimated_count(), 1);
    }

    #[test]
    fn queued_remove_of_absent_path_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);

        ledger.list_all().unwrap();
        ledger.remove("never-added").unwrap();
        ledger.commit_reconciled(Vec::new()).unwrap();

        assert_eq!(fs::read(ledger.path()).unwrap(), b"");
        assert_eq!(ledger.estimated_count(), 0);
    }

    #[test]
    fn failed_commit_keeps_snapshot_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        ledger.add("a", hash(1)).unwrap();

        let snap = ledger.list_all().unwrap();
        ledger.add("b", hash(2)).unwrap();

        let mut bad = snap.clone();
        bad.push(PlaceholderRecord::file("bad\0path", hash(9)));
        let err = ledger.commit_reconciled(bad).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidPath { .. }));
        assert_eq!(ledger.pending_mutations().unwrap(), Some(1));

        ledger.commit_reconciled(snap).unwrap();
        assert_eq!(snapshot(&ledger).len(), 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_add_changes_nothing() {
        let ledger = PlaceholderLedger::open(Path::new("/dev/full")).unwrap();

        let err = ledger.add("a", ContentHash::ZERO).unwrap_err();
        assert!(matches!(err, LedgerError::Log(LogError::Io(_))), "got {err:?}");
        assert_eq!(ledger.estimated_count(), 0);

        ledger.list_all().unwrap();
        assert!(ledger.add("b", hash(2)).is_err());
        assert!(ledger.remove("c").is_err());
        assert_eq!(ledger.estimated_count(), 0);
        assert_eq!(ledger.pending_mutations().unwrap(), Some(0));
    }

    #[test]
    fn reopen_recounts_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("placeholders.dat");
        {
            let ledger = PlaceholderLedger::open(&path).unwrap();
            ledger.add("a", hash(1)).unwrap();
            ledger.add("a", hash(1)).unwrap();
            ledger.add("b", hash(1)).unwrap();
            ledger.remove("b").unwrap();
            ledger.remove("b").unwrap();
        }

        let ledger = PlaceholderLedger::open(&path).unwrap();
        assert_eq!(ledger.estimated_count(), 1);
    }

    #[test]
    fn truncation_after_any_line_reloads_prefix_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("placeholders.dat");
        {
            let ledger = PlaceholderLedger::open(&path).unwrap();
            ledger.add("a", hash(1)).unwrap();
            ledger.add("b", hash(2)).unwrap();
            ledger.remove("a").unwrap();
            ledger.add("c", hash(3)).unwrap();
        }
        let full = fs::read(&path).unwrap();
        let expected: [&[&str]; 5] = [&[], &["a"], &["a", "b"], &["b"], &["b", "c"]];

        let mut line_ends = vec![0];
        line_ends.extend(
            full.iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        for (lines, end) in line_ends.iter().enumerate() {
            // Every cut inside the following line must behave like the cut at `end`.
            let next = line_ends.get(lines + 1).copied().unwrap_or(end + 1);
            for cut in *end..next.min(full.len() + 1) {
                fs::write(&path, &full[..cut]).unwrap();
                let ledger = PlaceholderLedger::open(&path).unwrap();
                let paths: Vec<String> =
                    snapshot(&ledger).into_iter().map(|r| r.path).collect();
                assert_eq!(paths, expected[lines], "cut at {cut}");
            }
        }
    }

    #[test]
    fn malformed_log_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("placeholders.dat");
        fs::write(&path, "A a.txt\0tooshort\n").unwrap();

        let err = PlaceholderLedger::open(&path).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Log(LogError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn concurrent_adds_during_snapshot_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        for i in 0..20 {
            ledger.add(&format!("base-{i}"), hash(1)).unwrap();
        }

        let snap = ledger.list_all().unwrap();
        std::thread::scope(|scope| {
            for t in 0..4 {
                let ledger = &ledger;
                scope.spawn(move || {
                    for i in 0..25 {
                        ledger.add(&format!("t{t}/{i}"), hash(2)).unwrap();
                    }
                });
            }
        });
        ledger.commit_reconciled(snap).unwrap();

        assert_eq!(ledger.estimated_count(), 120);
        assert_eq!(snapshot(&ledger).len(), 120);
    }

    #[test]
    fn snapshot_races_with_writers() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);

        std::thread::scope(|scope| {
            let writer = scope.spawn(|| {
                for i in 0..200 {
                    ledger.add(&format!("f{i}"), hash(3)).unwrap();
                }
            });
            for _ in 0..5 {
                let snap = ledger.list_all().unwrap();
                ledger.commit_reconciled(snap).unwrap();
            }
            writer.join().unwrap();
        });

        assert_eq!(snapshot(&ledger).len(), 200);
        assert_eq!(ledger.estimated_count(), 200);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Add(usize, bool, u8),
        Remove(usize, bool),
    }

    const NAMES: [&str; 4] = ["a.txt", "dir/b", "Dir/C.rs", "x"];

    fn name(index: usize, upper: bool) -> String {
        let name = NAMES[index];
        if upper {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..NAMES.len(), any::<bool>(), any::<u8>()).prop_map(|(i, u, h)| Op::Add(i, u, h)),
            (0..NAMES.len(), any::<bool>()).prop_map(|(i, u)| Op::Remove(i, u)),
        ]
    }

    proptest! {
        #[test]
        fn listing_matches_in_memory_fold(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let dir = tempfile::tempdir().unwrap();
            let ledger = open(&dir);
            let mut model: BTreeMap<String, PlaceholderRecord> = BTreeMap::new();

            for op in &ops {
                match op {
                    Op::Add(i, upper, h) => {
                        let path = name(*i, *upper);
                        ledger.add(&path, hash(*h)).unwrap();
                        model.insert(path.to_lowercase(), PlaceholderRecord::file(path, hash(*h)));
                    }
                    Op::Remove(i, upper) => {
                        let path = name(*i, *upper);
                        ledger.remove(&path).unwrap();
                        model.remove(&path.to_lowercase());
                    }
                }
            }

            let listed = ledger.list_all().unwrap();
            prop_assert_eq!(&listed, &model.values().cloned().collect::<Vec<_>>());

            ledger.commit_reconciled(listed).unwrap();
            prop_assert_eq!(ledger.estimated_count(), model.len() as i64);
        }
    }
}

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::codec::{decode_line, encode_line, LogRecord, RecordCodec};
use crate::config::{LogConfig, SyncMode, TailPolicy};
use crate::error::{LogError, Result};

/// Counts gathered while replaying the log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub adds: u64,
    pub removes: u64,
    pub bytes: u64,
}

/// Size of a log rewritten by [`RecordLog::replace_all`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub records: u64,
    pub bytes: u64,
}

/// Append handle for the live file.
struct LogWriter {
    file: File,
    /// Length of the file as far as complete records go.
    offset: u64,
    /// Set when a failed append could not be rolled back; the next append
    /// truncates to `offset` before writing.
    dirty_tail: bool,
}

impl LogWriter {
    fn write_line(&mut self, line: &[u8], sync_mode: SyncMode) -> io::Result<()> {
        if self.dirty_tail {
            self.file.set_len(self.offset)?;
            self.dirty_tail = false;
        }
        self.file.write_all(line)?;
        self.file.flush()?;
        if sync_mode == SyncMode::EveryWrite {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn rollback(&mut self) {
        match self.file.set_len(self.offset) {
            Ok(()) => warn!(offset = self.offset, "append failed; rolled back partial record"),
            Err(e) => {
                warn!(offset = self.offset, error = %e, "append failed and rollback failed");
                self.dirty_tail = true;
            }
        }
    }
}

struct LogInner<S> {
    writer: LogWriter,
    state: S,
}

/// Crash-safe, line-oriented append-only log.
///
/// `S` is caller state kept behind the same mutex as the append handle.
/// Side-effect closures passed to [`append`](Self::append) and
/// [`replace_all`](Self::replace_all) receive it only after the file write
/// succeeded, so no other call can observe the file and `S` out of step.
pub struct RecordLog<C, S> {
    path: PathBuf,
    config: LogConfig,
    inner: Mutex<LogInner<S>>,
    _codec: PhantomData<fn() -> C>,
}

impl<C, S> std::fmt::Debug for RecordLog<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLog")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish()
    }
}

impl<C: RecordCodec, S> RecordLog<C, S> {
    /// Open (or create) the log at `path`.
    ///
    /// A missing or empty file is an empty log. If the file ends in an
    /// unterminated line, it is handled according to
    /// [`LogConfig::tail_policy`].
    pub fn open(path: &Path, config: LogConfig, state: S) -> Result<Self> {
        let open_err = |source: io::Error| LogError::Open {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }

        remove_stale_temps(path);

        let file = open_append(path).map_err(open_err)?;
        let len = file.metadata().map_err(open_err)?.len();
        let complete = complete_prefix_len(&file, len).map_err(open_err)?;

        if complete < len {
            let bytes = len - complete;
            match config.tail_policy {
                TailPolicy::Truncate => {
                    warn!(
                        path = %path.display(),
                        offset = complete,
                        bytes,
                        "dropping incomplete trailing record"
                    );
                    file.set_len(complete).map_err(open_err)?;
                    file.sync_all().map_err(open_err)?;
                }
                TailPolicy::Reject => {
                    return Err(LogError::TruncatedTail {
                        offset: complete,
                        bytes,
                    });
                }
            }
        }

        info!(path = %path.display(), bytes = complete, "record log opened");
        Ok(Self {
            path: path.to_path_buf(),
            config,
            inner: Mutex::new(LogInner {
                writer: LogWriter {
                    file,
                    offset: complete,
                    dirty_tail: false,
                },
                state,
            }),
            _codec: PhantomData,
        })
    }

    /// Path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Current length of the log in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(self.lock()?.writer.offset)
    }

    /// Returns `true` if the log holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Run `f` over the caller state under the log lock.
    pub fn with_state<T>(&self, f: impl FnOnce(&S) -> T) -> Result<T> {
        Ok(f(&self.lock()?.state))
    }

    /// Append one record, then run `effect` on the caller state.
    ///
    /// Both happen under the lock. If the write fails, `effect` is not run,
    /// the file is cut back to its previous length and the error is returned.
    /// Returns the byte offset of the new record.
    pub fn append<F>(&self, record: &LogRecord<C::Key, C::Value>, effect: F) -> Result<u64>
    where
        F: FnOnce(&mut S),
    {
        let line = encode_line::<C>(record).map_err(LogError::InvalidRecord)?;
        let mut inner = self.lock()?;
        let offset = self.write_locked(&mut inner, &line, record.is_add())?;
        effect(&mut inner.state);
        Ok(offset)
    }

    /// Append an add record, handing it to `effect` once written.
    pub fn append_add<F>(&self, key: C::Key, value: C::Value, effect: F) -> Result<u64>
    where
        F: FnOnce(&mut S, LogRecord<C::Key, C::Value>),
    {
        self.append_owned(LogRecord::Add(key, value), effect)
    }

    /// Append a remove record, handing it to `effect` once written.
    pub fn append_remove<F>(&self, key: C::Key, effect: F) -> Result<u64>
    where
        F: FnOnce(&mut S, LogRecord<C::Key, C::Value>),
    {
        self.append_owned(LogRecord::Remove(key), effect)
    }

    fn append_owned<F>(&self, record: LogRecord<C::Key, C::Value>, effect: F) -> Result<u64>
    where
        F: FnOnce(&mut S, LogRecord<C::Key, C::Value>),
    {
        let line = encode_line::<C>(&record).map_err(LogError::InvalidRecord)?;
        let mut inner = self.lock()?;
        let offset = self.write_locked(&mut inner, &line, record.is_add())?;
        effect(&mut inner.state, record);
        Ok(offset)
    }

    fn write_locked(&self, inner: &mut LogInner<S>, line: &str, add: bool) -> Result<u64> {
        let offset = inner.writer.offset;
        if let Err(e) = inner.writer.write_line(line.as_bytes(), self.config.sync_mode) {
            inner.writer.rollback();
            return Err(e.into());
        }
        inner.writer.offset += line.len() as u64;
        debug!(offset, len = line.len(), add, "record appended");
        Ok(offset)
    }

    /// Replay every record in file order.
    ///
    /// `before_replay` runs once under the lock before the first record is
    /// delivered; if it fails nothing is delivered. All lines are decoded
    /// before the hook runs, so a malformed log never leaves the caller's
    /// state half-transitioned. A line that fails to decode aborts the load
    /// with [`LogError::Malformed`].
    pub fn load<E, H, F>(
        &self,
        before_replay: H,
        mut on_record: F,
    ) -> std::result::Result<LoadSummary, E>
    where
        E: From<LogError>,
        H: FnOnce(&mut S) -> std::result::Result<(), E>,
        F: FnMut(LogRecord<C::Key, C::Value>),
    {
        let mut inner = self.lock()?;
        let records = self.read_records(inner.writer.offset)?;
        before_replay(&mut inner.state)?;
        drop(inner);

        let mut summary = LoadSummary::default();
        for (record, len) in records {
            summary.bytes += len;
            if record.is_add() {
                summary.adds += 1;
            } else {
                summary.removes += 1;
            }
            on_record(record);
        }

        debug!(
            adds = summary.adds,
            removes = summary.removes,
            bytes = summary.bytes,
            "record log replayed"
        );
        Ok(summary)
    }

    /// Atomically replace the whole log.
    ///
    /// `rebuild` streams the new contents into a [`RecordSink`] backed by a
    /// temp file in the log's directory. Once the temp file is synced it is
    /// renamed over the log and `on_replaced` receives the value `rebuild`
    /// returned. On any failure before the rename the old file and the
    /// caller state are left as they were.
    pub fn replace_all<T, E, R, P>(
        &self,
        rebuild: R,
        on_replaced: P,
    ) -> std::result::Result<ReplaceSummary, E>
    where
        E: From<LogError>,
        R: FnOnce(&S, &mut RecordSink<'_, C>) -> std::result::Result<T, E>,
        P: FnOnce(&mut S, T),
    {
        let mut inner = self.lock()?;
        let dir = self.dir();
        let tmp = Builder::new()
            .prefix(&temp_prefix(&self.path))
            .tempfile_in(dir)
            .map_err(LogError::Io)?;

        let mut sink = RecordSink::new(tmp.as_file());
        let value = rebuild(&inner.state, &mut sink)?;
        let summary = sink.finish()?;

        tmp.as_file().sync_all().map_err(LogError::Io)?;
        // Opened before the rename so the handle follows the new file.
        let file = open_append(tmp.path()).map_err(LogError::Io)?;
        tmp.persist(&self.path).map_err(|e| LogError::Io(e.error))?;

        inner.writer = LogWriter {
            file,
            offset: summary.bytes,
            dirty_tail: false,
        };
        on_replaced(&mut inner.state, value);
        drop(inner);

        if let Err(e) = sync_dir(dir) {
            warn!(dir = %dir.display(), error = %e, "failed to sync log directory after replace");
        }

        info!(
            path = %self.path.display(),
            records = summary.records,
            bytes = summary.bytes,
            "record log replaced"
        );
        Ok(summary)
    }

    fn read_records(&self, limit: u64) -> Result<Vec<(LogRecord<C::Key, C::Value>, u64)>> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file.take(limit));
        let mut records = Vec::new();
        let mut buf = Vec::new();
        let mut line_no = 0u64;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            line_no += 1;

            let malformed = |reason: &str, bytes: &[u8]| LogError::Malformed {
                line: line_no,
                content: String::from_utf8_lossy(bytes).into_owned(),
                reason: reason.to_string(),
            };

            let Some(body) = buf.strip_suffix(b"\n") else {
                return Err(malformed("missing line terminator", &buf));
            };
            let line =
                std::str::from_utf8(body).map_err(|_| malformed("not valid UTF-8", body))?;
            let record = decode_line::<C>(line).map_err(|reason| malformed(&reason, body))?;
            records.push((record, read as u64));
        }

        Ok(records)
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LogInner<S>>> {
        self.inner.lock().map_err(|_| LogError::Poisoned)
    }
}

/// Writer handed to [`RecordLog::replace_all`] rebuild closures.
pub struct RecordSink<'a, C> {
    writer: BufWriter<&'a File>,
    records: u64,
    bytes: u64,
    _codec: PhantomData<fn() -> C>,
}

impl<'a, C: RecordCodec> RecordSink<'a, C> {
    fn new(file: &'a File) -> Self {
        Self {
            writer: BufWriter::new(file),
            records: 0,
            bytes: 0,
            _codec: PhantomData,
        }
    }

    /// Write one record.
    pub fn push(&mut self, record: &LogRecord<C::Key, C::Value>) -> Result<()> {
        let line = encode_line::<C>(record).map_err(LogError::InvalidRecord)?;
        self.writer.write_all(line.as_bytes())?;
        self.records += 1;
        self.bytes += line.len() as u64;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    fn finish(mut self) -> Result<ReplaceSummary> {
        self.writer.flush()?;
        Ok(ReplaceSummary {
            records: self.records,
            bytes: self.bytes,
        })
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
}

/// Name prefix of the temp files written by [`RecordLog::replace_all`].
fn temp_prefix(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    format!(".{name}.replace-")
}

/// Delete temp files left behind by a replace that never reached its rename.
fn remove_stale_temps(path: &Path) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = temp_prefix(path);
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot scan for stale temp files");
            return;
        }
    };

    for entry in entries.flatten() {
        let is_stale = entry.file_name().to_string_lossy().starts_with(&prefix)
            && entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_stale {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => warn!(file = %entry.path().display(), "removed stale temp file"),
            Err(e) => warn!(
                file = %entry.path().display(),
                error = %e,
                "failed to remove stale temp file"
            ),
        }
    }
}

/// Length of the longest prefix of the file that ends in `\n`.
fn complete_prefix_len(mut file: &File, len: u64) -> io::Result<u64> {
    const CHUNK: u64 = 4096;
    let mut buf = [0u8; CHUNK as usize];
    let mut end = len;

    while end > 0 {
        let start = end.saturating_sub(CHUNK);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(pos) = chunk.iter().rposition(|b| *b == b'\n') {
            return Ok(start + pos as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

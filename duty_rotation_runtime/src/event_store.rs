//! File-backed event log: length-prefixed protobuf frames.
//!
//! Storage format:
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only: no mutation, no deletion, no reordering
//!   - fsync after every write
//!   - Sequence strictly increasing from 1, validated on every read
//!   - A failed write is rolled back to the previous file length
//!
//! Any number of handles, in this process or others, may share one file.
//! An append holds an exclusive advisory lock on the file from reading the
//! tail sequence until the frame is synced; reads hold a shared lock. Two
//! writers therefore never hand out the same sequence number.
//!
//! Subscribers hear about every new frame, whoever wrote it. Appends made
//! through this handle are announced directly; a watcher thread announces
//! frames written by other handles when the file changes.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use fs2::FileExt;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use prost::Message;
use tracing::{debug, warn};

use duty_rotation_kernel::{DutyEvent, EventEnvelope};

use crate::error::LogError;
use crate::event_log::{check_sequence, EventLog, InsertNotice, Subscribers};
use crate::proto_bridge::{kernel_to_proto, proto_to_kernel};
use crate::proto_types::ProtoEventEnvelope;

const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// How often the watcher re-checks the file when no change event arrives.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Append-only event log backed by a binary file.
pub struct FileEventLog {
    shared: Arc<Shared>,
    poll_interval: Duration,
    watch: Mutex<Option<Watch>>,
}

/// State the handle shares with its watcher thread.
struct Shared {
    path: PathBuf,
    subscribers: Subscribers,
    cursor: Mutex<Cursor>,
}

/// How far into the file subscribers have been told about.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    sequence: u64,
    file_len: u64,
}

struct Watch {
    stop: Sender<()>,
    wake: Sender<()>,
    fs_watcher: Option<RecommendedWatcher>,
    thread: JoinHandle<()>,
}

impl FileEventLog {
    /// Open or create an event log at `path`.
    ///
    /// An existing file is read once so that corruption is reported here
    /// rather than on the first append.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut cursor = Cursor::default();
        if path.exists() {
            let (events, file_len) = read_log(path)?;
            cursor = Cursor {
                sequence: events.last().map_or(0, |e| e.sequence),
                file_len,
            };
            debug!(path = %path.display(), events = events.len(), "opened event log");
        }

        Ok(Self {
            shared: Arc::new(Shared {
                path: path.to_path_buf(),
                subscribers: Subscribers::new(),
                cursor: Mutex::new(cursor),
            }),
            poll_interval: DEFAULT_POLL_INTERVAL,
            watch: Mutex::new(None),
        })
    }

    /// Change how often other writers' appends are polled for. Takes
    /// effect for watchers started after the call.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Sequence number of the last stored event, 0 when empty.
    pub fn last_sequence(&self) -> Result<u64, LogError> {
        Ok(self.list_all()?.last().map_or(0, |e| e.sequence))
    }

    /// Read the tail, write the next frame and sync, all under the file lock.
    ///
    /// Returns the new envelope along with the whole log and its length.
    fn append_locked(
        &self,
        event: DutyEvent,
    ) -> Result<(EventEnvelope, Vec<EventEnvelope>, u64), LogError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.shared.path)?;
        FileExt::lock_exclusive(&file)?;

        let (mut events, len_before) = read_locked(&mut file)?;
        let envelope = EventEnvelope {
            sequence: events.last().map_or(0, |e| e.sequence) + 1,
            event,
        };
        let frame = encode_frame(&envelope)?;

        let written = file
            .write_all(&frame)
            .and_then(|()| file.flush())
            .and_then(|()| file.sync_all());
        if let Err(e) = written {
            warn!(path = %self.shared.path.display(), error = %e, "append failed, rolling back");
            if let Err(rollback) = file.set_len(len_before) {
                warn!(error = %rollback, "rollback of partial frame failed");
            }
            return Err(e.into());
        }

        FileExt::unlock(&file)?;
        events.push(envelope.clone());
        Ok((envelope, events, len_before + frame.len() as u64))
    }

    fn ensure_watching(&self) {
        let mut watch = lock(&self.watch);
        if watch.is_some() {
            return;
        }
        match spawn_watch(Arc::clone(&self.shared), self.poll_interval) {
            Ok(started) => *watch = Some(started),
            Err(e) => warn!(error = %e, "cannot watch event log, only local appends will be announced"),
        }
    }
}

impl EventLog for FileEventLog {
    fn append(&self, event: DutyEvent) -> Result<EventEnvelope, LogError> {
        let (envelope, events, file_len) = self.append_locked(event)?;

        debug!(sequence = envelope.sequence, slot = %envelope.event.slot_id(), "event appended");
        self.shared.announce(&events, file_len);
        Ok(envelope)
    }

    fn list_all(&self) -> Result<Vec<EventEnvelope>, LogError> {
        if !self.shared.path.exists() {
            return Ok(Vec::new());
        }
        Ok(read_log(&self.shared.path)?.0)
    }

    fn subscribe(&self) -> Receiver<InsertNotice> {
        let rx = self.shared.subscribers.subscribe();
        self.ensure_watching();
        rx
    }
}

impl Drop for FileEventLog {
    fn drop(&mut self) {
        let Some(watch) = lock(&self.watch).take() else {
            return;
        };
        let Watch {
            stop,
            wake,
            fs_watcher,
            thread,
        } = watch;
        drop(stop);
        drop(fs_watcher);
        drop(wake);
        if thread.join().is_err() {
            warn!("event log watcher panicked");
        }
    }
}

impl Shared {
    /// Notify subscribers of every event past the cursor, in order.
    fn announce(&self, events: &[EventEnvelope], file_len: u64) {
        let mut cursor = lock(&self.cursor);
        for envelope in events {
            if envelope.sequence <= cursor.sequence {
                continue;
            }
            self.subscribers.notify(envelope);
            cursor.sequence = envelope.sequence;
        }
        cursor.file_len = cursor.file_len.max(file_len);
    }

    /// Announce frames written by anyone since the last look.
    fn poll(&self) {
        let Ok(meta) = fs::metadata(&self.path) else {
            return;
        };
        if meta.len() == lock(&self.cursor).file_len {
            return;
        }
        match read_log(&self.path) {
            Ok((events, file_len)) => self.announce(&events, file_len),
            Err(e) => warn!(path = %self.path.display(), error = %e, "cannot read event log for notices"),
        }
    }
}

fn spawn_watch(shared: Arc<Shared>, poll_interval: Duration) -> std::io::Result<Watch> {
    let (stop, stop_rx) = bounded::<()>(0);
    let (wake, wake_rx) = unbounded::<()>();
    let fs_watcher = watch_file(&shared.path, wake.clone());

    let thread = thread::Builder::new()
        .name("event-log-watch".to_string())
        .spawn(move || loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(wake_rx) -> _ => {}
                default(poll_interval) => {}
            }
            wake_rx.try_iter().for_each(drop);
            shared.poll();
        })?;

    Ok(Watch {
        stop,
        wake,
        fs_watcher,
        thread,
    })
}

/// Wake the watcher whenever the filesystem reports a change to `path`.
///
/// Returns `None` when the platform watcher is unavailable; polling still
/// covers that case.
fn watch_file(path: &Path, wake: Sender<()>) -> Option<RecommendedWatcher> {
    let file_name = path.file_name()?.to_os_string();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let handler = move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            if event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) {
                let _ = wake.send(());
            }
        }
    };

    let mut watcher = match RecommendedWatcher::new(handler, notify::Config::default()) {
        Ok(watcher) => watcher,
        Err(e) => {
            debug!(error = %e, "file watcher unavailable, polling only");
            return None;
        }
    };
    match watcher.watch(&dir, RecursiveMode::NonRecursive) {
        Ok(()) => Some(watcher),
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot watch directory, polling only");
            None
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn encode_frame(envelope: &EventEnvelope) -> Result<Vec<u8>, LogError> {
    let body = kernel_to_proto(envelope).encode_to_vec();
    let len = u32::try_from(body.len())
        .ok()
        .filter(|&n| n as usize <= MAX_FRAME_LEN)
        .ok_or_else(|| {
            LogError::Unavailable(format!("event frame of {} bytes is too large", body.len()))
        })?;

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Read every frame from `path` under a shared lock.
///
/// Returns the events and the number of bytes they occupy.
fn read_log(path: &Path) -> Result<(Vec<EventEnvelope>, u64), LogError> {
    let mut file = File::open(path)?;
    FileExt::lock_shared(&file)?;
    let result = read_locked(&mut file);
    FileExt::unlock(&file)?;
    result
}

/// Read and validate the whole file through an already locked handle.
fn read_locked(file: &mut File) -> Result<(Vec<EventEnvelope>, u64), LogError> {
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    let events = decode_frames(&data)?;
    check_sequence(&events)?;
    Ok((events, data.len() as u64))
}

fn decode_frames(data: &[u8]) -> Result<Vec<EventEnvelope>, LogError> {
    let mut events = Vec::new();
    let mut offset = 0usize;

    while offset < data.len() {
        let corrupt = |reason: String| LogError::Corrupt {
            offset: offset as u64,
            reason,
        };

        let header = data
            .get(offset..offset + 4)
            .ok_or_else(|| corrupt("truncated frame header".to_string()))?;
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(corrupt(format!("invalid frame length: {}", len)));
        }

        let frame = data
            .get(offset + 4..offset + 4 + len)
            .ok_or_else(|| corrupt(format!("truncated frame: {} bytes declared", len)))?;
        let proto = ProtoEventEnvelope::decode(frame)
            .map_err(|e| corrupt(format!("protobuf decode error: {}", e)))?;
        events.push(proto_to_kernel(&proto).map_err(corrupt)?);

        offset += 4 + len;
    }

    Ok(events)
}

//! Per-process transcript of the chat and the provider traffic behind it.
//!
//! Entries are raw: nothing is masked here, which is why the file is created
//! owner-only. The redacted view lives in `http::redact`.

use anyhow::{Result, anyhow};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const APP_DIR: &str = "chefchat";
const TRACES_DIR: &str = "traces";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Session,
    UserIn,
    ChefOut,
    ChefErr,
    ApiRequest,
    ApiResponse,
    ApiError,
}

impl TraceKind {
    fn label(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::UserIn => "user.in",
            Self::ChefOut => "chef.out",
            Self::ChefErr => "chef.err",
            Self::ApiRequest => "ai.http.in",
            Self::ApiResponse => "ai.http.out",
            Self::ApiError => "ai.http.err",
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionTrace {
    file: Arc<TraceFile>,
}

#[derive(Debug)]
struct TraceFile {
    path: PathBuf,
    out: Mutex<BufWriter<File>>,
    broken: AtomicBool,
}

impl SessionTrace {
    /// Opens `<state dir>/chefchat/traces/<session_id>.log`.
    pub fn open(session_id: &str) -> Result<Self> {
        let dir = trace_dir(dirs::state_dir(), dirs::home_dir())?;
        Self::open_in(&dir, session_id)
    }

    pub fn open_in(dir: &Path, session_id: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|err| anyhow!("Failed to create trace directory {}: {err}", dir.display()))?;

        let path = dir.join(format!("{session_id}.log"));
        let file = create_private(&path)
            .map_err(|err| anyhow!("Failed to create trace file {}: {err}", path.display()))?;

        Ok(Self {
            file: Arc::new(TraceFile {
                path,
                out: Mutex::new(BufWriter::new(file)),
                broken: AtomicBool::new(false),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    /// Appends one timestamped line per line of `text`.
    pub fn record(&self, kind: TraceKind, text: &str) {
        let stamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "????-??-??T??:??:??Z".to_string());
        let label = kind.label();

        let mut entry = String::new();
        let mut lines = text.lines().peekable();
        if lines.peek().is_none() {
            entry.push_str(&format!("[{stamp}] [{label:<11}] <empty>\n"));
        }
        for line in lines {
            entry.push_str(&format!("[{stamp}] [{label:<11}] {line}\n"));
        }

        if self.append(&entry).is_err() && !self.file.broken.swap(true, Ordering::Relaxed) {
            eprintln!(
                "chefchat: could not write trace {}; further entries are dropped",
                self.file.path.display()
            );
        }
    }

    fn append(&self, entry: &str) -> io::Result<()> {
        let mut out = self
            .file
            .out
            .lock()
            .map_err(|_| io::Error::other("trace writer poisoned"))?;
        out.write_all(entry.as_bytes())?;
        out.flush()
    }
}

fn create_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path)
}

fn trace_dir(state_dir: Option<PathBuf>, home_dir: Option<PathBuf>) -> Result<PathBuf> {
    let root = state_dir
        .or_else(|| home_dir.map(|home| home.join(".local").join("state")))
        .ok_or_else(|| anyhow!("Failed to resolve trace path: no state or home directory"))?;
    Ok(root.join(APP_DIR).join(TRACES_DIR))
}

#[cfg(test)]
mod tests {
    use super::{SessionTrace, TraceKind, trace_dir};
    use std::fs;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    #[test]
    fn trace_dir_prefers_state_dir() {
        let dir = trace_dir(
            Some(PathBuf::from("/tmp/state")),
            Some(PathBuf::from("/home/cook")),
        )
        .expect("trace dir");
        assert_eq!(dir, Path::new("/tmp/state/chefchat/traces"));
    }

    #[test]
    fn trace_dir_falls_back_to_local_state_under_home() {
        let dir = trace_dir(None, Some(PathBuf::from("/home/cook"))).expect("trace dir");
        assert_eq!(dir, Path::new("/home/cook/.local/state/chefchat/traces"));
    }

    #[test]
    fn trace_dir_needs_somewhere_to_live() {
        let err = trace_dir(None, None).expect_err("no dirs");
        assert!(err.to_string().contains("no state or home directory"));
    }

    #[test]
    fn record_writes_one_stamped_line_per_text_line() {
        let dir = tempdir().expect("tempdir");
        let trace = SessionTrace::open_in(dir.path(), "abc").expect("trace");
        trace.record(TraceKind::UserIn, "chicken\ngarlic");
        trace.record(TraceKind::ChefErr, "");
        trace.record(TraceKind::ApiError, "connection refused");

        let content = fs::read_to_string(trace.path()).expect("read trace");
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("[20"));
        assert!(lines[0].ends_with("Z] [user.in    ] chicken"));
        assert!(lines[1].ends_with("[user.in    ] garlic"));
        assert!(lines[2].ends_with("[chef.err   ] <empty>"));
        assert!(lines[3].ends_with("[ai.http.err] connection refused"));
    }

    #[test]
    fn open_in_refuses_to_reuse_a_session_file() {
        let dir = tempdir().expect("tempdir");
        let first = SessionTrace::open_in(dir.path(), "same").expect("first");
        assert_eq!(first.path(), dir.path().join("same.log"));

        let err = SessionTrace::open_in(dir.path(), "same").expect_err("second open");
        assert!(err.to_string().contains("Failed to create trace file"));
    }

    #[cfg(unix)]
    #[test]
    fn trace_file_is_owner_only() {
        let dir = tempdir().expect("tempdir");
        let trace = SessionTrace::open_in(dir.path(), "abc").expect("trace");
        let mode = fs::metadata(trace.path())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

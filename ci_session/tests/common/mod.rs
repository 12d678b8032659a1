use ci_session::{SessionBinding, SessionConfig};
use tempfile::TempDir;

/// Binding over a fresh temp directory; keep the `TempDir` alive for the test.
pub fn file_binding() -> (SessionBinding, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let binding = SessionBinding::new(SessionConfig::new(dir.path(), 1800));
    (binding, dir)
}

pub fn session_file(dir: &TempDir, id: &str) -> std::path::PathBuf {
    dir.path().join(format!("ci_session{id}"))
}

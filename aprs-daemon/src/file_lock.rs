use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Default lock location: the user runtime dir, falling back to the temp dir.
pub fn default_lock_path() -> PathBuf {
    let mut lock_path = dirs::runtime_dir().unwrap_or(std::env::temp_dir());
    lock_path.push("aprsd.lock");
    lock_path
}

/// Takes the single-instance lock. The lock is held until the file is dropped.
pub fn acquire_daemon_lock(lock_path: &Path) -> Result<File, String> {
    let file = File::create(lock_path).map_err(|e| {
        format!("Failed to create lock file {}: {e}", lock_path.display())
    })?;

    // Exclusive lock; fails if another daemon holds it
    file.try_lock_exclusive()
        .map_err(|_| "Another aprsd instance is already running".to_string())?;

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lock_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aprsd.lock");

        let first = acquire_daemon_lock(&path).unwrap();
        assert!(acquire_daemon_lock(&path).is_err());

        drop(first);
        assert!(acquire_daemon_lock(&path).is_ok());
    }
}

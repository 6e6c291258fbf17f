//! Atomic hostapd config file writes.

use log::debug;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Replaces `path` with `contents` in one step.
///
/// The data goes to a temporary file in the same directory, is synced, and
/// is then renamed over the target, so hostapd never reads a half-written
/// config and a failed write leaves the previous file intact. The temporary
/// file is created with mode 0600, which the final file keeps since it
/// carries the passphrase.
///
/// The filesystem work runs on the blocking pool.
pub(crate) async fn write_config_file(path: &Path, contents: &str) -> io::Result<()> {
    let path = path.to_path_buf();
    let contents = contents.to_owned();
    tokio::task::spawn_blocking(move || write_atomically(&path, &contents))
        .await
        .map_err(io::Error::other)?
}

fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

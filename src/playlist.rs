use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Append a downloaded file's path to an M3U-style playlist.
///
/// The playlist is created if it does not exist. Failures are for the
/// caller to log; they never stop a run.
pub fn append_to_playlist(entry: &Path, playlist: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(playlist)?;
    writeln!(file, "{}", entry.display())
}

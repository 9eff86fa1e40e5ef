//! Newline-delimited file access: lazy reads, appends, and atomic rewrites.
//!
//! The backing file is only ever mutated by appending whole lines or by
//! swapping in a fully written replacement via rename.

use neuron_core::{AppError, AppResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

/// Lazy, forward-only iterator over the non-blank lines of a file.
///
/// The file is opened on the first call to `next` and closed as soon as
/// the end is reached, an error is hit, or the iterator is dropped. A
/// missing file yields nothing.
#[derive(Debug)]
pub struct Lines {
    path: PathBuf,
    state: ReadState,
}

#[derive(Debug)]
enum ReadState {
    Pending,
    Open(BufReader<File>),
    Done,
}

/// Stream the non-blank lines of `path`, without terminators.
pub fn read_lines(path: &Path) -> Lines {
    Lines {
        path: path.to_path_buf(),
        state: ReadState::Pending,
    }
}

impl Iterator for Lines {
    type Item = AppResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                ReadState::Pending => match File::open(&self.path) {
                    Ok(file) => self.state = ReadState::Open(BufReader::new(file)),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        tracing::trace!("{:?} does not exist, reading as empty", self.path);
                        self.state = ReadState::Done;
                        return None;
                    }
                    Err(e) => {
                        self.state = ReadState::Done;
                        return Some(Err(AppError::Store(format!(
                            "Failed to open {:?}: {}",
                            self.path, e
                        ))));
                    }
                },
                ReadState::Open(reader) => {
                    let mut buf = Vec::new();
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) => {
                            self.state = ReadState::Done;
                            return None;
                        }
                        Ok(_) => {
                            // Invalid UTF-8 is kept lossily; the codec rejects it later
                            let line = String::from_utf8_lossy(&buf);
                            let line = line.trim_end_matches(['\n', '\r']);
                            if line.trim().is_empty() {
                                continue;
                            }
                            return Some(Ok(line.to_string()));
                        }
                        Err(e) => {
                            self.state = ReadState::Done;
                            return Some(Err(AppError::Store(format!(
                                "Failed to read {:?}: {}",
                                self.path, e
                            ))));
                        }
                    }
                }
                ReadState::Done => return None,
            }
        }
    }
}

impl FusedIterator for Lines {}

/// Append `lines` to `path`, each followed by a newline.
///
/// Creates the file (and parent directory) if needed and never truncates.
/// All lines go out in a single write followed by an fsync. If the file
/// ends in a torn record from an interrupted write, a newline is written
/// first so the new records start on a fresh line.
pub fn append_lines(path: &Path, lines: &[String]) -> AppResult<()> {
    if lines.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Store(format!("Failed to create store directory {:?}: {}", parent, e))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Store(format!("Failed to open {:?} for append: {}", path, e)))?;

    let mut buf = Vec::with_capacity(lines.iter().map(|l| l.len() + 1).sum::<usize>() + 1);
    if !ends_with_newline(&mut file)? {
        tracing::warn!("{:?} ends with an unterminated line, starting a new one", path);
        buf.push(b'\n');
    }
    for line in lines {
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }

    file.write_all(&buf)
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_all())
        .map_err(|e| AppError::Store(format!("Failed to append to {:?}: {}", path, e)))?;

    tracing::debug!("Appended {} lines to {:?}", lines.len(), path);
    Ok(())
}

/// True for an empty file or one whose last byte is a newline.
fn ends_with_newline(file: &mut File) -> AppResult<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Replace the contents of `path` with `lines`, atomically.
///
/// The lines are written to `tmp_path` (same directory), synced and closed,
/// then renamed over `path`. Until the rename succeeds the original file
/// is untouched; on any failure the temporary file is removed and the
/// original stays as it was. Returns the number of lines written.
pub fn atomic_replace<I>(path: &Path, tmp_path: &Path, lines: I) -> AppResult<usize>
where
    I: IntoIterator<Item = AppResult<String>>,
{
    replace_with(path, tmp_path, lines, |from, to| fs::rename(from, to))
}

/// `atomic_replace` with an injectable rename step.
pub(crate) fn replace_with<I, R>(
    path: &Path,
    tmp_path: &Path,
    lines: I,
    rename: R,
) -> AppResult<usize>
where
    I: IntoIterator<Item = AppResult<String>>,
    R: FnOnce(&Path, &Path) -> io::Result<()>,
{
    let written = match write_temp(path, tmp_path, lines) {
        Ok(written) => written,
        Err(e) => {
            discard_temp(tmp_path);
            return Err(e);
        }
    };

    if let Err(e) = rename(tmp_path, path) {
        discard_temp(tmp_path);
        return Err(AppError::Compaction {
            path: path.to_path_buf(),
            reason: format!("rename from {:?} failed: {}", tmp_path, e),
        });
    }

    sync_parent_dir(path);

    tracing::debug!("Replaced {:?} with {} lines", path, written);
    Ok(written)
}

fn write_temp<I>(path: &Path, tmp_path: &Path, lines: I) -> AppResult<usize>
where
    I: IntoIterator<Item = AppResult<String>>,
{
    let compaction_error = |reason: String| AppError::Compaction {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = tmp_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| compaction_error(format!("cannot create directory {:?}: {}", parent, e)))?;
    }

    let file = File::create(tmp_path)
        .map_err(|e| compaction_error(format!("cannot create temporary file {:?}: {}", tmp_path, e)))?;
    let mut writer = BufWriter::new(file);

    let mut written = 0usize;
    for line in lines {
        let line = line?;
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| compaction_error(format!("write to {:?} failed: {}", tmp_path, e)))?;
        written += 1;
    }

    let file = writer
        .into_inner()
        .map_err(|e| compaction_error(format!("flush of {:?} failed: {}", tmp_path, e.error())))?;
    file.sync_all()
        .map_err(|e| compaction_error(format!("sync of {:?} failed: {}", tmp_path, e)))?;

    Ok(written)
}

fn discard_temp(tmp_path: &Path) {
    if tmp_path.is_file() {
        if let Err(e) = fs::remove_file(tmp_path) {
            tracing::warn!("Failed to remove temporary file {:?}: {}", tmp_path, e);
        }
    }
}

/// Make the rename durable. Not supported on every platform, so errors are ignored.
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ok_lines(lines: &[&str]) -> Vec<AppResult<String>> {
        lines.iter().map(|l| Ok(l.to_string())).collect()
    }

    fn collect(path: &Path) -> Vec<String> {
        read_lines(path).collect::<AppResult<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp = TempDir::new().unwrap();
        assert!(collect(&temp.path().join("absent.store")).is_empty());
    }

    #[test]
    fn test_read_skips_blank_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        fs::write(&path, "one\n\n   \r\ntwo\r\nthree").unwrap();

        assert_eq!(collect(&path), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_reader_opens_lazily_and_closes_at_eof() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        fs::write(&path, "a\nb\n").unwrap();

        let mut lines = read_lines(&path);
        assert!(matches!(lines.state, ReadState::Pending));

        assert_eq!(lines.next().unwrap().unwrap(), "a");
        assert!(matches!(lines.state, ReadState::Open(_)));

        assert_eq!(lines.next().unwrap().unwrap(), "b");
        assert!(lines.next().is_none());
        assert!(matches!(lines.state, ReadState::Done));
        assert!(lines.next().is_none());
    }

    /// Descriptors of this process currently open on `path`.
    #[cfg(target_os = "linux")]
    fn open_handles(path: &Path) -> usize {
        fs::read_dir("/proc/self/fd")
            .unwrap()
            .filter_map(|entry| fs::read_link(entry.ok()?.path()).ok())
            .filter(|target| target == path)
            .count()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_early_drop_releases_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        fs::write(&path, "a\nb\nc\n").unwrap();
        let canonical = fs::canonicalize(&path).unwrap();

        let mut lines = read_lines(&path);
        assert_eq!(open_handles(&canonical), 0);

        assert_eq!(lines.next().unwrap().unwrap(), "a");
        assert_eq!(open_handles(&canonical), 1);

        drop(lines);
        assert_eq!(open_handles(&canonical), 0);

        // Exhausting the reader releases the handle without a drop
        let mut lines = read_lines(&path);
        assert_eq!(lines.by_ref().count(), 3);
        assert_eq!(open_handles(&canonical), 0);
    }

    #[test]
    fn test_append_preserves_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("s.store");

        append_lines(&path, &["a".to_string()]).unwrap();
        append_lines(&path, &["b".to_string(), "c".to_string()]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn test_append_after_torn_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        fs::write(&path, "whole\n{\"id\":\"tor").unwrap();

        append_lines(&path, &["next".to_string()]).unwrap();

        assert_eq!(collect(&path), vec!["whole", "{\"id\":\"tor", "next"]);
    }

    #[test]
    fn test_append_nothing_does_not_create_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        append_lines(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_atomic_replace() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        let tmp = temp.path().join("s_tmp.store");
        fs::write(&path, "old1\nold2\n").unwrap();

        let written = atomic_replace(&path, &tmp, ok_lines(&["new"])).unwrap();

        assert_eq!(written, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!tmp.exists());
    }

    #[test]
    fn test_atomic_replace_creates_missing_target() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        let tmp = temp.path().join("s_tmp.store");

        atomic_replace(&path, &tmp, Vec::new()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_failed_rename_keeps_original() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        let tmp = temp.path().join("s_tmp.store");
        fs::write(&path, "keep me\n").unwrap();

        let result = replace_with(&path, &tmp, ok_lines(&["replacement"]), |_, _| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "simulated"))
        });

        assert!(matches!(result, Err(AppError::Compaction { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me\n");
        assert!(!tmp.exists());
    }

    #[test]
    fn test_temp_creation_failure_keeps_original() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        let tmp = temp.path().join("s_tmp.store");
        fs::write(&path, "keep me\n").unwrap();
        // A directory squatting on the temp path makes creation fail
        fs::create_dir(&tmp).unwrap();
        fs::write(tmp.join("occupied"), "x").unwrap();

        let result = atomic_replace(&path, &tmp, ok_lines(&["replacement"]));

        assert!(matches!(result, Err(AppError::Compaction { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me\n");
    }

    #[test]
    fn test_source_error_aborts_replace() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("s.store");
        let tmp = temp.path().join("s_tmp.store");
        fs::write(&path, "keep me\n").unwrap();

        let lines = vec![
            Ok("partial".to_string()),
            Err(AppError::Store("read failed".to_string())),
        ];
        let result = atomic_replace(&path, &tmp, lines);

        assert!(matches!(result, Err(AppError::Store(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me\n");
        assert!(!tmp.exists());
    }
}

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::mapreduce::codec::RecordWriter;
use crate::mapreduce::error::{ReduceError, Result};
use crate::mapreduce::util::KeyValue;

/// Output file that only appears at its final path once fully written.
///
/// Records go to a hidden sibling of the target which [`commit`] renames over
/// the target. Dropping without committing deletes the sibling, so the target
/// is either left as it was or replaced by a complete file.
///
/// [`commit`]: PendingOutput::commit
pub struct PendingOutput {
    // Declared before `temp` so the file is closed before the guard removes it.
    writer: RecordWriter<File>,
    temp: TempFile,
    target: PathBuf,
}

impl PendingOutput {
    pub fn create(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let temp = temp_sibling(&target).map_err(|source| ReduceError::OutputOpen {
            path: target.clone(),
            source,
        })?;
        let file = open_private(&temp).map_err(|source| ReduceError::OutputOpen {
            path: target.clone(),
            source,
        })?;
        debug!(output = %target.display(), temp = %temp.display(), "opened temporary output");

        Ok(PendingOutput {
            writer: RecordWriter::new(&target, file),
            temp: TempFile {
                path: temp,
                keep: false,
            },
            target,
        })
    }

    pub fn write_record(&mut self, kv: &KeyValue) -> Result<()> {
        self.writer.write_record(kv)
    }

    /// Flushes, syncs, and renames the output into place. Returns the number
    /// of records written.
    pub fn commit(self) -> Result<usize> {
        let PendingOutput {
            writer,
            mut temp,
            target,
        } = self;
        let written = writer.written();
        let file = writer.finish()?;
        file.sync_all().map_err(|source| ReduceError::Write {
            path: target.clone(),
            source,
        })?;
        drop(file);

        fs::rename(&temp.path, &target).map_err(|source| ReduceError::Commit {
            path: target.clone(),
            source,
        })?;
        temp.keep = true;
        Ok(written)
    }
}

/// Removes the temporary file on drop unless it was renamed into place.
struct TempFile {
    path: PathBuf,
    keep: bool,
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(temp = %self.path.display(), error = %e, "failed to remove temporary output");
            }
        }
    }
}

// Owner-only, like the shards the map phase writes.
#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

// Same directory as the target so the final rename never crosses filesystems.
fn temp_sibling(target: &Path) -> io::Result<PathBuf> {
    let name = target.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "output path has no file name",
        )
    })?;
    let mut temp_name = OsString::from(".");
    temp_name.push(name);
    temp_name.push(format!(".tmp-{:016x}", rand::random::<u64>()));
    Ok(target.with_file_name(temp_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mr-output-{:016x}", rand::random::<u64>()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn commit_replaces_existing_file() {
        let dir = scratch_dir();
        let target = dir.join("mrtmp.job-res-0");
        fs::write(&target, "stale\n").unwrap();

        let mut out = PendingOutput::create(&target).unwrap();
        out.write_record(&KeyValue::new("a".into(), "1".into())).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "stale\n");
        assert_eq!(out.commit().unwrap(), 1);

        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "{\"Key\":\"a\",\"Value\":\"1\"}\n"
        );
        assert_eq!(entries(&dir), vec!["mrtmp.job-res-0".to_string()]);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn dropping_uncommitted_output_leaves_target_alone() {
        let dir = scratch_dir();
        let target = dir.join("out");
        fs::write(&target, "previous\n").unwrap();

        {
            let mut out = PendingOutput::create(&target).unwrap();
            out.write_record(&KeyValue::new("a".into(), "1".into())).unwrap();
        }

        assert_eq!(fs::read_to_string(&target).unwrap(), "previous\n");
        assert_eq!(entries(&dir), vec!["out".to_string()]);
        fs::remove_dir_all(dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn output_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch_dir();
        let target = dir.join("out");
        fs::write(&target, "previous\n").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o644)).unwrap();

        let out = PendingOutput::create(&target).unwrap();
        out.commit().unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_parent_is_output_open_failure() {
        let dir = scratch_dir();
        let target = dir.join("no-such-dir").join("out");
        match PendingOutput::create(&target) {
            Err(ReduceError::OutputOpen { path, .. }) => assert_eq!(path, target),
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("expected failure"),
        }
        fs::remove_dir_all(dir).unwrap();
    }
}

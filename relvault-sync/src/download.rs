//! Streaming download with partial-failure cleanup.
//!
//! One fetch, no internal retry — retry policy belongs to the caller. The
//! body is streamed to disk in fixed-size chunks, unmodified; on any failure
//! the partial file is removed before the error is returned, so a truncated
//! artifact never survives on disk.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::error::SyncError;
use crate::host::ReleaseHost;
use crate::progress::{ProgressHandle, ProgressSink};

const CHUNK_SIZE: usize = 8192;

/// Stream `url` into `dest`, reporting written bytes to `sink`.
///
/// The cancellation flag is observed between chunks; a cancelled fetch is
/// reported as a failed one (with the partial file removed).
pub fn fetch(
    host: &dyn ReleaseHost,
    url: &str,
    dest: &Path,
    sink: &dyn ProgressSink,
    cancel: &AtomicBool,
) -> Result<(), SyncError> {
    let resource = host
        .open_resource(url)
        .map_err(|e| failed(url, dest, e.to_string()))?;

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| url.to_string());
    let mut handle = sink.start(&name, resource.len);

    let result = stream_to_file(resource.reader, dest, handle.as_mut(), cancel);
    handle.finish();

    match result {
        Ok(written) => {
            debug!("fetched {url} -> {} ({written} bytes)", dest.display());
            Ok(())
        }
        Err(reason) => Err(failed(url, dest, reason)),
    }
}

fn stream_to_file(
    mut reader: Box<dyn Read + Send>,
    dest: &Path,
    handle: &mut dyn ProgressHandle,
    cancel: &AtomicBool,
) -> Result<u64, String> {
    let mut file = File::create(dest).map_err(|e| format!("create failed: {e}"))?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut written: u64 = 0;

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err("cancelled".to_string());
        }
        let n = reader.read(&mut buf).map_err(|e| format!("read failed: {e}"))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| format!("write failed: {e}"))?;
        written += n as u64;
        handle.advance(n as u64);
    }

    file.flush().map_err(|e| format!("flush failed: {e}"))?;
    Ok(written)
}

/// Build the download error, removing whatever partial file exists at `dest`.
fn failed(url: &str, dest: &Path, reason: String) -> SyncError {
    if dest.exists() {
        let _ = std::fs::remove_file(dest);
    }
    SyncError::Download {
        url: url.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::AtomicBool;

    use relvault_core::{ReleaseInfo, RepoId};
    use tempfile::TempDir;

    use super::*;
    use crate::host::{HostError, Resource};
    use crate::progress::NullProgress;

    /// Reader that yields `good` bytes, then fails.
    struct TruncatedReader {
        good: Vec<u8>,
        pos: usize,
    }

    impl Read for TruncatedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos < self.good.len() {
                let n = buf.len().min(self.good.len() - self.pos);
                buf[..n].copy_from_slice(&self.good[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"))
        }
    }

    enum Body {
        Bytes(Vec<u8>),
        Truncated(Vec<u8>),
        Status(u16),
    }

    struct OneShotHost {
        body: Body,
    }

    impl ReleaseHost for OneShotHost {
        fn latest_release(&self, _repo: &RepoId) -> Result<Option<ReleaseInfo>, HostError> {
            Ok(None)
        }

        fn open_resource(&self, _url: &str) -> Result<Resource, HostError> {
            match &self.body {
                Body::Bytes(bytes) => Ok(Resource {
                    len: Some(bytes.len() as u64),
                    reader: Box::new(io::Cursor::new(bytes.clone())),
                }),
                Body::Truncated(good) => Ok(Resource {
                    len: Some(good.len() as u64 * 2),
                    reader: Box::new(TruncatedReader {
                        good: good.clone(),
                        pos: 0,
                    }),
                }),
                Body::Status(code) => Err(HostError::Status(*code)),
            }
        }

        fn archive_url(&self, repo: &RepoId, tag: &str) -> String {
            format!("fake://{repo}/{tag}.zip")
        }
    }

    fn not_cancelled() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn streams_body_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("artifact.bin");
        let body: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();
        let host = OneShotHost {
            body: Body::Bytes(body.clone()),
        };

        fetch(&host, "fake://artifact", &dest, &NullProgress, &not_cancelled()).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[test]
    fn failed_stream_removes_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("artifact.bin");
        let host = OneShotHost {
            body: Body::Truncated(vec![7u8; 20_000]),
        };

        let err = fetch(&host, "fake://artifact", &dest, &NullProgress, &not_cancelled())
            .unwrap_err();
        assert!(matches!(err, SyncError::Download { .. }), "got {err:?}");
        assert!(!dest.exists(), "partial artifact left on disk");
    }

    #[test]
    fn http_error_reports_download_failure_without_touching_disk() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("artifact.bin");
        let host = OneShotHost {
            body: Body::Status(500),
        };

        let err = fetch(&host, "fake://artifact", &dest, &NullProgress, &not_cancelled())
            .unwrap_err();
        assert!(matches!(err, SyncError::Download { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn cancellation_counts_as_failure_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("artifact.bin");
        let host = OneShotHost {
            body: Body::Bytes(vec![1u8; 1024]),
        };

        let cancel = AtomicBool::new(true);
        let err = fetch(&host, "fake://artifact", &dest, &NullProgress, &cancel).unwrap_err();
        assert!(matches!(err, SyncError::Download { .. }));
        assert!(!dest.exists());
    }
}

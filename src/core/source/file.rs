//! Capture log replay source
//!
//! Replays a recorded capture log (the same line format the serial bridge
//! emits, one hex frame per line) for offline analysis and tests. Blank
//! lines and `#` comments are allowed so logs can be annotated by hand.

use super::{PacketSource, SourceError};
use crate::core::packet::Packet;
use crate::core::wire;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

/// Packet source backed by a recorded capture log.
pub struct FileSource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl FileSource {
    /// Open a capture log for replay.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] when the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        tracing::info!(path = %path.display(), "replaying capture log");

        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
        })
    }
}

#[async_trait]
impl PacketSource for FileSource {
    async fn next_packet(&mut self) -> Result<Option<Packet>, SourceError> {
        loop {
            match self.lines.next_line().await? {
                None => return Ok(None),
                Some(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        continue;
                    }
                    match wire::decode_line(trimmed) {
                        Ok(packet) => return Ok(Some(packet)),
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping undecodable line");
                        }
                    }
                }
            }
        }
    }

    fn source_info(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn frame_line(src_tail: u8, dst_tail: u8) -> String {
        let mut frame = vec![0u8; 48];
        frame[0] = 0x60;
        frame[6] = 17;
        frame[8] = 0x20;
        frame[9] = 0x01;
        frame[23] = src_tail;
        frame[24] = 0x20;
        frame[25] = 0x01;
        frame[39] = dst_tail;
        hex::encode(frame)
    }

    #[tokio::test]
    async fn test_replay_skips_comments_and_garbage() {
        let mut log = tempfile::NamedTempFile::new().unwrap();
        writeln!(log, "# capture from node 1").unwrap();
        writeln!(log).unwrap();
        writeln!(log, "{}", frame_line(1, 2)).unwrap();
        writeln!(log, "not-a-frame").unwrap();
        writeln!(log, "{}", frame_line(2, 1)).unwrap();
        log.flush().unwrap();

        let mut source = FileSource::open(log.path()).await.unwrap();

        let first = source.next_packet().await.unwrap().unwrap();
        assert_eq!(first.sender, "2001::1");

        let second = source.next_packet().await.unwrap().unwrap();
        assert_eq!(second.sender, "2001::2");

        assert!(source.next_packet().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        let result = FileSource::open("/nonexistent/capture.log").await;
        assert!(matches!(result, Err(SourceError::Io(_))));
    }
}

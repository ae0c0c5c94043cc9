//! File-backed line source and sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{LineSink, LineSource, TRACING_TARGET};
use crate::error::{Error, Result};
use crate::stream::Stream;

/// Reads a text file as lines.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the source path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LineSource for FileSource {
    async fn read_lines(&self) -> Result<Stream<String>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| Error::SourceRead {
                path: self.path.clone(),
                source,
            })?;

        let lines: Stream<String> = contents.lines().map(str::to_owned).collect();
        tracing::debug!(
            target: TRACING_TARGET,
            path = %self.path.display(),
            lines = lines.len(),
            "Read source"
        );
        Ok(lines)
    }
}

/// Writes each stream to the file `{prefix}{suffix}`.
///
/// Missing parent directories are created.
#[derive(Debug, Clone)]
pub struct FileSink {
    prefix: String,
}

impl FileSink {
    /// Creates a sink writing below `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the destination of the stream named `suffix`.
    pub fn destination(&self, suffix: &str) -> PathBuf {
        PathBuf::from(format!("{}{suffix}", self.prefix))
    }
}

#[async_trait]
impl LineSink for FileSink {
    async fn write_lines(&self, suffix: &str, lines: &Stream<String>) -> Result<PathBuf> {
        let path = self.destination(suffix);
        let sink_error = |source: std::io::Error| Error::SinkWrite {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(sink_error)?;
        }

        let mut contents = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }
        tokio::fs::write(&path, contents).await.map_err(sink_error)?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path.display(),
            lines = lines.len(),
            "Wrote sink"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_source_reads_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "old pond\r\nfrog leaps in\n\nwater's sound\n").unwrap();

        let lines = FileSource::new(&path).read_lines().await.unwrap();
        assert_eq!(
            lines.to_vec(),
            vec!["old pond", "frog leaps in", "", "water's sound"]
        );
    }

    #[tokio::test]
    async fn test_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileSource::new(dir.path().join("missing.txt"))
            .read_lines()
            .await;
        assert!(matches!(result, Err(Error::SourceRead { .. })));
    }

    #[tokio::test]
    async fn test_sink_writes_prefixed_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/nested/out.", dir.path().display());
        let sink = FileSink::new(prefix);

        let lines: Stream<String> = vec!["a".to_string(), "bb".to_string()].into();
        let path = sink.write_lines("small", &lines).await.unwrap();

        assert_eq!(path, dir.path().join("nested/out.small"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nbb\n");
    }

    #[tokio::test]
    async fn test_sink_reports_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        // A regular file cannot act as a parent directory.
        let sink = FileSink::new(format!("{}/out.", blocker.display()));
        let result = sink.write_lines("big", &Stream::empty()).await;
        assert!(matches!(result, Err(Error::SinkWrite { .. })));
    }
}

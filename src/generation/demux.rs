//! Demultiplexes a chunk stream into text and saved artifacts

use crate::artifacts::{ArtifactError, ArtifactNamer, ArtifactStore, GeneratedArtifact};
use crate::generation::mime::extension_for_mime;
use crate::generation::response::{PartKind, ResponseChunk};
use crate::generation::{ChunkStream, GenerationError, GenerationObserver};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a fully consumed stream produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxOutput {
    pub text: String,
    pub artifacts: Vec<GeneratedArtifact>,

    /// Image parts seen, including dropped ones
    pub image_parts: usize,
}

/// Folds chunks into accumulated text, writing images as they arrive
///
/// Writes run on the blocking thread pool so a large image does not stall
/// the runtime or hold off the call deadline.
pub struct Demultiplexer<'a> {
    store: Arc<dyn ArtifactStore>,
    namer: ArtifactNamer,
    observer: Option<&'a dyn GenerationObserver>,
    output: DemuxOutput,
}

impl<'a> Demultiplexer<'a> {
    pub fn new(store: Arc<dyn ArtifactStore>, namer: ArtifactNamer) -> Self {
        Self {
            store,
            namer,
            observer: None,
            output: DemuxOutput::default(),
        }
    }

    pub fn with_observer(mut self, observer: Option<&'a dyn GenerationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Consume the stream to its end or its first error
    ///
    /// Artifacts written before an error stay on disk; the error discards the
    /// in-memory output.
    pub async fn run(mut self, mut stream: ChunkStream) -> Result<DemuxOutput, GenerationError> {
        while let Some(chunk) = stream.next().await {
            self.accept(chunk?).await;
        }

        info!(
            "Generation complete - Text length: {}, Files generated: {}",
            self.output.text.len(),
            self.output.artifacts.len()
        );
        Ok(self.output)
    }

    /// Handle one chunk; empty frames are skipped
    pub async fn accept(&mut self, chunk: ResponseChunk) {
        let Some(parts) = chunk.parts() else {
            debug!("Skipping chunk without content parts");
            return;
        };

        for part in parts {
            match part.kind() {
                PartKind::InlineImage { mime_type, data } => {
                    self.accept_image(mime_type, data).await
                }
                PartKind::Text(text) => self.accept_text(text),
                PartKind::Other => {}
            }
        }
    }

    fn accept_text(&mut self, text: &str) {
        debug!("Added text content: {:.100}", text);
        self.output.text.push_str(text);
        if let Some(observer) = self.observer {
            observer.on_text(text);
        }
    }

    async fn accept_image(&mut self, mime_type: &str, data: &[u8]) {
        let index = self.output.image_parts;
        self.output.image_parts += 1;

        info!("Found image data in response - MIME type: {}", mime_type);

        let Some(extension) = extension_for_mime(mime_type) else {
            warn!(
                "Dropping image part {}: no file extension for MIME type {:?}",
                index, mime_type
            );
            return;
        };

        let filename = format!("{}{}", self.namer.base_name(index), extension);
        match self.save(&filename, data).await {
            Ok(absolute_path) => {
                info!("Successfully saved image: {}", absolute_path.display());
                let artifact = GeneratedArtifact {
                    filename,
                    absolute_path,
                    mime_type: mime_type.to_string(),
                };
                if let Some(observer) = self.observer {
                    observer.on_artifact(&artifact);
                }
                self.output.artifacts.push(artifact);
            }
            Err(e) => {
                warn!("Dropping image part {}: {}", index, e);
            }
        }
    }

    async fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf, ArtifactError> {
        let store = Arc::clone(&self.store);
        let name = filename.to_string();
        let bytes = data.to_vec();

        tokio::task::spawn_blocking(move || store.save(&name, &bytes))
            .await
            .map_err(|e| ArtifactError::Io {
                path: PathBuf::from(filename),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{naming::parse_index, DirectoryStore};
    use crate::generation::response::ResponsePart;
    use futures::stream;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn chunks(items: Vec<ResponseChunk>) -> ChunkStream {
        stream::iter(items.into_iter().map(Ok)).boxed()
    }

    /// Store that fails the first `failures` writes, then delegates
    struct FlakyStore {
        inner: DirectoryStore,
        failures: Mutex<usize>,
    }

    impl ArtifactStore for FlakyStore {
        fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ArtifactError::Io {
                    path: PathBuf::from(filename),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.inner.save(filename, bytes)
        }
    }

    #[tokio::test]
    async fn test_text_is_concatenated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();

        let output = Demultiplexer::new(Arc::new(store), ArtifactNamer::new())
            .run(chunks(vec![
                ResponseChunk::from_parts(vec![ResponsePart::text("a"), ResponsePart::text("b")]),
                ResponseChunk::default(),
                ResponseChunk::from_parts(vec![ResponsePart::text("c")]),
            ]))
            .await
            .unwrap();

        assert_eq!(output.text, "abc");
        assert!(output.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_mime_advances_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();

        let output = Demultiplexer::new(Arc::new(store), ArtifactNamer::new())
            .run(chunks(vec![ResponseChunk::from_parts(vec![
                ResponsePart::inline("application/x-unknown", vec![1, 2]),
                ResponsePart::inline("image/png", vec![3, 4]),
            ])]))
            .await
            .unwrap();

        assert_eq!(output.image_parts, 2);
        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(parse_index(&output.artifacts[0].filename), Some(1));
    }

    #[tokio::test]
    async fn test_write_failure_skips_artifact_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlakyStore {
            inner: DirectoryStore::new(dir.path()).unwrap(),
            failures: Mutex::new(1),
        };

        let output = Demultiplexer::new(Arc::new(store), ArtifactNamer::new())
            .run(chunks(vec![
                ResponseChunk::from_parts(vec![ResponsePart::inline("image/png", vec![1])]),
                ResponseChunk::from_parts(vec![ResponsePart::text("after")]),
                ResponseChunk::from_parts(vec![ResponsePart::inline("image/jpeg", vec![2])]),
            ]))
            .await
            .unwrap();

        assert_eq!(output.text, "after");
        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(parse_index(&output.artifacts[0].filename), Some(1));
        assert!(output.artifacts[0].filename.ends_with(".jpg"));
        assert_eq!(output.artifacts[0].mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_error_discards_output_but_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();

        let items = vec![
            Ok(ResponseChunk::from_parts(vec![ResponsePart::inline("image/png", vec![9])])),
            Err(GenerationError::Transport("connection reset".to_string())),
            Ok(ResponseChunk::from_parts(vec![ResponsePart::inline("image/png", vec![8])])),
        ];
        let result = Demultiplexer::new(Arc::new(store), ArtifactNamer::new())
            .run(stream::iter(items).boxed())
            .await;

        assert!(matches!(result, Err(GenerationError::Transport(_))));
        let on_disk = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(on_disk, 1);
    }

    /// Records which thread each write ran on
    struct ThreadRecordingStore {
        inner: DirectoryStore,
        threads: Mutex<Vec<std::thread::ThreadId>>,
    }

    impl ArtifactStore for ThreadRecordingStore {
        fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
            self.threads.lock().unwrap().push(std::thread::current().id());
            self.inner.save(filename, bytes)
        }
    }

    #[tokio::test]
    async fn test_writes_run_off_the_runtime_thread() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ThreadRecordingStore {
            inner: DirectoryStore::new(dir.path()).unwrap(),
            threads: Mutex::new(Vec::new()),
        });

        let output = Demultiplexer::new(store.clone(), ArtifactNamer::new())
            .run(chunks(vec![ResponseChunk::from_parts(vec![
                ResponsePart::inline("image/png", vec![1]),
                ResponsePart::inline("image/png", vec![2]),
            ])]))
            .await
            .unwrap();

        assert_eq!(output.artifacts.len(), 2);
        let runtime_thread = std::thread::current().id();
        let threads = store.threads.lock().unwrap();
        assert_eq!(threads.len(), 2);
        assert!(threads.iter().all(|id| *id != runtime_thread));
    }
}

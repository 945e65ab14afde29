//! Shared test harness for pipeline integration tests.
//!
//! Provides [`FakeTools`], a [`ToolRunner`] standing in for ffprobe and
//! ffmpeg, [`RecordingUploader`], an [`ObjectUploader`] that captures what
//! it is given, and [`Harness`], which wires both into an [`AssetPipeline`]
//! rooted in a temporary directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use tubely::{AssetPipeline, LocalAssetStore, ObjectUploader};
use tubely_av::{AspectProber, FastStartTranscoder, ToolCommand, ToolConfig, ToolOutput, ToolRunner};
use tubely_core::config::S3Config;
use tubely_core::{Error, Result};

pub const LANDSCAPE_PROBE: &str =
    r#"{"streams": [{"index": 0, "codec_type": "video", "width": 1920, "height": 1080}, {"index": 1, "codec_type": "audio"}]}"#;
pub const PORTRAIT_PROBE: &str =
    r#"{"streams": [{"index": 0, "codec_type": "video", "width": 1080, "height": 1920}]}"#;
pub const EMPTY_PROBE: &str = r#"{"streams": []}"#;

/// What the fake ffmpeg does when invoked.
#[derive(Debug, Clone)]
pub enum RemuxBehavior {
    /// Write these bytes to the output path.
    Write(Vec<u8>),
    /// Exit successfully without writing anything.
    NoOutput,
    /// Create an empty output file.
    Empty,
    /// Fail as if ffmpeg exited non-zero.
    Fail(String),
}

/// Fake ffprobe/ffmpeg dispatching on the command's tool name.
pub struct FakeTools {
    probe_stdout: Mutex<Result<String>>,
    remux: Mutex<RemuxBehavior>,
    pub calls: Mutex<Vec<ToolCommand>>,
}

impl FakeTools {
    pub fn new(probe_stdout: &str, remux: RemuxBehavior) -> Arc<Self> {
        Arc::new(Self {
            probe_stdout: Mutex::new(Ok(probe_stdout.to_string())),
            remux: Mutex::new(remux),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_probe(message: &str) -> Arc<Self> {
        let tools = Self::new("", RemuxBehavior::Write(b"optimized".to_vec()));
        *tools.probe_stdout.lock() = Err(Error::tool("ffprobe", message));
        tools
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.tool_name()).collect()
    }

    /// The file the most recent ffprobe call inspected.
    pub fn probed_path(&self) -> Option<PathBuf> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.tool_name() == "ffprobe")
            .last()
            .and_then(|c| c.get_args().last().map(PathBuf::from))
    }
}

#[async_trait]
impl ToolRunner for FakeTools {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        self.calls.lock().push(command.clone());

        match command.tool_name().as_str() {
            "ffprobe" => match &*self.probe_stdout.lock() {
                Ok(stdout) => Ok(ToolOutput {
                    stdout: stdout.clone(),
                    stderr: String::new(),
                }),
                Err(e) => Err(Error::tool("ffprobe", e.to_string())),
            },
            "ffmpeg" => {
                let output = command
                    .get_args()
                    .last()
                    .map(PathBuf::from)
                    .ok_or_else(|| Error::Internal("ffmpeg called without output".into()))?;
                match self.remux.lock().clone() {
                    RemuxBehavior::Write(bytes) => std::fs::write(&output, bytes)?,
                    RemuxBehavior::Empty => std::fs::write(&output, b"")?,
                    RemuxBehavior::NoOutput => {}
                    RemuxBehavior::Fail(stderr) => {
                        return Err(Error::tool("ffmpeg", format!("exited with status 1: {stderr}")))
                    }
                }
                Ok(ToolOutput::default())
            }
            other => Err(Error::tool(other, "unexpected tool")),
        }
    }
}

/// A captured upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub contents: Vec<u8>,
}

/// Object uploader that keeps every upload in memory.
#[derive(Default)]
pub struct RecordingUploader {
    pub uploads: Mutex<Vec<Upload>>,
    pub fail_with: Option<String>,
}

impl RecordingUploader {
    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            uploads: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl ObjectUploader for RecordingUploader {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<()> {
        if let Some(message) = &self.fail_with {
            return Err(Error::Storage(message.clone()));
        }
        let contents = tokio::fs::read(path).await?;
        self.uploads.lock().push(Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            contents,
        });
        Ok(())
    }
}

/// A pipeline wired to fakes inside a temporary directory.
pub struct Harness {
    pub pipeline: AssetPipeline,
    pub tools: Arc<FakeTools>,
    pub uploader: Arc<RecordingUploader>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(tools: Arc<FakeTools>) -> Self {
        Self::with_uploader(tools, Arc::new(RecordingUploader::default()))
    }

    pub fn with_uploader(tools: Arc<FakeTools>, uploader: Arc<RecordingUploader>) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).expect("failed to create scratch dir");

        let prober = AspectProber::new(ToolConfig::new("ffprobe", "ffprobe"), tools.clone());
        let transcoder = FastStartTranscoder::new(ToolConfig::new("ffmpeg", "ffmpeg"), tools.clone());
        let assets = LocalAssetStore::new(dir.path().join("assets"), "http://localhost:8091");
        let s3 = S3Config {
            bucket: "mybucket".into(),
            region: "us-east-1".into(),
        };

        let pipeline = AssetPipeline::new(prober, transcoder, uploader.clone(), assets, s3)
            .with_scratch_dir(&scratch);

        Self {
            pipeline,
            tools,
            uploader,
            dir,
        }
    }

    pub fn scratch(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    /// Number of entries left anywhere beneath the scratch directory.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch())
            .expect("scratch dir missing")
            .count()
    }
}

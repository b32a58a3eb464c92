// ABOUTME: Test support utilities.
// ABOUTME: Provides fake collaborators (deployment CLI, repo content) for integration tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use bytes::Bytes;
use stratus::repo::{RepoContent, RepoError, Source};
use stratus::runner::{CommandOutput, CommandRunner, RunnerError};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("stratus=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

type Handler = Box<dyn Fn(&[String]) -> Result<CommandOutput, RunnerError> + Send + Sync>;

/// One recorded CLI invocation.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedCall {
    pub home: PathBuf,
    pub args: Vec<String>,
}

/// Scripted stand-in for the deployment CLI. Records every invocation and
/// answers through the supplied handler.
#[allow(dead_code)]
pub struct FakeCli {
    handler: Handler,
    calls: Mutex<Vec<RecordedCall>>,
}

#[allow(dead_code)]
impl FakeCli {
    pub fn new(
        handler: impl Fn(&[String]) -> Result<CommandOutput, RunnerError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every invocation succeeds with the given stdout.
    pub fn always_ok(stdout: &str) -> Self {
        let stdout = stdout.to_string();
        Self::new(move |_| Ok(CommandOutput::ok(stdout.clone())))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Argument vectors of every recorded invocation.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.calls().into_iter().map(|c| c.args).collect()
    }
}

#[async_trait]
impl CommandRunner for FakeCli {
    async fn run(&self, home: &Path, args: &[String]) -> Result<CommandOutput, RunnerError> {
        self.calls.lock().unwrap().push(RecordedCall {
            home: home.to_path_buf(),
            args: args.to_vec(),
        });
        (self.handler)(args)
    }
}

/// A spawn failure the way the real runner reports one.
#[allow(dead_code)]
pub fn spawn_error(bin: &str) -> RunnerError {
    RunnerError::Spawn {
        bin: bin.to_string(),
        source: std::io::Error::other("spawn failed"),
    }
}

/// In-memory repository content service.
#[allow(dead_code)]
pub struct FakeRepo {
    files: HashMap<String, Vec<u8>>,
}

impl Default for FakeRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl FakeRepo {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.into());
        self
    }
}

#[async_trait]
impl RepoContent for FakeRepo {
    async fn fetch_file(&self, source: &Source, path: &str) -> Result<Bytes, RepoError> {
        self.files
            .get(path)
            .map(|contents| Bytes::from(contents.clone()))
            .ok_or_else(|| RepoError::NotFound {
                owner: source.owner.clone(),
                repo: source.repo.clone(),
                reference: source.reference.clone(),
                path: path.to_string(),
            })
    }

    async fn archive_url(&self, _source: &Source) -> Result<String, RepoError> {
        Ok("http://repo.invalid/archive.tar.gz".to_string())
    }
}

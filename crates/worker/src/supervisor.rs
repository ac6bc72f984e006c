//! Worker process lifecycle (spawn, request/response, shutdown).

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::protocol::{self, Request, Response};

/// Default timeout for a single request/response round trip.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default grace period before a non-exiting worker is killed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Maximum response line size (1MB).
/// Sized for large tool outputs (page contents, search results).
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// Configuration for the worker subprocess.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub call_timeout: Duration,
}

impl WorkerConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// The worker's request/response streams.
///
/// Both streams live behind one mutex so a full write-then-read round
/// trip is atomic: at most one request is in flight, and responses can
/// never be attributed to the wrong request.
struct WorkerIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Handle to the running worker subprocess.
///
/// At most one `Worker` exists per bridge; it owns the process and its
/// standard streams exclusively.
pub struct Worker {
    config: WorkerConfig,
    child: Mutex<Child>,
    io: Mutex<Option<WorkerIo>>,
}

impl Worker {
    /// Spawn the worker subprocess.
    ///
    /// Standard input and output are captured for the line protocol;
    /// standard error is drained by a background task that forwards each
    /// non-empty line to the log for the whole process lifetime.
    pub async fn spawn(config: WorkerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(Error::Spawn)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdin")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdout")))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stderr")))?;

        let command = config.command.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.trim().is_empty() {
                    tracing::warn!(target: "worker::stderr", worker = %command, "{line}");
                }
            }
        });

        Ok(Self {
            config,
            child: Mutex::new(child),
            io: Mutex::new(Some(WorkerIo {
                stdin,
                stdout: BufReader::new(stdout),
            })),
        })
    }

    /// The command this worker was spawned with.
    pub fn command(&self) -> &str {
        &self.config.command
    }

    /// Send a request and decode the worker's response.
    pub async fn call(&self, request: &Request) -> Result<Response> {
        let line = self.round_trip(request).await?;
        Ok(protocol::decode_response(&line)?)
    }

    /// Ask the worker for its tool list, returning the raw response line.
    ///
    /// The tool list reply is not a `{result, error}` document, so the
    /// caller parses it (see the catalog handshake loader).
    pub async fn request_tools(&self) -> Result<String> {
        self.round_trip(&Request::list_tools()).await
    }

    /// Check if the worker process is still running.
    pub async fn is_running(&self) -> bool {
        let mut child = self.child.lock().await;
        matches!(child.try_wait(), Ok(None))
    }

    /// Shut down the worker.
    ///
    /// Writes `{"method":"quit"}` (best effort), closes stdin, then waits
    /// up to `grace` for natural exit before killing the process. Safe to
    /// call on an already-exited worker.
    pub async fn shutdown(&self, grace: Duration) -> Result<()> {
        let mut child = self.child.lock().await;

        if matches!(child.try_wait(), Ok(Some(_))) {
            self.io.lock().await.take();
            return Ok(());
        }

        // An in-flight call holds the I/O mutex for its whole round trip;
        // that request is abandoned, so skip the quit message rather than
        // wait for it.
        match self.io.try_lock() {
            Ok(mut guard) => {
                if let Some(mut io) = guard.take() {
                    match protocol::encode_request(&Request::quit()) {
                        Ok(line) => {
                            if let Err(e) = write_line(&mut io.stdin, &line).await {
                                tracing::warn!("failed to send quit to worker: {e}");
                            }
                        }
                        Err(e) => tracing::warn!("failed to encode quit request: {e}"),
                    }
                    // Dropping WorkerIo closes stdin, signalling EOF.
                    drop(io);
                }
            }
            Err(_) => {
                tracing::debug!("worker I/O busy at shutdown, abandoning in-flight request");
            }
        }

        match timeout(grace, child.wait()).await {
            Ok(status) => {
                let status = status?;
                tracing::debug!(?status, "worker exited");
            }
            Err(_) => {
                tracing::warn!("worker did not exit within {grace:?}, killing");
                child.kill().await?;
            }
        }

        self.io.lock().await.take();
        Ok(())
    }

    async fn round_trip(&self, request: &Request) -> Result<String> {
        let line = protocol::encode_request(request)?;

        let mut guard = self.io.lock().await;
        let io = guard.as_mut().ok_or(Error::NotRunning)?;

        write_line(&mut io.stdin, &line).await?;

        timeout(self.config.call_timeout, read_response(&mut io.stdout))
            .await
            .map_err(|_| Error::Timeout)?
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

async fn read_response(stdout: &mut BufReader<ChildStdout>) -> Result<String> {
    let mut line = String::new();

    let bytes_read = stdout.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Err(Error::Exited);
    }

    if line.len() > MAX_RESPONSE_SIZE {
        return Err(Error::ResponseTooLarge {
            size: line.len(),
            max: MAX_RESPONSE_SIZE,
        });
    }

    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn sh_worker(script: &str) -> WorkerConfig {
        let mut config = WorkerConfig::new("sh");
        config.args = vec!["-c".to_string(), script.to_string()];
        config
    }

    #[tokio::test]
    async fn call_round_trip() {
        let worker = Worker::spawn(sh_worker(
            r#"read line; printf '{"result":"42","error":null}\n'"#,
        ))
        .await
        .unwrap();

        let request = Request::call_tool("answer", BTreeMap::new());
        let response = worker.call(&request).await.unwrap();
        assert_eq!(response.result.as_deref(), Some("42"));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn call_surfaces_worker_error() {
        let worker = Worker::spawn(sh_worker(
            r#"read line; printf '{"result":null,"error":"boom"}\n'"#,
        ))
        .await
        .unwrap();

        let response = worker
            .call(&Request::call_tool("explode", BTreeMap::new()))
            .await
            .unwrap();
        assert_eq!(response.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn empty_response_line_is_protocol_error() {
        let worker = Worker::spawn(sh_worker(r#"read line; printf '\n'"#))
            .await
            .unwrap();

        let result = worker.call(&Request::call_tool("noop", BTreeMap::new())).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn concurrent_calls_are_serialized() {
        let worker = Arc::new(
            Worker::spawn(sh_worker(
                r#"while read line; do printf '{"result":"ok","error":null}\n'; done"#,
            ))
            .await
            .unwrap(),
        );

        let a = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move { worker.call(&Request::call_tool("a", BTreeMap::new())).await })
        };
        let b = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move { worker.call(&Request::call_tool("b", BTreeMap::new())).await })
        };

        assert_eq!(a.await.unwrap().unwrap().result.as_deref(), Some("ok"));
        assert_eq!(b.await.unwrap().unwrap().result.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn slow_worker_times_out() {
        let mut config = sh_worker("read line; sleep 30");
        config.call_timeout = Duration::from_millis(200);
        let worker = Worker::spawn(config).await.unwrap();

        let result = worker.call(&Request::call_tool("hang", BTreeMap::new())).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn shutdown_waits_for_cooperative_exit() {
        let worker = Worker::spawn(sh_worker("read line; exit 0")).await.unwrap();

        worker.shutdown(Duration::from_secs(2)).await.unwrap();
        assert!(!worker.is_running().await);
    }

    #[tokio::test]
    async fn shutdown_kills_stubborn_worker() {
        let worker = Worker::spawn(sh_worker("while true; do sleep 1; done"))
            .await
            .unwrap();

        worker.shutdown(Duration::from_millis(200)).await.unwrap();
        assert!(!worker.is_running().await);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let worker = Worker::spawn(sh_worker("read line; exit 0")).await.unwrap();

        worker.shutdown(Duration::from_secs(2)).await.unwrap();
        worker.shutdown(Duration::from_secs(2)).await.unwrap();
    }

    #[tokio::test]
    async fn call_after_shutdown_fails() {
        let worker = Worker::spawn(sh_worker("read line; exit 0")).await.unwrap();
        worker.shutdown(Duration::from_secs(2)).await.unwrap();

        let result = worker.call(&Request::call_tool("late", BTreeMap::new())).await;
        assert!(matches!(result, Err(Error::NotRunning)));
    }

    #[tokio::test]
    async fn exited_worker_reports_error_not_panic() {
        let worker = Worker::spawn(sh_worker("exit 0")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let result = worker.call(&Request::call_tool("gone", BTreeMap::new())).await;
        assert!(result.is_err());
    }
}

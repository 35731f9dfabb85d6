//! Runs external handler programs.
//!
//! A handler receives its input (one serialized event, or an alert batch for
//! custom notifiers) on stdin. Its stdout and stderr are captured separately
//! and joined into one buffer: all of stdout, then all of stderr. The relative
//! order of writes across the two streams is not preserved. Exit code zero
//! means success.

use crate::core::Event;
use crate::error::{Error, HandlerExecutionError};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default)]
pub struct HandlerExecutor {
    timeout: Option<Duration>,
}

impl HandlerExecutor {
    /// Creates an executor. With `Some(timeout)`, a handler still running
    /// after `timeout` is killed and reported as timed out.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Serializes `event` and runs `handler` with it on stdin.
    ///
    /// # Returns
    /// * `Ok(output)` with the combined stdout/stderr on a zero exit
    /// * `Err(Error::Encoding)` if the event could not be serialized
    /// * `Err(Error::HandlerExecution)` if the handler could not be started,
    ///   exited non-zero or timed out
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn run(&self, event: &Event, handler: &str) -> Result<Vec<u8>, Error> {
        let input = serde_json::to_vec(event)?;
        Ok(self.run_with_input(handler, input).await?)
    }

    /// Runs `handler` with raw bytes on stdin.
    pub async fn run_with_input(
        &self,
        handler: &str,
        input: Vec<u8>,
    ) -> Result<Vec<u8>, HandlerExecutionError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, execute(handler, input))
                .await
                .map_err(|_| HandlerExecutionError::TimedOut {
                    handler: handler.to_string(),
                    limit,
                })?,
            None => execute(handler, input).await,
        }
    }
}

async fn execute(handler: &str, input: Vec<u8>) -> Result<Vec<u8>, HandlerExecutionError> {
    let mut child = Command::new(handler)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Dropping the future on timeout must not leave the process behind.
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| HandlerExecutionError::Spawn {
            handler: handler.to_string(),
            source,
        })?;

    let stdin = child.stdin.take();
    let feed = async move {
        if let Some(mut stdin) = stdin {
            // A handler may exit without reading its input.
            if let Err(e) = stdin.write_all(&input).await {
                debug!(error = %e, "Handler closed stdin before reading all input");
            }
        }
    };

    let (_, output) = tokio::join!(feed, child.wait_with_output());
    let output = output.map_err(|source| HandlerExecutionError::Io {
        handler: handler.to_string(),
        source,
    })?;

    let mut combined = output.stdout;
    combined.extend_from_slice(&output.stderr);

    if output.status.success() {
        Ok(combined)
    } else {
        Err(HandlerExecutionError::NonZeroExit {
            handler: handler.to_string(),
            status: output.status,
            output: String::from_utf8_lossy(&combined).into_owned(),
        })
    }
}

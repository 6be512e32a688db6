use smsforward_core::{OutgoingMessage, SmsTransport, TransportError};
use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const TO_PLACEHOLDER: &str = "{to}";

/// Hands each message to an external program (for example a modem or
/// `termux-sms-send` wrapper). `{to}` in the arguments is replaced by the
/// destination and the body is written to the program's stdin.
#[derive(Debug, Clone)]
pub struct CommandTransport {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTransport {
    pub fn new(argv: &[String], timeout: Duration) -> Result<Self, TransportError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| TransportError::Unavailable("empty command".to_string()))?;
        if program.trim().is_empty() {
            return Err(TransportError::Unavailable("empty command".to_string()));
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    fn command_for(&self, message: &OutgoingMessage) -> Command {
        let mut cmd = Command::new(&self.program);
        for arg in &self.args {
            cmd.arg(arg.replace(TO_PLACEHOLDER, message.to.as_str()));
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl SmsTransport for CommandTransport {
    /// The whole exchange, body upload included, is bounded by the timeout.
    /// Pipes are serviced on helper threads so a program that never reads
    /// its stdin cannot block the caller.
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let deadline = Instant::now() + self.timeout;
        let mut child = self.command_for(message).spawn().map_err(|err| {
            TransportError::Unavailable(format!("failed to start {}: {err}", self.program))
        })?;

        let writer = child.stdin.take().map(|mut stdin| {
            let body = message.body.clone();
            thread::spawn(move || stdin.write_all(body.as_bytes()))
        });
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).map(|_| buf)
            })
        });

        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                kill(&mut child);
                return Err(TransportError::Timeout(self.timeout));
            }
            Err(err) => {
                kill(&mut child);
                return Err(err.into());
            }
        };

        if !status.success() {
            let stderr = stderr
                .and_then(|handle| join_by(handle, deadline))
                .and_then(Result::ok)
                .unwrap_or_default();
            return Err(TransportError::Rejected(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        // A program may succeed without draining stdin.
        match writer.and_then(|handle| join_by(handle, deadline)) {
            Some(Err(err)) if err.kind() != io::ErrorKind::BrokenPipe => Err(err.into()),
            _ => Ok(()),
        }
    }
}

fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn kill(child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!(error = %err, "kill failed");
    }
    if let Err(err) = child.wait() {
        debug!(error = %err, "reaping child failed");
    }
}

/// Joins `handle` unless it is still running at `deadline`; a pipe held open
/// by a grandchild must not stall the caller.
fn join_by<T>(handle: JoinHandle<T>, deadline: Instant) -> Option<T> {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(POLL_INTERVAL);
    }
    handle.join().ok()
}

#[cfg(all(test, unix))]
mod tests {
    use super::CommandTransport;
    use smsforward_core::{OutgoingMessage, SmsTransport, TransportError, UnifiedNumber};
    use std::fs;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn message(body: &str) -> OutgoingMessage {
        OutgoingMessage {
            to: UnifiedNumber::from_stored("+12025550187"),
            body: body.to_string(),
        }
    }

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn passes_destination_and_body() {
        let temp = TempDir::new().expect("tempdir");
        let out = temp.path().join("sent.txt");
        let script = format!("printf '%s|' \"$1\" > {0}; cat >> {0}", out.display());
        let transport = CommandTransport::new(
            &argv(&["sh", "-c", &script, "sh", "{to}"]),
            Duration::from_secs(5),
        )
        .expect("transport");

        transport.send(&message("hello\nworld")).expect("send");
        let written = fs::read_to_string(&out).expect("read");
        assert_eq!(written, "+12025550187|hello\nworld");
    }

    #[test]
    fn reports_non_zero_exit() {
        let transport = CommandTransport::new(
            &argv(&["sh", "-c", "cat > /dev/null; echo busy >&2; exit 3"]),
            Duration::from_secs(5),
        )
        .expect("transport");
        match transport.send(&message("hi")) {
            Err(TransportError::Rejected(reason)) => assert!(reason.contains("busy")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn kills_program_after_timeout() {
        let transport = CommandTransport::new(
            &argv(&["sh", "-c", "sleep 5"]),
            Duration::from_millis(100),
        )
        .expect("transport");
        assert!(matches!(
            transport.send(&message("hi")),
            Err(TransportError::Timeout(_))
        ));
    }

    #[test]
    fn timeout_covers_a_body_the_program_never_reads() {
        let transport = CommandTransport::new(
            &argv(&["sh", "-c", "sleep 3"]),
            Duration::from_millis(200),
        )
        .expect("transport");
        let body = "x".repeat(200 * 1024);

        let started = Instant::now();
        assert!(matches!(
            transport.send(&message(&body)),
            Err(TransportError::Timeout(_))
        ));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn program_may_exit_without_reading_body() {
        let transport = CommandTransport::new(&argv(&["true"]), Duration::from_secs(5))
            .expect("transport");
        let body = "x".repeat(200 * 1024);
        transport.send(&message(&body)).expect("send");

        let failing = CommandTransport::new(
            &argv(&["sh", "-c", "echo nope >&2; exit 4"]),
            Duration::from_secs(5),
        )
        .expect("transport");
        match failing.send(&message(&body)) {
            Err(TransportError::Rejected(reason)) => assert!(reason.contains("nope")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_command() {
        assert!(CommandTransport::new(&[], Duration::from_secs(1)).is_err());
        assert!(CommandTransport::new(&argv(&[" "]), Duration::from_secs(1)).is_err());
    }
}

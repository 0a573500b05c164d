//! The host boundary: where PRINT output goes and INPUT lines come from.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::RuntimeError;

/// Platform surface a running program talks to. The executor polls
/// `stop_requested` between statements, so a host can cancel a program
/// cooperatively.
pub trait Host {
    fn print(&mut self, text: &str);
    fn input_line(&mut self) -> Result<String, RuntimeError>;
    fn stop_requested(&self) -> bool {
        false
    }
}

/// Standard terminal host: stdout and stdin.
#[derive(Debug, Default)]
pub struct StdHost;

impl StdHost {
    pub fn new() -> Self {
        StdHost
    }
}

impl Host for StdHost {
    fn print(&mut self, text: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = handle.write_all(text.as_bytes());
        let _ = handle.flush();
    }

    fn input_line(&mut self) -> Result<String, RuntimeError> {
        let stdin = std::io::stdin();
        let mut line = String::new();
        let n = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| RuntimeError::new(format!("input failed: {}", e)))?;
        if n == 0 {
            return Err(RuntimeError::new("end of input"));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}

/// Scripted host for tests: queued input lines, captured output.
#[derive(Debug, Default)]
pub struct TestHost {
    inputs: VecDeque<String>,
    pub output: String,
    pub stop: bool,
}

impl TestHost {
    pub fn new() -> Self {
        TestHost::default()
    }

    pub fn with_input(lines: &[&str]) -> Self {
        TestHost {
            inputs: lines.iter().map(|s| s.to_string()).collect(),
            output: String::new(),
            stop: false,
        }
    }
}

impl Host for TestHost {
    fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn input_line(&mut self) -> Result<String, RuntimeError> {
        self.inputs
            .pop_front()
            .ok_or_else(|| RuntimeError::new("end of input"))
    }

    fn stop_requested(&self) -> bool {
        self.stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_captures_output() {
        let mut host = TestHost::new();
        host.print("HELLO");
        host.print("\n");
        assert_eq!(host.output, "HELLO\n");
    }

    #[test]
    fn test_host_replays_input_in_order() {
        let mut host = TestHost::with_input(&["one", "two"]);
        assert_eq!(host.input_line().unwrap(), "one");
        assert_eq!(host.input_line().unwrap(), "two");
        assert!(host.input_line().is_err());
    }

    #[test]
    fn test_host_stop_flag() {
        let mut host = TestHost::new();
        assert!(!host.stop_requested());
        host.stop = true;
        assert!(host.stop_requested());
    }
}

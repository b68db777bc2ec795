//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Mutex;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Line-oriented console interaction for the interactive session.
pub trait Prompt: Send + Sync {
    /// Show `message` and read one line of input, without the trailing newline.
    /// Returns `None` at end of input.
    fn ask(&self, message: &str) -> io::Result<Option<String>>;

    /// Print one line of output.
    fn say(&self, message: &str) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// Real prompt on stdin/stdout.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&self, message: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{message}")?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&self, message: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{message}")
    }
}

/// Prompt fed from a fixed list of answers, recording everything shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    transcript: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt and line shown so far.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    fn record(&self, line: &str) -> io::Result<()> {
        self.transcript
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?
            .push(line.to_string());
        Ok(())
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, message: &str) -> io::Result<Option<String>> {
        self.record(message)?;
        let answer = self
            .answers
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?
            .pop_front();
        Ok(answer)
    }

    fn say(&self, message: &str) -> io::Result<()> {
        self.record(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/army.txt");
        let fs = RealFileSystem;

        fs.ensure_parent(&path).unwrap();
        fs.write(&path, "Grunt\n").unwrap();

        assert!(fs.exists(&path));
        assert_eq!(fs.read_to_string(&path).unwrap(), "Grunt\n");
    }

    #[test]
    fn test_scripted_prompt_runs_dry() {
        let prompt = ScriptedPrompt::new(["Titus"]);
        assert_eq!(prompt.ask("Attacker: ").unwrap().as_deref(), Some("Titus"));
        assert_eq!(prompt.ask("Defender: ").unwrap(), None);
        prompt.say("bye").unwrap();
        assert_eq!(prompt.transcript(), vec!["Attacker: ", "Defender: ", "bye"]);
    }
}

//! Formula recognition through a long-lived image-to-LaTeX worker process.
//!
//! The worker is started once with its configured arguments and keeps its
//! model loaded. Each request is one image path written as a line on stdin;
//! the reply is one line of markup on stdout. A reply may echo the image path
//! as `<path>: markup`. Device selection such as `--no-cuda` belongs in the
//! arguments.

use crate::command::{scratch_png, strip_path_echo};
use image::{DynamicImage, Rgb, RgbImage};
use pptocr_core::{Error, Recognizer, Result};
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

const BACKEND: &str = "formula";

/// Formula OCR backed by one worker process for the whole run.
#[derive(Debug)]
pub struct FormulaCommandRecognizer {
    program: String,
    worker: Mutex<Option<Worker>>,
}

#[derive(Debug)]
struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    last_stderr: Arc<Mutex<String>>,
}

impl FormulaCommandRecognizer {
    /// Start `program` with `args` and run a warm-up image through it.
    ///
    /// Fails if the worker cannot be launched or does not answer the warm-up
    /// request, so a broken model or device setting is caught here.
    pub fn start(program: impl Into<String>, args: Vec<String>) -> Result<Self> {
        let program = program.into();
        let worker = Worker::spawn(&program, &args)?;
        let recognizer = Self {
            program,
            worker: Mutex::new(Some(worker)),
        };

        recognizer.recognize(&warm_up_image())?;
        log::debug!("Formula worker '{}' is ready", recognizer.program);
        Ok(recognizer)
    }
}

impl Recognizer for FormulaCommandRecognizer {
    fn name(&self) -> &str {
        BACKEND
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let scratch = scratch_png(BACKEND, image)?;

        let mut slot = self
            .worker
            .lock()
            .map_err(|_| Error::recognizer(BACKEND, "worker lock poisoned"))?;
        let worker = slot.as_mut().ok_or_else(|| {
            Error::recognizer(BACKEND, format!("worker '{}' has exited", self.program))
        })?;

        match worker.request(&scratch.path().to_string_lossy()) {
            Ok(reply) => Ok(strip_path_echo(&reply, scratch.path()).trim().to_string()),
            Err(reason) => {
                // A dead worker is not restarted; later requests fail fast.
                let reason = slot.take().map_or(reason.clone(), |w| w.shut_down(reason));
                Err(Error::recognizer(BACKEND, reason))
            }
        }
    }
}

impl Drop for FormulaCommandRecognizer {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.worker.lock() {
            if let Some(mut worker) = slot.take() {
                let _ = worker.child.kill();
                let _ = worker.child.wait();
            }
        }
    }
}

impl Worker {
    fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::recognizer(BACKEND, format!("cannot start '{}': {}", program, e)))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(Error::recognizer(BACKEND, "worker pipes unavailable"));
        };

        let last_stderr = Arc::new(Mutex::new(String::new()));
        if let Some(stderr) = child.stderr.take() {
            drain_stderr(stderr, Arc::clone(&last_stderr));
        }

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            last_stderr,
        })
    }

    fn request(&mut self, image_path: &str) -> std::result::Result<String, String> {
        writeln!(self.stdin, "{}", image_path)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| format!("cannot send request: {}", e))?;

        let mut reply = String::new();
        match self.stdout.read_line(&mut reply) {
            Ok(0) => Err("worker closed its output".to_string()),
            Ok(_) => Ok(reply),
            Err(e) => Err(format!("cannot read reply: {}", e)),
        }
    }

    /// Stop the worker and describe why it failed.
    fn shut_down(mut self, reason: String) -> String {
        drop(self.stdin);
        let status = match self.child.try_wait() {
            Ok(Some(status)) => Some(status),
            _ => {
                let _ = self.child.kill();
                self.child.wait().ok()
            }
        };

        let detail = self
            .last_stderr
            .lock()
            .map(|line| line.clone())
            .unwrap_or_default();
        let mut message = match status {
            Some(status) => format!("{} (exited with {})", reason, status),
            None => reason,
        };
        if !detail.is_empty() {
            message.push_str(": ");
            message.push_str(&detail);
        }
        message
    }
}

/// Forward worker stderr to the log, remembering the last non-empty line.
fn drain_stderr(stderr: impl Read + Send + 'static, last: Arc<Mutex<String>>) {
    thread::spawn(move || {
        for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            log::debug!("{}: {}", BACKEND, line);
            if let Ok(mut last) = last.lock() {
                *last = line.to_string();
            }
        }
    });
}

fn warm_up_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([255, 255, 255])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, extra: &[&str]) -> (String, Vec<String>) {
        let mut args = vec!["-c".to_string(), script.to_string(), "sh".to_string()];
        args.extend(extra.iter().map(|a| a.to_string()));
        ("sh".to_string(), args)
    }

    #[test]
    fn test_start_missing_program() {
        let err = FormulaCommandRecognizer::start("pptocr-missing-pix2tex", vec![]).unwrap_err();
        assert!(matches!(err, Error::Recognizer { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_start_fails_when_worker_dies() {
        let (program, args) = sh("echo 'CUDA not available' >&2; exit 1", &[]);
        let err = FormulaCommandRecognizer::start(program, args).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::Recognizer { .. }));
        assert!(message.contains("exit"), "{}", message);
    }

    #[cfg(unix)]
    #[test]
    fn test_start_passes_configured_args() {
        // The worker refuses to answer unless it was given --no-cuda.
        let script = r#"[ "$1" = "--no-cuda" ] || exit 2; while read p; do echo "ok"; done"#;
        let (program, args) = sh(script, &["--no-cuda"]);
        assert!(FormulaCommandRecognizer::start(program, args).is_ok());

        let (program, args) = sh(script, &[]);
        assert!(FormulaCommandRecognizer::start(program, args).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_one_worker_serves_every_image() {
        // Replies carry the worker pid, so every answer must match.
        let (program, args) = sh(r#"while read p; do echo "$p: pid$$"; done"#, &[]);
        let recognizer = FormulaCommandRecognizer::start(program, args).unwrap();

        let first = recognizer.recognize(&DynamicImage::new_rgb8(2, 2)).unwrap();
        let second = recognizer.recognize(&DynamicImage::new_rgb8(4, 4)).unwrap();
        assert!(first.starts_with("pid"), "{}", first);
        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn test_worker_exit_mid_run_is_error() {
        // Answers the warm-up request, then quits.
        let (program, args) = sh(r#"read p; echo "E=mc^{2}""#, &[]);
        let recognizer = FormulaCommandRecognizer::start(program, args).unwrap();

        let err = recognizer.recognize(&DynamicImage::new_rgb8(2, 2)).unwrap_err();
        assert!(matches!(err, Error::Recognizer { .. }));
        let again = recognizer.recognize(&DynamicImage::new_rgb8(2, 2)).unwrap_err();
        assert!(again.to_string().contains("has exited"), "{}", again);
    }
}

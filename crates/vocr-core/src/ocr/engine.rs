//! Tesseract engine discovery and invocation.
//!
//! The engine is located once, by [`TesseractEngine::probe`], which either
//! returns a ready handle or an [`EngineUnavailable`] describing what to
//! install. Recognition pipes a PNG into `tesseract stdin stdout` with a
//! fixed configuration: uniform block of text (`--psm 6`), default engine
//! mode (`--oem 3`).

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use image::ImageFormat;
use tracing::{debug, info, warn};

use crate::error::{EngineUnavailable, OcrError};
use crate::models::config::OcrConfig;

use super::recognizer::TextRecognizer;
use super::{Language, OcrInput, RecognizedText};

/// Installation locations tried after the configured path, in order.
pub const TESSERACT_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    "/usr/bin/tesseract-ocr",
];

/// Name resolved through `PATH` when no candidate location exists.
const PATH_FALLBACK: &str = "tesseract";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Handle to a verified Tesseract installation.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
    version: String,
    languages: Vec<String>,
    page_segmentation_mode: u8,
    engine_mode: u8,
    timeout: Duration,
}

impl TesseractEngine {
    /// Locate a working `tesseract` with the configured language pack.
    pub fn probe(config: &OcrConfig) -> Result<Self, EngineUnavailable> {
        let language = Language::from_code(&config.language).ok_or_else(|| EngineUnavailable {
            reason: format!("unsupported language '{}'", config.language),
            searched: Vec::new(),
        })?;

        let mut searched = Vec::new();

        for candidate in candidate_paths(config) {
            searched.push(candidate.display().to_string());

            if candidate.is_absolute() && !candidate.exists() {
                debug!("Tesseract candidate {} does not exist", candidate.display());
                continue;
            }

            let Some(version) = query_version(&candidate) else {
                debug!("Tesseract candidate {} did not answer --version", candidate.display());
                continue;
            };

            let languages = list_languages(&candidate);
            let code = language.tesseract_code();
            if !languages.iter().any(|l| l == code) {
                warn!(
                    "Tesseract {} at {} lacks the '{}' language pack",
                    version,
                    candidate.display(),
                    code
                );
                return Err(EngineUnavailable {
                    reason: format!(
                        "language pack '{}' is not installed for {}",
                        code,
                        candidate.display()
                    ),
                    searched,
                });
            }

            info!("Using Tesseract {} at {}", version, candidate.display());
            return Ok(Self {
                executable: candidate,
                version,
                languages,
                page_segmentation_mode: config.page_segmentation_mode,
                engine_mode: config.engine_mode,
                timeout: Duration::from_secs(config.timeout_secs.max(1)),
            });
        }

        Err(EngineUnavailable {
            reason: "tesseract executable not found".to_string(),
            searched,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Version line reported by the executable.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Installed language packs.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Command line after the executable: read from stdin, write to stdout.
    fn arguments(&self, language: Language) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            language.tesseract_code().to_string(),
            "--oem".to_string(),
            self.engine_mode.to_string(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
        ]
    }

    fn run(&self, png: Vec<u8>, language: Language) -> Result<String, OcrError> {
        let mut child = engine_command(&self.executable)
            .args(self.arguments(language))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(OcrError::Launch)?;

        let feeder = feed(child.stdin.take(), png);
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_with_deadline(&mut child, self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(OcrError::Timeout(self.timeout.as_secs()));
            }
        };

        if let Ok(Err(e)) = feeder.join() {
            debug!("Writing the bitmap to tesseract failed: {}", e);
        }
        let stdout = stdout.join().unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr.join().unwrap_or_default()).into_owned();

        if !status.success() {
            if stderr.contains("Failed loading language") {
                return Err(OcrError::MissingLanguage(language.tesseract_code().to_string()));
            }
            return Err(OcrError::Engine {
                code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        String::from_utf8(stdout).map_err(|_| OcrError::Encoding)
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&self, image: OcrInput<'_>, language: Language) -> Result<RecognizedText, OcrError> {
        let (width, height) = image.dimensions();
        debug!("Recognizing {:?} {}x{} bitmap", image.kind(), width, height);

        let mut png = Vec::new();
        image
            .to_dynamic()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let start = Instant::now();
        let text = self.run(png, language)?;
        debug!(
            "Tesseract returned {} characters in {}ms",
            text.len(),
            start.elapsed().as_millis()
        );

        Ok(RecognizedText::new(text, language))
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

fn candidate_paths(config: &OcrConfig) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = &config.tesseract_path {
        paths.push(path.clone());
    }
    paths.extend(TESSERACT_CANDIDATES.iter().map(PathBuf::from));
    paths.push(PathBuf::from(PATH_FALLBACK));
    paths
}

/// Command for the engine executable, detached from the terminal's process
/// group so a Ctrl-C aimed at vocr does not kill the running recognition.
fn engine_command(executable: &Path) -> Command {
    let mut command = Command::new(executable);
    command.stdin(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command
}

fn query_version(executable: &Path) -> Option<String> {
    let output = engine_command(executable).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }

    // Tesseract 3 prints the banner on stderr, later versions on stdout.
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };

    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn list_languages(executable: &Path) -> Vec<String> {
    match engine_command(executable).arg("--list-langs").output() {
        Ok(output) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push('\n');
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            parse_language_list(&combined)
        }
        Err(e) => {
            warn!("Failed to list Tesseract languages: {}", e);
            Vec::new()
        }
    }
}

fn parse_language_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("List of available languages"))
        .filter(|line| !line.contains(' '))
        .map(str::to_string)
        .collect()
}

/// Write `bytes` to the child's stdin on a separate thread, closing it afterwards.
fn feed<W: Write + Send + 'static>(
    pipe: Option<W>,
    bytes: Vec<u8>,
) -> thread::JoinHandle<std::io::Result<()>> {
    thread::spawn(move || match pipe {
        Some(mut pipe) => pipe.write_all(&bytes),
        None => Ok(()),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Wait for the child, giving up after `timeout`. `None` means it is still running.
///
/// A timeout too large to represent as an instant waits without a deadline.
fn wait_with_deadline(
    child: &mut std::process::Child,
    timeout: Duration,
) -> Result<Option<ExitStatus>, OcrError> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if let Some(status) = child.try_wait().map_err(OcrError::Launch)? {
            return Ok(Some(status));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_language_list() {
        let output = "List of available languages in \"/usr/share/tesseract-ocr/5/tessdata/\" (3):\neng\nosd\npor\n";
        assert_eq!(parse_language_list(output), vec!["eng", "osd", "por"]);
    }

    #[test]
    fn test_candidates_start_with_configured_path() {
        let config = OcrConfig {
            tesseract_path: Some(PathBuf::from("/opt/custom/tesseract")),
            ..OcrConfig::default()
        };

        let paths = candidate_paths(&config);
        assert_eq!(paths[0], PathBuf::from("/opt/custom/tesseract"));
        assert_eq!(paths.last(), Some(&PathBuf::from("tesseract")));
    }

    #[test]
    fn test_fixed_arguments() {
        let engine = TesseractEngine {
            executable: PathBuf::from("tesseract"),
            version: "tesseract 5.3.0".to_string(),
            languages: vec!["por".to_string()],
            page_segmentation_mode: 6,
            engine_mode: 3,
            timeout: Duration::from_secs(5),
        };

        assert_eq!(
            engine.arguments(Language::Portuguese),
            vec!["stdin", "stdout", "-l", "por", "--oem", "3", "--psm", "6"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unbounded_timeout_does_not_overflow() {
        let mut child = engine_command(Path::new("true")).spawn().unwrap();

        let status = wait_with_deadline(&mut child, Duration::MAX).unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[cfg(unix)]
    #[test]
    fn test_short_timeout_reports_running_child() {
        let mut child = engine_command(Path::new("sleep")).arg("5").spawn().unwrap();

        let status = wait_with_deadline(&mut child, Duration::from_millis(50)).unwrap();
        assert!(status.is_none());

        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_engine_runs_in_its_own_process_group() {
        let output = engine_command(Path::new("sh"))
            .args(["-c", "cut -d' ' -f5 /proc/$$/stat; echo $$"])
            .output()
            .unwrap();

        let text = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1], "process group id should equal the pid");
    }

    #[cfg(unix)]
    #[test]
    fn test_feed_writes_stdin_to_child() {
        let mut child = engine_command(Path::new("cat"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();

        let feeder = feed(child.stdin.take(), b"\x89PNG bytes".to_vec());
        let stdout = drain(child.stdout.take());
        child.wait().unwrap();

        feeder.join().unwrap().unwrap();
        assert_eq!(stdout.join().unwrap(), b"\x89PNG bytes".to_vec());
    }

    #[test]
    fn test_unsupported_language_is_unavailable() {
        let config = OcrConfig {
            language: "klingon".to_string(),
            ..OcrConfig::default()
        };

        let err = TesseractEngine::probe(&config).unwrap_err();
        assert!(err.reason.contains("klingon"));
    }
}

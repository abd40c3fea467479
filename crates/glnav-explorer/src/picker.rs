//! The external menu picker.
//!
//! [`Picker`] is the blocking "choose one or more of these strings" call the
//! explorer makes for every menu. [`FzfPicker`] implements it by running
//! `fzf` with the choices on stdin and reading the selection from stdout;
//! fzf draws its interface on the controlling terminal, so the pipes carry
//! only data.

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use glnav_core::{Error, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Default picker executable.
pub const DEFAULT_COMMAND: &str = "fzf";
/// Where to get fzf when it is missing.
pub const FZF_URL: &str = "https://github.com/junegunn/fzf";
/// Default fzf `--height`.
pub const DEFAULT_HEIGHT: &str = "20%";
/// Default fzf `--layout`.
pub const DEFAULT_LAYOUT: &str = "reverse";

/// One selection request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickRequest {
    /// Choices in display order. Must be unique.
    pub choices: Vec<String>,
    /// Header shown above the choices.
    pub header: String,
    /// Whether several choices may be selected.
    pub multi: bool,
}

/// Blocking selection over an ordered list of strings.
#[async_trait]
pub trait Picker: Send + Sync {
    /// Present `request` and return the selected strings in order.
    ///
    /// An empty result means the operator selected nothing (cancelled).
    async fn pick(&self, request: &PickRequest) -> Result<Vec<String>>;
}

/// [`Picker`] backed by the `fzf` executable.
#[derive(Clone, Debug)]
pub struct FzfPicker {
    command: String,
    height: String,
    layout: String,
}

impl Default for FzfPicker {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

impl FzfPicker {
    /// Create a picker running `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            height: DEFAULT_HEIGHT.to_string(),
            layout: DEFAULT_LAYOUT.to_string(),
        }
    }

    /// Sets the `--height` option.
    pub fn with_height(mut self, height: impl Into<String>) -> Self {
        self.height = height.into();
        self
    }

    /// Sets the `--layout` option.
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Check once that the executable can be started.
    pub async fn probe(&self) -> Result<()> {
        let status = Command::new(&self.command)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::picker_unavailable(format!(
                    "Cannot find '{}' in PATH. Install from {FZF_URL}",
                    self.command
                )),
                _ => Error::picker_unavailable(format!("Cannot run '{}': {e}", self.command)),
            })?;
        if !status.success() {
            return Err(Error::picker_unavailable(format!(
                "'{} --version' exited with {status}",
                self.command
            )));
        }
        Ok(())
    }

    /// Command-line arguments for one request.
    pub fn args(&self, request: &PickRequest) -> Vec<String> {
        let mut args = vec![
            format!("--header={}", request.header),
            format!("--height={}", self.height),
            format!("--layout={}", self.layout),
        ];
        if request.multi {
            args.push("--multi".to_string());
        }
        args
    }
}

#[async_trait]
impl Picker for FzfPicker {
    async fn pick(&self, request: &PickRequest) -> Result<Vec<String>> {
        let mut child = Command::new(&self.command)
            .args(self.args(request))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::picker(format!("failed to start '{}': {e}", self.command)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = request.choices.join("\n");
            // fzf may exit before consuming all input.
            match stdin.write_all(input.as_bytes()).await {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output().await?;
        match output.status.code() {
            Some(0) => Ok(parse_selection(&output.stdout)),
            // 1: no match, 130: aborted with ESC / CTRL-C
            Some(1) | Some(130) => {
                debug!(header = %request.header, "picker cancelled");
                Ok(Vec::new())
            }
            _ => Err(Error::picker(format!(
                "'{}' exited with {}",
                self.command, output.status
            ))),
        }
    }
}

/// Split picker output into non-empty lines.
pub fn parse_selection(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(multi: bool) -> PickRequest {
        PickRequest {
            choices: vec!["a".into(), "b".into()],
            header: "Issues>".into(),
            multi,
        }
    }

    #[test]
    fn test_fzf_args_single() {
        let picker = FzfPicker::default();
        assert_eq!(
            picker.args(&request(false)),
            vec!["--header=Issues>", "--height=20%", "--layout=reverse"]
        );
    }

    #[test]
    fn test_fzf_args_multi_and_overrides() {
        let picker = FzfPicker::new("sk").with_height("40%").with_layout("default");
        let args = picker.args(&request(true));
        assert!(args.contains(&"--height=40%".to_string()));
        assert!(args.contains(&"--layout=default".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--multi"));
    }

    #[test]
    fn test_parse_selection_drops_blank_lines() {
        let out = b"1\tA\n\n3\tC\n";
        assert_eq!(parse_selection(out), vec!["1\tA", "3\tC"]);
    }

    /// An executable shell script standing in for fzf.
    #[cfg(unix)]
    fn script(dir: &tempfile::TempDir, body: &str) -> FzfPicker {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("picker.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        FzfPicker::new(path.to_str().unwrap())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pick_exit_zero_returns_selection() {
        let dir = tempfile::TempDir::new().unwrap();
        let picker = script(&dir, "sed -n 2p");
        assert_eq!(picker.pick(&request(false)).await.unwrap(), vec!["b"]);

        let picker = script(&dir, "cat");
        assert_eq!(picker.pick(&request(true)).await.unwrap(), vec!["a", "b"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pick_exit_one_and_130_cancel() {
        let dir = tempfile::TempDir::new().unwrap();
        for code in [1, 130] {
            let picker = script(&dir, &format!("cat >/dev/null; echo a; exit {code}"));
            assert!(picker.pick(&request(false)).await.unwrap().is_empty());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pick_other_exit_code_is_picker_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let picker = script(&dir, "cat >/dev/null; exit 2");
        let err = picker.pick(&request(false)).await.unwrap_err();
        assert!(matches!(err, Error::Picker(_)));
        assert!(!err.is_recoverable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pick_receives_header_argument() {
        let dir = tempfile::TempDir::new().unwrap();
        let picker = script(&dir, "cat >/dev/null; printf '%s\\n' \"$1\"");
        assert_eq!(
            picker.pick(&request(false)).await.unwrap(),
            vec!["--header=Issues>"]
        );
    }

    #[tokio::test]
    async fn test_probe_missing_executable() {
        let picker = FzfPicker::new("glnav-definitely-not-a-picker");
        let err = picker.probe().await.unwrap_err();
        assert!(matches!(err, Error::PickerUnavailable(_)));
    }
}

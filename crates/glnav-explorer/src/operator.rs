//! Operator I/O outside the picker.
//!
//! Free-text prompts and result output go through [`Operator`] so handlers
//! never touch the terminal directly. [`TerminalOperator`] is the
//! interactive implementation; tests use
//! [`MockOperator`](crate::mock::MockOperator).

use std::io::Write;

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use glnav_core::{Error, Result};
use serde_json::Value;

/// Interactive operator channel.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Ask for one line of text.
    ///
    /// `suggestion` is shown next to the label. An empty answer means the
    /// operator accepted the suggestion; callers substitute the typed
    /// default themselves.
    async fn prompt(&self, label: &str, suggestion: Option<&str>) -> Result<String>;

    /// Neutral status line.
    fn info(&self, message: &str);

    /// Completion message.
    fn success(&self, message: &str);

    /// Reported failure; the session continues.
    fn error(&self, message: &str);

    /// Structured result.
    fn show_value(&self, value: &Value);

    /// Raw bytes, e.g. a downloaded artifact.
    fn write_bytes(&self, bytes: &[u8]) -> Result<()>;
}

/// [`Operator`] on the controlling terminal.
///
/// Prompts use `dialoguer`; results go to stdout and messages to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalOperator;

impl TerminalOperator {
    /// Create a terminal operator.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Operator for TerminalOperator {
    async fn prompt(&self, label: &str, suggestion: Option<&str>) -> Result<String> {
        let text = match suggestion {
            Some(s) => format!("{label} [{s}]"),
            None => label.to_string(),
        };
        tokio::task::spawn_blocking(move || {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt(text)
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| Error::operation(format!("prompt task failed: {e}")))?
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
    }

    fn info(&self, message: &str) {
        eprintln!("{message}");
    }

    fn success(&self, message: &str) {
        eprintln!("{}", message.green());
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }

    fn show_value(&self, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{value}"),
        }
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
        Ok(())
    }
}

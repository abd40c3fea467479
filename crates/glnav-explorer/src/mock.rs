//! Scripted picker and operator for testing.
//!
//! [`MockPicker`] answers picker requests from a queue and records every
//! request it saw; once the queue is empty it cancels. [`MockOperator`]
//! answers prompts from a queue and records everything shown to the
//! operator; once its queue is empty a prompt fails with an I/O error.

use std::collections::VecDeque;
use std::sync::{Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use glnav_core::{Error, Result};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::operator::Operator;
use crate::picker::{PickRequest, Picker};

/// Picker that replays scripted selections.
#[derive(Default)]
pub struct MockPicker {
    script: Mutex<VecDeque<Vec<String>>>,
    requests: Mutex<Vec<PickRequest>>,
}

impl MockPicker {
    /// Create a picker with an empty script (every request cancels).
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a selection of the given lines.
    pub fn then_pick<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        self.script.get_mut().push_back(lines);
        self
    }

    /// Queue a cancellation.
    pub fn then_cancel(self) -> Self {
        self.then_pick(Vec::<String>::new())
    }

    /// Every request seen so far.
    pub async fn requests(&self) -> Vec<PickRequest> {
        self.requests.lock().await.clone()
    }

    /// Headers of every request seen so far.
    pub async fn headers(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|r| r.header.clone())
            .collect()
    }

    /// Scripted selections not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl Picker for MockPicker {
    async fn pick(&self, request: &PickRequest) -> Result<Vec<String>> {
        self.requests.lock().await.push(request.clone());
        Ok(self.script.lock().await.pop_front().unwrap_or_default())
    }
}

/// Something shown to the operator.
#[derive(Clone, Debug, PartialEq)]
pub enum Shown {
    /// [`Operator::info`].
    Info(String),
    /// [`Operator::success`].
    Success(String),
    /// [`Operator::error`].
    Error(String),
    /// [`Operator::show_value`].
    Value(Value),
    /// [`Operator::write_bytes`].
    Bytes(Vec<u8>),
}

/// Operator that replays scripted answers.
#[derive(Default)]
pub struct MockOperator {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<(String, Option<String>)>>,
    shown: StdMutex<Vec<Shown>>,
}

impl MockOperator {
    /// Create an operator with no scripted answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer to the next prompt.
    pub fn then_answer(mut self, answer: impl Into<String>) -> Self {
        self.answers.get_mut().push_back(answer.into());
        self
    }

    /// Prompts seen so far as `(label, suggestion)`.
    pub async fn prompts(&self) -> Vec<(String, Option<String>)> {
        self.prompts.lock().await.clone()
    }

    /// Everything shown so far.
    pub fn shown(&self) -> Vec<Shown> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages reported through [`Operator::error`].
    pub fn errors(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Messages reported through [`Operator::info`] and [`Operator::success`].
    pub fn messages(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Info(m) | Shown::Success(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn push(&self, item: Shown) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }
}

#[async_trait]
impl Operator for MockOperator {
    async fn prompt(&self, label: &str, suggestion: Option<&str>) -> Result<String> {
        self.prompts
            .lock()
            .await
            .push((label.to_string(), suggestion.map(str::to_string)));
        self.answers.lock().await.pop_front().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("no scripted answer for '{label}'"),
            ))
        })
    }

    fn info(&self, message: &str) {
        self.push(Shown::Info(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.push(Shown::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Shown::Error(message.to_string()));
    }

    fn show_value(&self, value: &Value) {
        self.push(Shown::Value(value.clone()));
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.push(Shown::Bytes(bytes.to_vec()));
        Ok(())
    }
}

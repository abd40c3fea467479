//! Menu adapter.
//!
//! Turns an ordered list of labeled choices into one picker request and
//! decodes the picker's answer back into choice indices.

use std::collections::HashSet;
use std::sync::Arc;

use glnav_core::{Error, Result};

use crate::picker::{PickRequest, Picker};

/// Adapter between labeled choices and a [`Picker`].
#[derive(Clone)]
pub struct MenuAdapter {
    picker: Arc<dyn Picker>,
}

impl MenuAdapter {
    /// Wrap a picker.
    pub fn new(picker: Arc<dyn Picker>) -> Self {
        Self { picker }
    }

    /// Ask for one choice. `None` means the operator cancelled.
    pub async fn select<S: AsRef<str>>(&self, choices: &[S], header: &str) -> Result<Option<usize>> {
        let picked = self.request(choices, header, false).await?;
        Ok(picked.first().copied())
    }

    /// Ask for any number of choices. Empty means the operator cancelled.
    pub async fn select_many<S: AsRef<str>>(&self, choices: &[S], header: &str) -> Result<Vec<usize>> {
        self.request(choices, header, true).await
    }

    async fn request<S: AsRef<str>>(
        &self,
        choices: &[S],
        header: &str,
        multi: bool,
    ) -> Result<Vec<usize>> {
        if choices.is_empty() {
            return Ok(Vec::new());
        }

        let request = PickRequest {
            choices: distinct_lines(choices),
            header: header.to_string(),
            multi,
        };
        let selected = self.picker.pick(&request).await?;

        selected
            .iter()
            .map(|line| {
                request
                    .choices
                    .iter()
                    .position(|c| c == line)
                    .ok_or_else(|| Error::picker(format!("picker returned an unknown choice: {line:?}")))
            })
            .collect()
    }
}

/// One picker line per choice, all distinct. Line breaks are flattened and
/// a choice repeating an earlier line gets its position appended, so
/// identical labels stay selectable individually.
fn distinct_lines<S: AsRef<str>>(choices: &[S]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(choices.len());
    let mut lines = Vec::with_capacity(choices.len());
    for (index, choice) in choices.iter().enumerate() {
        let line = choice.as_ref().replace(['\r', '\n'], " ");
        let mut candidate = line.clone();
        let mut position = index + 1;
        while seen.contains(&candidate) {
            candidate = format!("{line} [{position}]");
            position += 1;
        }
        seen.insert(candidate.clone());
        lines.push(candidate);
    }
    lines
}

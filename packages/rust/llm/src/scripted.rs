//! Canned-response model used as a test double.

use std::sync::Mutex;

use docaudit_shared::{DocAuditError, Result};

use crate::LanguageModel;

/// What a matching rule produces.
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// A [`LanguageModel`] that answers from a list of substring rules.
///
/// Rules are checked in insertion order; the first whose needle occurs in
/// the prompt wins. Prompts matching no rule get the fallback response.
/// Every prompt received is recorded and can be inspected with
/// [`ScriptedModel::prompts`].
#[derive(Debug)]
pub struct ScriptedModel {
    rules: Vec<(String, Reply)>,
    fallback: Reply,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Create a model whose fallback answer is `fallback`.
    pub fn new(fallback: &str) -> Self {
        Self {
            rules: Vec::new(),
            fallback: Reply::Text(fallback.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer `response` to prompts containing `needle`.
    pub fn respond_when(mut self, needle: &str, response: &str) -> Self {
        self.rules
            .push((needle.to_string(), Reply::Text(response.to_string())));
        self
    }

    /// Fail with `reason` for prompts containing `needle`.
    pub fn fail_when(mut self, needle: &str, reason: &str) -> Self {
        self.rules
            .push((needle.to_string(), Reply::Fail(reason.to_string())));
        self
    }

    /// All prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn reply_for(&self, prompt: &str) -> &Reply {
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback)
    }
}

impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match self.reply_for(prompt) {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(reason) => Err(DocAuditError::Model(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let model = ScriptedModel::new("fallback")
            .respond_when("typo", "first")
            .respond_when("typo", "second");
        assert_eq!(model.complete("find typo here").await.unwrap(), "first");
        assert_eq!(model.complete("something else").await.unwrap(), "fallback");
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn fail_rule_returns_model_error() {
        let model = ScriptedModel::new("ok").fail_when("boom", "connection reset");
        let err = model.complete("boom").await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(model.prompts(), vec!["boom".to_string()]);
    }
}

//! Language model access for docaudit.
//!
//! Everything above this crate talks to a model through the
//! [`LanguageModel`] trait: one prompt in, one free-text completion out.
//! [`OpenRouterClient`] implements it against any OpenAI-compatible
//! `chat/completions` endpoint; [`ScriptedModel`] is a canned-response
//! double used by the workflow and CLI tests.

mod openrouter;
mod scripted;

use std::future::Future;

use docaudit_shared::Result;

pub use openrouter::OpenRouterClient;
pub use scripted::ScriptedModel;

/// A text-completion backend.
///
/// Calls are awaited one at a time by the workflow; implementations do not
/// need to support concurrent use.
pub trait LanguageModel {
    /// Send `prompt` and return the model's raw textual response.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Substitute `{placeholder}` in a prompt template.
pub fn render_template(template: &str, placeholder: &str, value: &str) -> String {
    template.replace(&format!("{{{placeholder}}}"), value)
}

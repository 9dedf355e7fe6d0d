//! Natural-language to shell command translation.

use tracing::{debug, warn};

use super::client::LlmClient;
use super::{parser, prompt};
use crate::context::ContextStore;

/// Translate `query` into a single shell command.
///
/// Returns `None` when the model fails or answers with nothing usable.
pub async fn translate(llm: &dyn LlmClient, query: &str, context: &ContextStore) -> Option<String> {
    let request = prompt::translate_request(query, &context.render(), context.capacity());

    match llm.complete(request).await {
        Ok(response) => {
            debug!("Translation response for {:?}: {:?}", query, response);
            let command = parser::first_command_line(&response);
            (!command.is_empty()).then_some(command)
        }
        Err(e) => {
            warn!("Translation failed for {:?}: {:#}", query, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    #[tokio::test]
    async fn test_translate_cleans_answer() {
        let llm = ScriptedLlm::replying("```bash\nfind . -size +100M # large files\n```");
        let store = ContextStore::new(10);
        store.append("cd /srv", "Changed directory to: /srv");

        let command = translate(&llm, "find big files", &store).await;
        assert_eq!(command.as_deref(), Some("find . -size +100M"));

        let request = &llm.requests()[0];
        assert!(request.user.contains("Previous command: cd /srv"));
        assert!(request.system.contains("last 10 commands"));
    }

    #[tokio::test]
    async fn test_translate_empty_answer_is_none() {
        let llm = ScriptedLlm::replying("```\n```");
        assert_eq!(translate(&llm, "do nothing", &ContextStore::new(10)).await, None);
    }

    #[tokio::test]
    async fn test_translate_failure_is_none() {
        let llm = ScriptedLlm::failing("timed out");
        assert_eq!(translate(&llm, "list files", &ContextStore::new(10)).await, None);
    }
}

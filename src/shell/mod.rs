//! The interactive shell session.
//!
//! A [`Session`] owns everything one shell run needs: configuration, the
//! command context store, the model client, the guarded executor and the
//! optional suggestion engine. The REPL drives it one input at a time.

pub mod confirm;
pub mod executor;
pub mod process;
pub mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::info;

use crate::ai::client::{LlmClient, OpenAiClient, TimeoutClient};
use crate::ai::suggest::{SuggestionEngine, SuggestionSlot};
use crate::ai::translate::translate;
use crate::config::ShellConfig;
use crate::context::ContextStore;
use crate::security::ModelRiskAnalyzer;
use crate::troubleshoot::Troubleshooter;
use crate::wizard::{SetupWizard, WizardReport};
use confirm::Confirm;
use executor::GuardedExecutor;

pub struct Session {
    config: ShellConfig,
    context: ContextStore,
    llm: Arc<dyn LlmClient>,
    executor: GuardedExecutor,
    suggestions: Option<Arc<SuggestionEngine>>,
}

impl Session {
    /// Session backed by the configured OpenAI-compatible endpoint.
    pub fn new(config: ShellConfig) -> Self {
        let llm = Arc::new(TimeoutClient::new(
            OpenAiClient::new(&config),
            config.request_timeout,
        ));
        Self::with_client(config, llm)
    }

    pub fn with_client(config: ShellConfig, llm: Arc<dyn LlmClient>) -> Self {
        let context = ContextStore::new(config.context_limit);
        let analyzer = Arc::new(ModelRiskAnalyzer::new(Arc::clone(&llm), context.clone()));
        let executor = GuardedExecutor::new(context.clone(), analyzer);

        // Suggestions need a runtime to spawn fetches on.
        let suggestions = match (config.suggestions_enabled, Handle::try_current()) {
            (true, Ok(runtime)) => Some(Arc::new(SuggestionEngine::new(
                Arc::clone(&llm),
                SuggestionSlot::new(),
                config.suggestion_debounce,
                runtime,
            ))),
            _ => None,
        };

        info!(
            "Session ready: model={}, context_limit={}, suggestions={}",
            config.model,
            config.context_limit,
            suggestions.is_some()
        );

        Self {
            config,
            context,
            llm,
            executor,
            suggestions,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    pub fn suggestions(&self) -> Option<Arc<SuggestionEngine>> {
        self.suggestions.clone()
    }

    pub fn clear_suggestion(&self) {
        if let Some(engine) = &self.suggestions {
            engine.reset();
        }
    }

    pub async fn execute(&self, command: &str, confirm: &mut dyn Confirm) -> bool {
        self.executor.execute(command, confirm).await
    }

    /// Translate `query`, show the command and run it once approved.
    pub async fn translate_and_run(&self, query: &str, confirm: &mut dyn Confirm) -> bool {
        println!("Translating query...");
        let Some(command) = translate(self.llm.as_ref(), query, &self.context).await else {
            println!("Could not generate a command for your query. Please try rephrasing it.");
            return false;
        };

        println!("Suggested command: {}", command);
        if !confirm.confirm("Execute this command?") {
            return false;
        }
        self.executor.execute(&command, confirm).await
    }

    pub async fn setup(&self, request: &str, confirm: &mut dyn Confirm) -> WizardReport {
        SetupWizard::new(self.llm.as_ref(), &self.executor)
            .run(request, confirm)
            .await
    }

    /// Triage `error` against the project in the current directory.
    pub async fn troubleshoot(&self, error: &str, confirm: &mut dyn Confirm) -> bool {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Troubleshooter::new(self.llm.as_ref(), &self.executor, root)
            .run(error, confirm)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use crate::wizard::WizardState;
    use confirm::ScriptedConfirm;

    const SAFE: &str = r#"{"is_destructive": false, "reason": "prints text", "severity": "low", "category": "other"}"#;

    fn session(llm: Arc<ScriptedLlm>) -> Session {
        let config = ShellConfig {
            suggestions_enabled: false,
            ..ShellConfig::default()
        };
        Session::with_client(config, llm)
    }

    #[tokio::test]
    async fn test_translate_and_run() {
        let llm = Arc::new(ScriptedLlm::new([Ok("echo translated"), Ok(SAFE)]));
        let session = session(llm.clone());
        let mut confirm = ScriptedConfirm::new([true]);

        assert!(session.translate_and_run("say translated", &mut confirm).await);
        assert_eq!(session.context().recent(1)[0].command_line, "echo translated");
        assert_eq!(confirm.asked(), ["Execute this command?"]);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_translation_declined() {
        let llm = Arc::new(ScriptedLlm::replying("echo nope"));
        let session = session(llm.clone());

        assert!(!session.translate_and_run("say nope", &mut ScriptedConfirm::new([false])).await);
        assert!(session.context().is_empty());
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_translation_failure() {
        let llm = Arc::new(ScriptedLlm::failing("timed out"));
        let session = session(llm);
        let mut confirm = ScriptedConfirm::default();

        assert!(!session.translate_and_run("anything", &mut confirm).await);
        assert!(confirm.asked().is_empty());
    }

    #[tokio::test]
    async fn test_model_flags_command_as_destructive() {
        let llm = Arc::new(ScriptedLlm::replying(
            r#"{"is_destructive": true, "reason": "Stops containers", "severity": "high", "category": "service"}"#,
        ));
        let session = session(llm);
        let mut confirm = ScriptedConfirm::new([false]);

        assert!(!session.execute("echo pretend-docker-stop", &mut confirm).await);
        assert!(session.context().is_empty());
    }

    #[tokio::test]
    async fn test_setup_uses_context() {
        let llm = Arc::new(ScriptedLlm::new([
            Ok(SAFE),
            Ok(r#"[{"description": "Show", "operation": "command", "content": "echo setup"}]"#),
            Ok(SAFE),
        ]));
        let session = session(llm.clone());
        let mut confirm = ScriptedConfirm::new([true, true]);

        assert!(session.execute("echo first", &mut confirm).await);
        let report = session.setup("show something", &mut confirm).await;

        assert_eq!(report.state, WizardState::Completed);
        assert_eq!(report.steps_succeeded, 1);
        assert!(llm.requests()[1].user.contains("Previous command: echo first"));
        assert_eq!(session.context().len(), 2);
    }

    #[tokio::test]
    async fn test_suggestions_disabled_without_flag() {
        let session = session(Arc::new(ScriptedLlm::idle()));
        assert!(session.suggestions().is_none());
        session.clear_suggestion();
    }

    #[tokio::test]
    async fn test_suggestions_enabled_inside_runtime() {
        let session = Session::with_client(ShellConfig::default(), Arc::new(ScriptedLlm::idle()));
        assert!(session.suggestions().is_some());
    }
}

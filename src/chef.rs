use crate::conversation::{History, assemble_prompt};
use crate::llm::provider::{LlmProvider, LlmResult};
use crate::persona::PersonaBundle;

/// One conversation with the chef: a provider, the persona, and the
/// transcript that grows with every successful exchange.
pub struct ChefAssistant<P> {
    provider: P,
    persona: PersonaBundle,
    history: History,
}

impl<P: LlmProvider> ChefAssistant<P> {
    pub fn new(provider: P, persona: PersonaBundle) -> Self {
        Self::with_history(provider, persona, History::new())
    }

    pub fn with_history(provider: P, persona: PersonaBundle, history: History) -> Self {
        Self {
            provider,
            persona,
            history,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs one exchange. The transcript only changes when the provider
    /// returns a complete answer; a failed call leaves it as it was.
    pub async fn process_input(
        &mut self,
        user_input: &str,
        on_delta: &mut (dyn FnMut(&str) + Send),
    ) -> LlmResult<String> {
        let request = assemble_prompt(&self.persona, self.history.snapshot(), user_input);
        let text = self.provider.complete(&request, on_delta).await?;
        self.history.record_exchange(user_input, &text);
        Ok(text)
    }
}

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{EvolutionDraft, Product};

use super::GeneratorError;

/// Deterministic generator backend: serves a queue of canned drafts, then
/// derived fallbacks. No network, no credentials.
///
/// An optional artificial latency lets tests hold an evolution in flight
/// long enough to observe the engine's mutual exclusion.
#[derive(Default)]
pub struct ScriptedGenerator {
    drafts: Mutex<VecDeque<Result<EvolutionDraft, String>>>,
    latency: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a draft to serve on the next call.
    pub fn push(self, draft: EvolutionDraft) -> Self {
        self.drafts
            .lock()
            .expect("draft queue lock poisoned")
            .push_back(Ok(draft));
        self
    }

    /// Queue a backend failure to serve on the next call.
    pub fn push_failure(self, message: &str) -> Self {
        self.drafts
            .lock()
            .expect("draft queue lock poisoned")
            .push_back(Err(message.to_string()));
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(super) async fn propose(
        &self,
        product: &Product,
    ) -> Result<EvolutionDraft, GeneratorError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let queued = self
            .drafts
            .lock()
            .expect("draft queue lock poisoned")
            .pop_front();

        match queued {
            Some(Ok(draft)) => Ok(draft),
            Some(Err(message)) => Err(GeneratorError::Backend(message)),
            None => Ok(derived_draft(product)),
        }
    }
}

/// Fallback draft derived from the product itself, so an unprimed scripted
/// generator still yields a distinct, complete next version.
fn derived_draft(product: &Product) -> EvolutionDraft {
    let next = product.version + 1;
    EvolutionDraft {
        name: format!("{} Mk. {next}", product.name),
        tagline: format!("{} Now even more so.", product.tagline),
        description: format!(
            "{} This iteration adds one feature nobody asked for.",
            product.description
        ),
        ascii_art: product.ascii_art.clone(),
        evolution_note: format!("Iterated from version {}.", product.version),
    }
}

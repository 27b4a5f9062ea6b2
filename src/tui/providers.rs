// ── Model providers ──────────────────────────────────────────────────────────

/// One selectable entry of a provider's model catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub disabled: bool,
}

impl ModelDescriptor {
    const fn new(id: &'static str, label: &'static str) -> Self {
        Self { id, label, disabled: false }
    }

    const fn coming_soon(id: &'static str, label: &'static str) -> Self {
        Self { id, label, disabled: true }
    }
}

const OPENAI_MODELS: &[ModelDescriptor] = &[
    ModelDescriptor::new("openai:gpt-4o-mini", "GPT-4o-Mini"),
    ModelDescriptor::new("openai:gpt-4o", "GPT-4o"),
    ModelDescriptor::new("openai:gpt-4-turbo", "GPT-4-Turbo"),
    ModelDescriptor::new("openai:gpt-3.5-turbo", "GPT-3.5-Turbo"),
    ModelDescriptor::coming_soon("openai:gpt-5", "GPT-5 (coming soon)"),
];

const MISTRAL_MODELS: &[ModelDescriptor] = &[
    ModelDescriptor::new("mistral:open-mixtral-8x7b", "Mixtral 8×7B"),
    ModelDescriptor::new("mistral:open-mistral-7b", "Mistral 7B"),
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Provider {
    OpenAI,
    Mistral,
}

impl Provider {
    pub fn all() -> Vec<Provider> {
        vec![Provider::OpenAI, Provider::Mistral]
    }

    /// Name used on the command line and in the conversation state.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI  => "openai",
            Provider::Mistral => "mistral",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::OpenAI  => "OpenAI",
            Provider::Mistral => "Mistral AI",
        }
    }

    pub fn models(&self) -> &'static [ModelDescriptor] {
        match self {
            Provider::OpenAI  => OPENAI_MODELS,
            Provider::Mistral => MISTRAL_MODELS,
        }
    }

    pub fn from_name(name: &str) -> Option<Provider> {
        Provider::all().into_iter().find(|p| p.name() == name)
    }
}

/// Catalog lookup by provider name. Unknown providers have no models.
pub fn select_provider_models(provider: &str) -> &'static [ModelDescriptor] {
    Provider::from_name(provider).map(|p| p.models()).unwrap_or(&[])
}

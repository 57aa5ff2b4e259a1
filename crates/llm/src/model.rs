#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl Model {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

pub fn default_gemini_models() -> Vec<Model> {
    vec![
        Model::from_id(DEFAULT_GEMINI_MODEL).with_description("Fast conversational default"),
        Model::from_id("gemini-2.5-flash").with_description("Stable flash tier"),
        Model::from_id("gemini-2.5-pro").with_description("Higher quality, slower replies"),
    ]
}

/// Resolves a configured model name against the known catalog.
///
/// Unknown names are still accepted so newly released models work without a rebuild.
pub fn resolve_model(model_name: &str) -> Model {
    let model_name = model_name.trim();
    if model_name.is_empty() {
        return Model::from_id(DEFAULT_GEMINI_MODEL);
    }

    default_gemini_models()
        .into_iter()
        .find(|model| model.id == model_name)
        .unwrap_or_else(|| Model::from_id(model_name))
}

mod audit;
mod document;
mod extractor;
mod renderer;
mod resources;
mod synchronizer;
mod tag_path;

pub use self::audit::{
    outputs_with_empty_element, outputs_with_placeholder_resources, EmptyElementReport,
};
pub use self::document::{
    Currentness, FormName, GisiDocument, Progress, ResourceLocation, UpdateFrequency,
};
pub use self::extractor::SourceExtractor;
pub use self::renderer::{TemplateMissingContainer, TemplateRenderer};
pub use self::resources::ResourceCatalog;
pub use self::synchronizer::{
    element_name_from_document_name, element_text, element_texts, sanitize_narrative,
    update_element, CompletionMatcher, UpdateMode,
};
pub use self::tag_path::{local_name, TagPath};

use typed_builder::TypedBuilder;

/// The annotation context a resolution request is evaluated against.
///
/// Carries everything rule matching can look at: the annotated page URL,
/// the calling user (for tenant isolation), the annotation type, and its
/// tags. `priority` is the capture pipeline's urgency hint; it travels with
/// the annotation but no rule kind consumes it today.
#[derive(TypedBuilder, Clone, Debug, PartialEq)]
#[builder(field_defaults(setter(into)))]
pub struct Annotation {
    /// URL of the annotated page
    pub source_url: String,
    /// User on whose behalf resolution runs
    pub user_name: String,
    /// Annotation type, matched by `content_type` rules
    #[builder(default = String::from("comment"))]
    pub kind: String,
    /// Urgency hint from the capture pipeline
    #[builder(default)]
    pub priority: Option<i64>,
    /// Tags, matched by `tag_match` rules
    #[builder(default)]
    pub tags: Vec<String>,
}

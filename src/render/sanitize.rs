/// HTML sanitizer applied to every rendered document.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// ammonia's default allow-list plus `class` on the elements the
/// highlighter and error node use.
pub struct AmmoniaSanitizer {
    builder: ammonia::Builder<'static>,
}

impl AmmoniaSanitizer {
    pub fn new() -> Self {
        let mut builder = ammonia::Builder::default();
        builder
            .add_tag_attributes("pre", &["class"])
            .add_tag_attributes("code", &["class"])
            .add_tag_attributes("span", &["class"])
            .add_tag_attributes("div", &["class"]);
        Self { builder }
    }
}

impl Default for AmmoniaSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

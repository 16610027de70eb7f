//! HTML templates embedded in the binary

use crate::core::HubError;
use tera::{Context, Tera};

/// Template sources, registered under their file names
const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("templates/base.html")),
    ("table.html", include_str!("templates/table.html")),
    ("orders.html", include_str!("templates/orders.html")),
    ("search.html", include_str!("templates/search.html")),
    ("upload.html", include_str!("templates/upload.html")),
];

/// Compiled page templates
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Compile every embedded template
    pub fn new() -> Result<Self, HubError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    /// Render a page; `.html` templates are autoescaped
    pub fn render(&self, name: &str, context: &Context) -> Result<String, HubError> {
        Ok(self.tera.render(name, context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let templates = Templates::new().unwrap();
        let mut context = Context::new();
        context.insert("tab", "upload");
        context.insert("form", &serde_json::json!({}));
        context.insert("invalid", &serde_json::json!({}));
        context.insert("order_types", &["OPORD"]);
        context.insert("placeholder", "SELECT ONE");
        let html = templates.render("upload.html", &context).unwrap();
        assert!(html.contains("Upload New Order"));
    }

    #[test]
    fn test_values_are_escaped() {
        let templates = Templates::new().unwrap();
        let mut context = Context::new();
        context.insert("tab", "search");
        context.insert("query", &serde_json::json!({ "q": "<script>" }));
        context.insert("invalid", &serde_json::json!({}));
        context.insert("order_types", &["OPORD"]);
        let html = templates.render("search.html", &context).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}

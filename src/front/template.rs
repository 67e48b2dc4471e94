use std::{fs, path::Path, sync::Arc};

use anyhow::Context;
use axum::response::{Html, IntoResponse, Response};
use bigdecimal::BigDecimal;
use handlebars::handlebars_helper;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct Template {
    r: Arc<handlebars::Handlebars<'static>>,
}

handlebars_helper!(nor_amt: |v: Json| format_amount(v));
handlebars_helper!(status_class: |v: Json| status_css_class(v.as_str().unwrap_or_default()));

impl Template {
    /// Registers every file of `dir` under its file name (`index.hbs`, ...).
    pub fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut handlebars = handlebars::Handlebars::new();
        handlebars.set_strict_mode(false);

        for entity in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
            let entity = entity?;
            if !entity.metadata()?.is_file() {
                continue;
            }
            let name = entity.file_name().to_string_lossy().into_owned();
            handlebars
                .register_template_file(&name, entity.path())
                .with_context(|| format!("registering template {name}"))?;
            log::debug!("registered template {name}");
        }

        handlebars.register_helper("nor_amt", Box::new(nor_amt));
        handlebars.register_helper("status_class", Box::new(status_class));

        Ok(Self {
            r: Arc::new(handlebars),
        })
    }

    pub fn render<T>(&self, name: &str, data: &T) -> AppResult<Response>
    where
        T: Serialize,
    {
        log::trace!("render '{}'", name);
        let html = self.r.render(name, data)?;
        Ok(Html(html).into_response())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.r.has_template(name)
    }
}

/// Serializes `value` for an inline `<script>` block. `</` is escaped so the
/// payload cannot terminate the surrounding script element.
pub fn embed_json<T: Serialize>(value: &T) -> AppResult<String> {
    let json = serde_json::to_string(value).map_err(|err| AppError::Internal(err.to_string()))?;
    Ok(json.replace("</", "<\\/"))
}

fn format_amount(v: &Value) -> String {
    let raw = match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return String::new(),
    };
    match raw.parse::<BigDecimal>() {
        Ok(d) => d.round(2).with_scale(2).to_string(),
        Err(_) => raw,
    }
}

pub fn status_css_class(status: &str) -> &'static str {
    match status.to_lowercase().as_str() {
        "approved" | "paid" | "completed" | "posted" | "active" => "status-approved",
        "pending" => "status-pending",
        "rejected" => "status-rejected",
        "overdue" => "status-overdue",
        _ => "status-neutral",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn embedded_json_cannot_close_script() {
        let out = embed_json(&json!({ "message": "</script><script>alert(1)" })).unwrap();
        assert!(!out.contains("</script>"));
        assert!(out.contains("<\\/script>"));
    }

    #[rstest]
    #[case(json!("100000"), "100000.00")]
    #[case(json!("1234.567"), "1234.57")]
    #[case(json!(42), "42.00")]
    #[case(json!(null), "")]
    #[case(json!("n/a"), "n/a")]
    fn formats_amounts(#[case] input: Value, #[case] expected: &str) {
        assert_eq!(format_amount(&input), expected);
    }

    #[rstest]
    #[case("Approved", "status-approved")]
    #[case("Pending", "status-pending")]
    #[case("REJECTED", "status-rejected")]
    #[case("Overdue", "status-overdue")]
    #[case("Draft", "status-neutral")]
    fn status_classes(#[case] status: &str, #[case] expected: &str) {
        assert_eq!(status_css_class(status), expected);
    }

    #[test]
    fn loads_bundled_templates() {
        let t = Template::new("./src/front/templates").unwrap();
        for name in ["index.hbs", "login.hbs", "page.table.hbs", "base.notification.hbs"] {
            assert!(t.has_template(name), "missing {name}");
        }
    }
}

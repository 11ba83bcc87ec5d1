//! Element locators
//!
//! A locator names one element on the page. Each variant compiles to a
//! JavaScript expression that evaluates to the first matching element or
//! `null`. Text matching is substring-based, case-insensitive and
//! whitespace-normalised.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector (e.g. `.bank-container`)
    Css(String),
    /// Innermost element whose text contains the given text
    Text(String),
    /// Form control associated with a `<label>` containing the given text
    Label(String),
    /// Image whose `alt` attribute contains the given text
    AltText(String),
    /// Element with an ARIA role (explicit or implicit) and accessible name
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// CSS selector filtered to elements containing the given text
    CssWithText { css: String, has_text: String },
}

/// Shared helpers prepended to every query
const PRELUDE: &str = "const norm = s => (s || '').replace(/\\s+/g, ' ').trim().toLowerCase();";

/// Selectors for implicit ARIA roles, used by `Role` alongside `[role=...]`
fn implicit_role_selector(role: &str) -> Option<&'static str> {
    match role {
        "button" => Some("button, input[type=button], input[type=submit], input[type=reset]"),
        "link" => Some("a[href]"),
        "textbox" => Some("input:not([type]), input[type=text], input[type=email], input[type=number], textarea"),
        "checkbox" => Some("input[type=checkbox]"),
        "radio" => Some("input[type=radio]"),
        "heading" => Some("h1, h2, h3, h4, h5, h6"),
        "img" => Some("img[alt]"),
        _ => None,
    }
}

/// Encode a Rust string as a JavaScript string literal
fn js_str(value: &str) -> String {
    // JSON strings are valid JS string literals
    serde_json::Value::String(value.to_string()).to_string()
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::Label(text.into())
    }

    pub fn alt_text(text: impl Into<String>) -> Self {
        Self::AltText(text.into())
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
        }
    }

    pub fn css_with_text(css: impl Into<String>, has_text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            has_text: has_text.into(),
        }
    }

    /// JavaScript expression evaluating to the matching element or `null`
    pub fn to_query(&self) -> String {
        let body = match self {
            Self::Css(css) => format!("return document.querySelector({});", js_str(css)),
            Self::Text(text) => format!(
                "const t = norm({});
                 const hits = Array.from(document.querySelectorAll('body *'))
                     .filter(el => norm(el.textContent).includes(t));
                 return hits.find(el => !Array.from(el.children).some(c => norm(c.textContent).includes(t))) || null;",
                js_str(text)
            ),
            Self::Label(text) => format!(
                "const t = norm({});
                 const label = Array.from(document.querySelectorAll('label'))
                     .find(l => norm(l.textContent).includes(t));
                 if (label) {{
                     if (label.control) return label.control;
                     if (label.htmlFor) return document.getElementById(label.htmlFor);
                     return label.querySelector('input, textarea, select');
                 }}
                 return Array.from(document.querySelectorAll('[aria-label]'))
                     .find(el => norm(el.getAttribute('aria-label')).includes(t)) || null;",
                js_str(text)
            ),
            Self::AltText(text) => format!(
                "const t = norm({});
                 return Array.from(document.querySelectorAll('img[alt], [role=img][alt]'))
                     .find(el => norm(el.getAttribute('alt')).includes(t)) || null;",
                js_str(text)
            ),
            Self::Role { role, name } => {
                let mut selector = format!("[role={}]", js_str(role));
                if let Some(implicit) = implicit_role_selector(role) {
                    selector = format!("{selector}, {implicit}");
                }
                let filter = match name {
                    Some(name) => format!(
                        "const t = norm({});
                         return candidates.find(el => norm(el.getAttribute('aria-label') || el.textContent || el.value).includes(t)) || null;",
                        js_str(name)
                    ),
                    None => "return candidates[0] || null;".to_string(),
                };
                format!(
                    "const candidates = Array.from(document.querySelectorAll({}));
                     {filter}",
                    js_str(&selector)
                )
            }
            Self::CssWithText { css, has_text } => format!(
                "const t = norm({});
                 return Array.from(document.querySelectorAll({}))
                     .find(el => norm(el.textContent).includes(t)) || null;",
                js_str(has_text),
                js_str(css)
            ),
        };
        format!("(() => {{ {PRELUDE} {body} }})()")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css={css}"),
            Self::Text(text) => write!(f, "text={text:?}"),
            Self::Label(text) => write!(f, "label={text:?}"),
            Self::AltText(text) => write!(f, "alt={text:?}"),
            Self::Role { role, name: None } => write!(f, "role={role}"),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role={role}[name={name:?}]"),
            Self::CssWithText { css, has_text } => write!(f, "css={css} >> has-text={has_text:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(Locator::css(".bank-container").to_string(), "css=.bank-container");
        assert_eq!(Locator::text("Commit phase").to_string(), "text=\"Commit phase\"");
        assert_eq!(
            Locator::role("button", "Commit bet").to_string(),
            "role=button[name=\"Commit bet\"]"
        );
        assert_eq!(
            Locator::css_with_text("label", "YES").to_string(),
            "css=label >> has-text=\"YES\""
        );
    }

    #[test]
    fn test_query_escapes_quotes() {
        let query = Locator::css("input[name='it\"s']").to_query();
        assert!(query.contains(r#"document.querySelector("input[name='it\"s']")"#));
        assert!(query.starts_with("(() => {"));
        assert!(query.ends_with("})()"));
    }

    #[test]
    fn test_role_query_includes_implicit_selector() {
        let query = Locator::role("button", "Commit bet").to_query();
        assert!(query.contains("input[type=submit]"));
        assert!(query.contains("\"Commit bet\""));
    }

    #[test]
    fn test_unknown_role_uses_attribute_only() {
        let query = Locator::Role {
            role: "tab".to_string(),
            name: None,
        }
        .to_query();
        assert!(query.contains(r#"[role=\"tab\"]"#));
        assert!(query.contains("candidates[0]"));
    }

    fn from_yaml(yaml: &str) -> Locator {
        serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(yaml))
            .unwrap()
    }

    #[test]
    fn test_yaml_forms() {
        assert_eq!(
            from_yaml("css_with_text: { css: label, has_text: \"NO\" }"),
            Locator::css_with_text("label", "NO")
        );
        assert_eq!(
            from_yaml("role: { role: button, name: Commit bet }"),
            Locator::role("button", "Commit bet")
        );
        assert_eq!(
            from_yaml("alt_text: DNA Helix Background"),
            Locator::alt_text("DNA Helix Background")
        );
    }
}

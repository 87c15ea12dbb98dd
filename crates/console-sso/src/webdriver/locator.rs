// crates/console-sso/src/webdriver/locator.rs
// ============================================================================
// Module: Element Locators
// Description: Typed element locators and their W3C strategy mapping.
// Purpose: Describe page markers independently of the driver protocol.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! W3C WebDriver only defines the `css selector`, `link text`,
//! `partial link text`, `tag name`, and `xpath` strategies. Id and class
//! lookups are expressed as CSS selectors.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Element locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value")]
pub enum Locator {
    /// XPath expression.
    #[serde(rename = "xpath")]
    XPath(String),
    /// CSS selector.
    #[serde(rename = "css")]
    Css(String),
    /// Element id attribute.
    #[serde(rename = "id")]
    Id(String),
    /// Single class name.
    #[serde(rename = "class_name")]
    ClassName(String),
    /// Element tag name.
    #[serde(rename = "tag_name")]
    TagName(String),
}

impl Locator {
    /// Creates an XPath locator.
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::XPath(value.into())
    }

    /// Creates a CSS locator.
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    /// Creates an id locator.
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    /// Creates a class name locator.
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::ClassName(value.into())
    }

    /// Returns the W3C `(using, value)` pair.
    #[must_use]
    pub fn strategy(&self) -> (&'static str, String) {
        match self {
            Self::XPath(value) => ("xpath", value.clone()),
            Self::Css(value) => ("css selector", value.clone()),
            Self::Id(value) => ("css selector", format!("[id=\"{}\"]", escape_css(value))),
            Self::ClassName(value) => ("css selector", format!(".{}", escape_css_ident(value))),
            Self::TagName(value) => ("tag name", value.clone()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XPath(value) => write!(f, "xpath={value}"),
            Self::Css(value) => write!(f, "css={value}"),
            Self::Id(value) => write!(f, "id={value}"),
            Self::ClassName(value) => write!(f, "class={value}"),
            Self::TagName(value) => write!(f, "tag={value}"),
        }
    }
}

/// Escapes a value for use inside a double-quoted CSS attribute selector.
fn escape_css(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escapes characters that are not valid in a bare CSS identifier.
fn escape_css_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

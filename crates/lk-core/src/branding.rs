//! Branding references for colours and fonts.
//!
//! A paint or font field is either a literal value or a key into the active
//! brand kit. References are resolved once, when the effective style of an
//! element is requested.

use crate::model::{CanvasElement, Shape};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A literal value or a key into the branding table.
///
/// On the wire: `{ "fixed": "#FF0000" }` or `{ "branding": "primary" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandRef {
    Fixed(String),
    Branding(String),
}

/// The active brand kit: named colours and font families.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branding {
    #[serde(default)]
    pub colors: HashMap<String, String>,
    #[serde(default)]
    pub fonts: HashMap<String, String>,
}

impl Branding {
    pub fn resolve_color<'a>(&'a self, value: &'a BrandRef) -> Option<&'a str> {
        match value {
            BrandRef::Fixed(literal) => Some(literal.as_str()),
            BrandRef::Branding(key) => self.colors.get(key).map(String::as_str),
        }
    }

    pub fn resolve_font<'a>(&'a self, value: &'a BrandRef) -> Option<&'a str> {
        match value {
            BrandRef::Fixed(literal) => Some(literal.as_str()),
            BrandRef::Branding(key) => self.fonts.get(key).map(String::as_str),
        }
    }
}

/// An element's style with every branding reference replaced by its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub font_family: Option<String>,
}

/// Resolve an element's style against the brand kit. Unknown keys resolve to
/// `None` so the renderer falls back to its defaults.
pub fn resolve_style(element: &CanvasElement, branding: &Branding) -> ResolvedStyle {
    let style = &element.style;
    let font_family = match &element.shape {
        Shape::Text(text) => text
            .font_family
            .as_ref()
            .and_then(|f| branding.resolve_font(f))
            .map(str::to_owned),
        _ => None,
    };

    ResolvedStyle {
        fill: style
            .fill
            .as_ref()
            .and_then(|c| branding.resolve_color(c))
            .map(str::to_owned),
        stroke: style
            .stroke
            .as_ref()
            .and_then(|c| branding.resolve_color(c))
            .map(str::to_owned),
        stroke_width: style.stroke_width,
        font_family,
    }
}

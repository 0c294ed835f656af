//! Page structure extraction
//!
//! Turns page markup into the actionable record the decision prompt is built
//! from: links, buttons, forms and visible text.

mod html;

pub use html::HtmlExtractor;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlLink {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlButton {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlForm {
    pub id: String,
    pub text: String,
    /// Names (or ids, for unnamed fields) that `fill_form` can address.
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlText {
    pub id: Option<String>,
    pub text: String,
}

/// Everything one observation reports about the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub url: Option<String>,
    pub links: Vec<HtmlLink>,
    pub buttons: Vec<HtmlButton>,
    pub forms: Vec<HtmlForm>,
    pub texts: Vec<HtmlText>,
}

impl PageState {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
            && self.buttons.is_empty()
            && self.forms.is_empty()
            && self.texts.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

pub trait PageExtractor: Send + Sync {
    fn extract(&self, markup: &str, url: Option<&str>) -> Result<PageState, ExtractionError>;
}

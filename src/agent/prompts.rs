//! Decision prompt rendering
//!
//! Templates use `{name}` placeholders. Substitution happens in a single pass,
//! so page text that itself contains `{goal}` or braces is inserted verbatim
//! and never re-expanded. Unknown placeholders are left as written.

use std::fmt::Write as _;
use std::path::Path;

use crate::page_extractor::PageState;

const BUILTIN_TEMPLATE: &str = include_str!("../../prompts/select_action.md");

const NONE: &str = "(none)";

/// Values substituted into the template for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub goal: &'a str,
    pub task: &'a str,
    pub state: &'a PageState,
    /// One line per recent cycle, oldest first.
    pub history: &'a [String],
}

#[derive(Debug, Clone)]
pub struct DecisionPrompt {
    template: String,
}

impl Default for DecisionPrompt {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DecisionPrompt {
    pub fn builtin() -> Self {
        Self::new(BUILTIN_TEMPLATE)
    }

    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self, ctx: &PromptContext<'_>) -> String {
        let mut out = String::with_capacity(self.template.len() * 2);
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let replaced = after.find('}').and_then(|close| {
                let value = placeholder(&after[..close], ctx)?;
                Some((value, close))
            });

            match replaced {
                Some((value, close)) => {
                    out.push_str(&value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

fn placeholder(name: &str, ctx: &PromptContext<'_>) -> Option<String> {
    let value = match name {
        "goal" => ctx.goal.to_string(),
        "task" => ctx.task.to_string(),
        "url" => ctx.state.url.clone().unwrap_or_else(|| "an unknown page".to_string()),
        "links" => links(ctx.state),
        "buttons" => buttons(ctx.state),
        "forms" => forms(ctx.state),
        "text" => text(ctx.state),
        "history" => history(ctx.history),
        _ => return None,
    };
    Some(value)
}

fn or_none(rendered: String) -> String {
    if rendered.is_empty() {
        NONE.to_string()
    } else {
        rendered
    }
}

fn links(state: &PageState) -> String {
    let mut out = String::new();
    for link in &state.links {
        let _ = writeln!(out, "- {} -> {}", display_text(&link.text), link.url);
    }
    or_none(out.trim_end().to_string())
}

fn buttons(state: &PageState) -> String {
    let mut out = String::new();
    for button in &state.buttons {
        let _ = writeln!(out, "- id: {}, text: {}", button.id, display_text(&button.text));
    }
    or_none(out.trim_end().to_string())
}

fn forms(state: &PageState) -> String {
    let mut out = String::new();
    for form in &state.forms {
        let fields = if form.fields.is_empty() {
            NONE.to_string()
        } else {
            form.fields.join(", ")
        };
        let _ = writeln!(
            out,
            "- id: {}, fields: {}, text: {}",
            form.id,
            fields,
            display_text(&form.text)
        );
    }
    or_none(out.trim_end().to_string())
}

fn text(state: &PageState) -> String {
    let mut out = String::new();
    for fragment in &state.texts {
        match &fragment.id {
            Some(id) => {
                let _ = writeln!(out, "- [{}] {}", id, fragment.text);
            }
            None => {
                let _ = writeln!(out, "- {}", fragment.text);
            }
        }
    }
    or_none(out.trim_end().to_string())
}

fn history(lines: &[String]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, line);
    }
    if out.is_empty() {
        "Nothing yet.".to_string()
    } else {
        out.trim_end().to_string()
    }
}

fn display_text(text: &str) -> &str {
    if text.is_empty() { "(no text)" } else { text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_extractor::{HtmlButton, HtmlForm, HtmlLink, HtmlText};

    fn state() -> PageState {
        PageState {
            url: Some("https://shop.test/".into()),
            links: vec![HtmlLink {
                url: "/cart".into(),
                text: "Cart".into(),
            }],
            buttons: vec![HtmlButton {
                id: "buy".into(),
                text: String::new(),
            }],
            forms: vec![HtmlForm {
                id: "search".into(),
                text: "Search".into(),
                fields: vec!["q".into()],
            }],
            texts: vec![
                HtmlText {
                    id: Some("title".into()),
                    text: "Books".into(),
                },
                HtmlText {
                    id: None,
                    text: "Use {goal} braces".into(),
                },
            ],
        }
    }

    #[test]
    fn builtin_template_mentions_every_section() {
        let template = DecisionPrompt::builtin();
        for name in ["{goal}", "{task}", "{url}", "{links}", "{buttons}", "{forms}", "{text}", "{history}"] {
            assert!(template.template().contains(name), "missing {name}");
        }
    }

    #[test]
    fn renders_page_state_sections() {
        let prompt = DecisionPrompt::new("{url}\n{links}\n{buttons}\n{forms}\n{text}");
        let state = state();
        let rendered = prompt.render(&PromptContext {
            goal: "g",
            task: "t",
            state: &state,
            history: &[],
        });

        assert_eq!(
            rendered,
            "https://shop.test/\n\
             - Cart -> /cart\n\
             - id: buy, text: (no text)\n\
             - id: search, fields: q, text: Search\n\
             - [title] Books\n\
             - Use {goal} braces"
        );
    }

    #[test]
    fn substitution_is_single_pass() {
        let prompt = DecisionPrompt::new("{task}|{goal}|{unknown}|{");
        let state = PageState::default();
        let rendered = prompt.render(&PromptContext {
            goal: "buy {task}",
            task: "{goal}",
            state: &state,
            history: &[],
        });
        assert_eq!(rendered, "{goal}|buy {task}|{unknown}|{");
    }

    #[test]
    fn empty_sections_say_so() {
        let prompt = DecisionPrompt::new("{links}/{history}/{url}");
        let state = PageState::default();
        let rendered = prompt.render(&PromptContext {
            goal: "",
            task: "",
            state: &state,
            history: &[],
        });
        assert_eq!(rendered, "(none)/Nothing yet./an unknown page");

        let history = vec!["click_button succeeded".to_string(), "decision rejected: x".to_string()];
        let rendered = DecisionPrompt::new("{history}").render(&PromptContext {
            goal: "",
            task: "",
            state: &state,
            history: &history,
        });
        assert_eq!(rendered, "1. click_button succeeded\n2. decision rejected: x");
    }
}

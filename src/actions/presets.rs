//! Named constructors for the agent's fixed set of action kinds

use std::fmt;
use std::sync::Arc;

use super::entry::{ActionCallback, ActionEntry};
use super::parameter::{Parameter, ParameterKind};

/// The closed set of action kinds the agent knows how to execute.
///
/// Each preset fixes a name, description and parameter list; binding it to a
/// callback yields an [`ActionEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionPreset {
    ClickButton,
    ClickLink,
    FillForm,
    SubmitForm,
    NavigateToUrl,
    AskUser,
    WriteToFile,
    FinishTask,
    AbandonTask,
}

impl ActionPreset {
    /// Page and environment actions, in schema order.
    pub const BROWSING: &'static [ActionPreset] = &[
        ActionPreset::ClickButton,
        ActionPreset::ClickLink,
        ActionPreset::FillForm,
        ActionPreset::SubmitForm,
        ActionPreset::NavigateToUrl,
        ActionPreset::AskUser,
        ActionPreset::WriteToFile,
    ];

    /// Actions that let the model end the run explicitly.
    pub const TERMINATION: &'static [ActionPreset] =
        &[ActionPreset::FinishTask, ActionPreset::AbandonTask];

    pub fn name(self) -> &'static str {
        match self {
            ActionPreset::ClickButton => "click_button",
            ActionPreset::ClickLink => "click_link",
            ActionPreset::FillForm => "fill_form",
            ActionPreset::SubmitForm => "submit_form",
            ActionPreset::NavigateToUrl => "navigate_to_url",
            ActionPreset::AskUser => "ask_user",
            ActionPreset::WriteToFile => "write_to_file",
            ActionPreset::FinishTask => "finish_task",
            ActionPreset::AbandonTask => "abandon_task",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::BROWSING
            .iter()
            .chain(Self::TERMINATION)
            .copied()
            .find(|preset| preset.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ActionPreset::ClickButton => "Clicks a button on the page",
            ActionPreset::ClickLink => "Clicks a link on the page",
            ActionPreset::FillForm => "Fills a form on the page",
            ActionPreset::SubmitForm => "Submits a form on the page",
            ActionPreset::NavigateToUrl => "Navigates to a url",
            ActionPreset::AskUser => "Asks the user a question",
            ActionPreset::WriteToFile => "Writes to a file",
            ActionPreset::FinishTask => {
                "Declares the goal achieved and stops the agent"
            }
            ActionPreset::AbandonTask => {
                "Gives up on the goal when it cannot be achieved from here"
            }
        }
    }

    pub fn parameters(self) -> Vec<Parameter> {
        match self {
            ActionPreset::ClickButton => vec![Parameter::required(
                "button_id",
                ParameterKind::String,
                "The id of the button to click",
            )],
            ActionPreset::ClickLink => vec![Parameter::required(
                "link_id",
                ParameterKind::String,
                "The id or url of the link to click",
            )],
            ActionPreset::FillForm => vec![
                Parameter::required("form_id", ParameterKind::String, "The id of the form to fill"),
                Parameter::required(
                    "data",
                    ParameterKind::Object,
                    "The data to fill the form with, keyed by field name",
                ),
            ],
            ActionPreset::SubmitForm => vec![Parameter::required(
                "form_id",
                ParameterKind::String,
                "The id of the form to submit",
            )],
            ActionPreset::NavigateToUrl => vec![Parameter::required(
                "url",
                ParameterKind::String,
                "The url to navigate to",
            )],
            ActionPreset::AskUser => vec![Parameter::required(
                "question",
                ParameterKind::String,
                "The question to ask the user",
            )],
            ActionPreset::WriteToFile => vec![
                Parameter::required("file_path", ParameterKind::String, "The path to the file to write to"),
                Parameter::required("data", ParameterKind::String, "The data to write to the file"),
            ],
            ActionPreset::FinishTask => vec![Parameter::required(
                "summary",
                ParameterKind::String,
                "What was accomplished",
            )],
            ActionPreset::AbandonTask => vec![Parameter::required(
                "reason",
                ParameterKind::String,
                "Why the goal cannot be achieved",
            )],
        }
    }

    /// Instantiate this preset with the given callback.
    pub fn entry(self, callback: Arc<dyn ActionCallback>) -> ActionEntry {
        ActionEntry::from_parts(self.name(), self.description(), self.parameters(), callback)
    }
}

impl fmt::Display for ActionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::entry::tests::SpyCallback;
    use serde_json::json;

    #[test]
    fn names_round_trip() {
        for preset in ActionPreset::BROWSING.iter().chain(ActionPreset::TERMINATION) {
            assert_eq!(ActionPreset::from_name(preset.name()), Some(*preset));
        }
        assert_eq!(ActionPreset::from_name("click"), None);
    }

    #[test]
    fn presets_match_declared_parameters() {
        let entry = ActionPreset::WriteToFile.entry(Arc::new(SpyCallback::default()));
        assert_eq!(entry.name(), "write_to_file");
        let names: Vec<&str> = entry.parameters().iter().map(Parameter::name).collect();
        assert_eq!(names, vec!["file_path", "data"]);
        assert!(entry.parameters().iter().all(Parameter::is_required));
    }

    #[test]
    fn navigate_preset_binds_url() {
        let entry = ActionPreset::NavigateToUrl.entry(Arc::new(SpyCallback::default()));
        let bound = entry.bind(json!({"url": "https://example.com"})).unwrap();
        assert_eq!(bound.arguments().str("url").unwrap(), "https://example.com");
    }
}

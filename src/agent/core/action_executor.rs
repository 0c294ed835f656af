use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::config::TerminationPolicy;
use super::processor::AgentInner;
use crate::actions::{
    ActionArguments, ActionCallback, ActionCatalog, ActionError, ActionOutcome, ActionPreset,
    CatalogError, DecisionResult, Resolution, dispatch,
};
use crate::agent::{ActionResult, CycleOutcome};
use crate::browser::BrowserDriver;
use crate::utils::UserPrompter;

/// Action execution implementation
impl AgentInner {
    /// Resolve the decision against the catalog and run it.
    ///
    /// Never fails: rejected decisions and failed actions are reported in the
    /// returned outcome and the loop carries on.
    pub(super) async fn act(&self, decision: DecisionResult) -> CycleOutcome {
        let bound = match dispatch(decision, &self.catalog) {
            Ok(Resolution::Invoke(bound)) => bound,
            Ok(Resolution::Speak(text)) => {
                info!(text = %text, "Model replied without selecting an action");
                return CycleOutcome::Spoke { text };
            }
            Err(e) => {
                warn!(error = %e, "Rejected model decision");
                return CycleOutcome::Rejected {
                    error: e.to_string(),
                };
            }
        };

        let action = bound.action().to_string();
        info!(action = %action, arguments = ?bound.arguments(), "Executing action");

        match bound.invoke().await {
            Ok(ActionOutcome::Continue { note }) => CycleOutcome::Executed(ActionResult {
                action,
                success: true,
                extracted_content: note,
                error: None,
            }),
            Ok(ActionOutcome::Finished { summary }) => CycleOutcome::Finished { summary },
            Ok(ActionOutcome::Abandoned { reason }) => CycleOutcome::Abandoned { reason },
            Err(e) => {
                warn!(action = %action, error = %e, "Action failed");
                CycleOutcome::Executed(ActionResult {
                    action,
                    success: false,
                    extracted_content: None,
                    error: Some(e.to_string()),
                })
            }
        }
    }
}

/// Build the catalog the agent offers the model, with callbacks bound to the
/// given collaborators.
///
/// `finish_task` / `abandon_task` are included when the policy's
/// `completion_actions` is set.
pub fn build_catalog(
    driver: Arc<dyn BrowserDriver>,
    prompter: Arc<dyn UserPrompter>,
    output_dir: impl Into<PathBuf>,
    policy: &TerminationPolicy,
) -> Result<ActionCatalog, CatalogError> {
    let output_dir = output_dir.into();

    let mut presets = ActionPreset::BROWSING.to_vec();
    if policy.completion_actions {
        presets.extend_from_slice(ActionPreset::TERMINATION);
    }

    ActionCatalog::from_presets(&presets, |preset| -> Arc<dyn ActionCallback> {
        match preset {
            ActionPreset::ClickButton => Arc::new(BrowserCallback::new(driver.clone(), BrowserOp::ClickButton)),
            ActionPreset::ClickLink => Arc::new(BrowserCallback::new(driver.clone(), BrowserOp::ClickLink)),
            ActionPreset::FillForm => Arc::new(BrowserCallback::new(driver.clone(), BrowserOp::FillForm)),
            ActionPreset::SubmitForm => Arc::new(BrowserCallback::new(driver.clone(), BrowserOp::SubmitForm)),
            ActionPreset::NavigateToUrl => Arc::new(BrowserCallback::new(driver.clone(), BrowserOp::Navigate)),
            ActionPreset::AskUser => Arc::new(AskUserCallback::new(prompter.clone())),
            ActionPreset::WriteToFile => Arc::new(WriteFileCallback::new(output_dir.clone())),
            ActionPreset::FinishTask => Arc::new(TerminationCallback::Finish),
            ActionPreset::AbandonTask => Arc::new(TerminationCallback::Abandon),
        }
    })
}

/// Page operation performed by a [`BrowserCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserOp {
    ClickButton,
    ClickLink,
    FillForm,
    SubmitForm,
    Navigate,
}

/// Runs one page operation through the driver.
pub struct BrowserCallback {
    driver: Arc<dyn BrowserDriver>,
    op: BrowserOp,
}

impl BrowserCallback {
    pub fn new(driver: Arc<dyn BrowserDriver>, op: BrowserOp) -> Self {
        Self { driver, op }
    }
}

#[async_trait]
impl ActionCallback for BrowserCallback {
    async fn invoke(&self, arguments: &ActionArguments) -> Result<ActionOutcome, ActionError> {
        let note = match self.op {
            BrowserOp::ClickButton => {
                let id = arguments.str("button_id")?;
                self.driver.click_button(id).await?;
                format!("clicked button {id}")
            }
            BrowserOp::ClickLink => {
                let id = arguments.str("link_id")?;
                self.driver.click_link(id).await?;
                format!("followed link {id}")
            }
            BrowserOp::FillForm => {
                let form_id = arguments.str("form_id")?;
                let data = arguments.object("data")?;
                self.driver.fill_form(form_id, data).await?;
                format!("filled {} field(s) of form {form_id}", data.len())
            }
            BrowserOp::SubmitForm => {
                let form_id = arguments.str("form_id")?;
                self.driver.submit_form(form_id).await?;
                format!("submitted form {form_id}")
            }
            BrowserOp::Navigate => {
                let url = arguments.str("url")?;
                self.driver.navigate(url).await?;
                format!("navigated to {url}")
            }
        };
        Ok(ActionOutcome::noted(note))
    }
}

/// Puts the model's question to the operator; the answer is shown to the
/// model on the next cycle.
pub struct AskUserCallback {
    prompter: Arc<dyn UserPrompter>,
}

impl AskUserCallback {
    pub fn new(prompter: Arc<dyn UserPrompter>) -> Self {
        Self { prompter }
    }
}

#[async_trait]
impl ActionCallback for AskUserCallback {
    async fn invoke(&self, arguments: &ActionArguments) -> Result<ActionOutcome, ActionError> {
        let question = arguments.str("question")?;
        let answer = self.prompter.ask(question).await?;
        Ok(ActionOutcome::noted(format!("user answered: {answer}")))
    }
}

/// Writes files under a fixed output directory.
pub struct WriteFileCallback {
    output_dir: PathBuf,
}

impl WriteFileCallback {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Only plain relative paths are accepted; anything that could leave the
    /// output directory is refused.
    fn resolve(&self, file_path: &str) -> Result<PathBuf, ActionError> {
        let relative = Path::new(file_path);
        let mut has_name = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => has_name = true,
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ActionError::PathOutsideOutputDir(file_path.to_string()));
                }
            }
        }
        if !has_name {
            return Err(ActionError::PathOutsideOutputDir(file_path.to_string()));
        }
        Ok(self.output_dir.join(relative))
    }

    /// Create the target's parent directories, then refuse the write if a
    /// symlink resolves it outside the output directory.
    async fn confine(&self, path: &Path, file_path: &str) -> Result<(), ActionError> {
        let outside = || ActionError::PathOutsideOutputDir(file_path.to_string());

        let parent = path.parent().ok_or_else(outside)?;
        tokio::fs::create_dir_all(parent).await?;

        let root = tokio::fs::canonicalize(&self.output_dir).await?;
        let real_parent = tokio::fs::canonicalize(parent).await?;
        if !real_parent.starts_with(&root) {
            return Err(outside());
        }

        match tokio::fs::symlink_metadata(path).await {
            Ok(meta) if meta.file_type().is_symlink() => Err(outside()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ActionCallback for WriteFileCallback {
    async fn invoke(&self, arguments: &ActionArguments) -> Result<ActionOutcome, ActionError> {
        let file_path = arguments.str("file_path")?;
        let path = self.resolve(file_path)?;
        let data = arguments.str("data")?;

        self.confine(&path, file_path).await?;
        tokio::fs::write(&path, data).await?;

        info!(path = %path.display(), bytes = data.len(), "Wrote file");
        Ok(ActionOutcome::noted(format!(
            "wrote {} bytes to {}",
            data.len(),
            path.display()
        )))
    }
}

/// Lets the model end the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCallback {
    Finish,
    Abandon,
}

#[async_trait]
impl ActionCallback for TerminationCallback {
    async fn invoke(&self, arguments: &ActionArguments) -> Result<ActionOutcome, ActionError> {
        Ok(match self {
            TerminationCallback::Finish => ActionOutcome::Finished {
                summary: arguments.str("summary")?.to_string(),
            },
            TerminationCallback::Abandon => ActionOutcome::Abandoned {
                reason: arguments.str("reason")?.to_string(),
            },
        })
    }
}

//! Asking the human operator a question mid-run

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::actions::ActionError;

/// Source of answers for the `ask_user` action.
#[async_trait]
pub trait UserPrompter: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, ActionError>;
}

/// Prints the question to stdout and reads one line from stdin.
pub struct StdinPrompter {
    stdin: Mutex<BufReader<tokio::io::Stdin>>,
}

impl StdinPrompter {
    pub fn new() -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for StdinPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserPrompter for StdinPrompter {
    async fn ask(&self, question: &str) -> Result<String, ActionError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("{question}\n> ").as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        let read = self.stdin.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Err(ActionError::UserInput("stdin closed".to_string()));
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

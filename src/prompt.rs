//! Interactive console input.

use dialoguer::Input;

use crate::error::Result;

/// Line-oriented console interaction.
pub trait Prompt {
    /// Show a message to the user.
    fn notice(&mut self, message: &str);

    /// Ask a question and return the raw answer line.
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Prompt on the attached terminal.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn notice(&mut self, message: &str) {
        println!("{}", message);
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }
}

// src/prompt.rs

use std::{
    collections::VecDeque,
    io::{self, BufRead, Write},
};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// The operator, as seen by the pipeline: something that answers questions
/// and reads messages.
pub trait ConfirmationProvider {
    /// Ask a free-text question and return the raw answer.
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Print a message for the operator.
    fn notify(&mut self, message: &str);

    /// Only `yes` (any case, surrounding whitespace ignored) counts as consent.
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} (yes/no): "))?;
        Ok(answer.trim().eq_ignore_ascii_case("yes"))
    }
}

/// Interactive stdin/stdout operator.
pub struct StdinPrompt<R = io::StdinLock<'static>, W = io::Stdout> {
    input: R,
    output: W,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> StdinPrompt<R, W> {
    pub fn with_io(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ConfirmationProvider for StdinPrompt<R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}").map_err(PipelineError::Prompt)?;
        self.output.flush().map_err(PipelineError::Prompt)?;

        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .map_err(PipelineError::Prompt)?;
        if n == 0 {
            return Err(PipelineError::Prompt(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed",
            )));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn notify(&mut self, message: &str) {
        if let Err(e) = writeln!(self.output, "{message}").and_then(|_| self.output.flush()) {
            debug!(error = %e, "could not show message to operator");
        }
    }
}

/// Answers from a fixed script; records everything it was told.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub questions: Vec<String>,
    pub messages: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

impl ConfirmationProvider for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.questions.push(question.to_string());
        let answer = self.answers.pop_front().ok_or_else(|| {
            PipelineError::Prompt(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no scripted answer for: {question}"),
            ))
        })?;
        debug!(question, answer = %answer, "scripted answer");
        Ok(answer)
    }

    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

use std::collections::VecDeque;

use anyhow::Result;

use crate::selection::Prompter;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Answer {
    Text(&'static str),
    Yes,
    No,
    Quit,
}

/// Replays a fixed script and records every prompt it was shown.
pub(crate) struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub(crate) prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub(crate) fn new(answers: &[Answer]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            prompts: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(Answer::Text(s)) => Ok(Some(s.to_string())),
            Some(Answer::Quit) | None => Ok(None),
            Some(other) => panic!("expected text answer for {prompt:?}, got {other:?}"),
        }
    }

    fn confirm(&mut self, prompt: &str) -> Result<Option<bool>> {
        self.prompts.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(Answer::Yes) => Ok(Some(true)),
            Some(Answer::No) => Ok(Some(false)),
            Some(Answer::Quit) | None => Ok(None),
            Some(other) => panic!("expected yes/no for {prompt:?}, got {other:?}"),
        }
    }
}

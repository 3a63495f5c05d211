use std::io::{self, BufRead, Write};

use anyhow::Result;

use supper_core::selection::Prompter;

/// Line-based prompter: questions go to `output`, answers come from `input`.
///
/// `q`, `quit` or end of input abort the run.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") || answer.eq_ignore_ascii_case("quit") {
            return Ok(None);
        }
        Ok(Some(answer.to_string()))
    }
}

impl LinePrompter<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "\n{prompt}: ")?;
        self.output.flush()?;
        self.read_answer()
    }

    fn confirm(&mut self, prompt: &str) -> Result<Option<bool>> {
        loop {
            write!(self.output, "\n{prompt} [y/n]: ")?;
            self.output.flush()?;
            let Some(answer) = self.read_answer()? else {
                return Ok(None);
            };
            match answer.to_lowercase().as_str() {
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => writeln!(self.output, "Please answer y or n (q to quit).")?,
            }
        }
    }
}

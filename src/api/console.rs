//! 终端交互：是/否确认和键盘说明

use std::io::{self, BufRead, Write};

use crate::core::driver::Prompt;
use crate::core::error::Result;
use crate::core::session::KEYBOARD_MANUAL;

const YES: [&str; 4] = ["y", "yes", "yup", "aha"];
const NO: [&str; 4] = ["n", "no", "nope", "nein"];

/// 解析回答；无法识别时返回 None
pub fn parse_answer(answer: &str) -> Option<bool> {
    let answer = answer.trim().to_lowercase();
    if YES.contains(&answer.as_str()) {
        Some(true)
    } else if NO.contains(&answer.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// 在终端上反复提问直到得到可识别的回答
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for ConsolePrompt<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        loop {
            write!(self.output, "{} [y/n] ", question)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                // 输入结束视为否
                return Ok(false);
            }
            if let Some(answer) = parse_answer(&line) {
                return Ok(answer);
            }
            writeln!(self.output, "Please answer yes or no.")?;
        }
    }
}

pub fn print_manual() {
    println!("{}", KEYBOARD_MANUAL);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("Yes\n"), Some(true));
        assert_eq!(parse_answer(" aha "), Some(true));
        assert_eq!(parse_answer("NEIN"), Some(false));
        assert_eq!(parse_answer("maybe"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn test_prompt_repeats_until_understood() {
        let mut output = Vec::new();
        let mut prompt = ConsolePrompt::new(&b"perhaps\nnope\n"[..], &mut output);

        assert!(!prompt.confirm("Store as FILE NOT FOUND?").unwrap());
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Store as FILE NOT FOUND? [y/n]").count(), 2);
        assert!(text.contains("Please answer yes or no."));
    }

    #[test]
    fn test_closed_input_declines() {
        let mut prompt = ConsolePrompt::new(&b""[..], Vec::new());
        assert!(!prompt.confirm("Continue?").unwrap());
    }
}

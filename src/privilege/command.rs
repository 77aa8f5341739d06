//! Shell command construction for the elevated channel
//!
//! `ShellCommand` is the only way to produce text for the channel. Template
//! tokens are `&'static str` and go in verbatim; anything that came from
//! outside the program (config text, paths from settings) enters through
//! `arg`/`redirect_to`, which always single-quote it.

use std::fmt;

use crate::constants::paths;

/// Quote `value` so a POSIX shell reads it as exactly one literal word
///
/// `foo'bar` becomes `'foo'\''bar'`.
pub fn shell_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: &'static str,
    script: String,
}

impl ShellCommand {
    pub fn program(name: &'static str) -> Self {
        Self {
            program: name,
            script: name.to_string(),
        }
    }

    /// Append a literal token such as a flag or mode
    pub fn token(mut self, token: &'static str) -> Self {
        self.script.push(' ');
        self.script.push_str(token);
        self
    }

    /// Append an untrusted value as a single quoted word
    pub fn arg(mut self, value: &str) -> Self {
        self.script.push(' ');
        self.script.push_str(&shell_quote(value));
        self
    }

    pub fn redirect_to(mut self, path: &str) -> Self {
        self.script.push_str(" > ");
        self.script.push_str(&shell_quote(path));
        self
    }

    pub fn discard_stderr(mut self) -> Self {
        self.script.push_str(" 2>");
        self.script.push_str(paths::DEV_NULL);
        self
    }

    /// Run `next` only when this command succeeds
    pub fn and_then(mut self, next: ShellCommand) -> Self {
        self.script.push_str(" && ");
        self.script.push_str(&next.script);
        self
    }

    /// Leading program; the rest of the script may carry file contents
    pub fn program_name(&self) -> &'static str {
        self.program
    }

    pub fn as_str(&self) -> &str {
        &self.script
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.script)
    }
}

//! Chat rendering over injectable input and output streams.

use std::io::{IsTerminal, Write};

use colored::{ColoredString, Colorize};
use indicatif::ProgressBar;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sidekick_core::error::SidekickError;
use sidekick_core::error::helpers::{format_summary, summarize_error};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use super::spinner::create_spinner;

/// Width used when the terminal size is unknown
pub const DEFAULT_WIDTH: usize = 80;

const MAX_TOOL_ARGS_CHARS: usize = 200;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[ \t]*([\w+#.-]*)[^\n]*\n(.*?)^[ \t]*```[ \t]*$")
        .expect("valid regex")
});

/// Part of an assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Code { language: String, code: String },
}

/// Split Markdown text into prose and fenced code blocks. An unclosed fence stays prose.
pub fn split_fenced_blocks(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in FENCE_RE.captures_iter(text) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let before = text[last..whole.start()].trim_matches('\n');
        if !before.trim().is_empty() {
            segments.push(Segment::Text(before.to_string()));
        }
        segments.push(Segment::Code {
            language: caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            code: code.as_str().trim_end_matches('\n').to_string(),
        });
        last = whole.end();
    }

    let rest = text[last..].trim_matches('\n');
    if !rest.trim().is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    segments
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_WIDTH)
}

pub struct Console {
    input: Box<dyn AsyncBufRead + Unpin + Send>,
    output: Box<dyn Write + Send>,
    color: bool,
    /// Attached to a terminal: clear-screen and spinner are enabled
    interactive: bool,
    width: usize,
    spinner: Option<ProgressBar>,
}

impl Console {
    /// Console over the process stdin/stdout.
    pub fn stdio(color: bool) -> Self {
        let stdout = std::io::stdout();
        let interactive = stdout.is_terminal();
        Self {
            input: Box::new(BufReader::new(tokio::io::stdin())),
            output: Box::new(stdout),
            color,
            interactive,
            width: terminal_width(),
            spinner: None,
        }
    }

    /// Plain, non-interactive console over arbitrary streams.
    pub fn new(
        input: impl AsyncBufRead + Unpin + Send + 'static,
        output: impl Write + Send + 'static,
    ) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            color: false,
            interactive: false,
            width: DEFAULT_WIDTH,
            spinner: None,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(20);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn emit(&mut self, text: &str) {
        let output = &mut self.output;
        let mut write = || -> std::io::Result<()> {
            writeln!(output, "{text}")?;
            output.flush()
        };
        let result = match &self.spinner {
            Some(spinner) => spinner.suspend(write),
            None => write(),
        };
        if let Err(e) = result {
            debug!(error = %e, "Failed to write to console");
        }
    }

    fn wrap(&self, text: &str) -> String {
        text.lines()
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    textwrap::fill(line, self.width)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render an assistant reply; fenced code blocks go through `print_code`.
    pub fn print_assistant_response(&mut self, text: &str) {
        let label = self.paint("Assistant:", |s| s.bold().green());
        self.emit(&label);
        for segment in split_fenced_blocks(text) {
            match segment {
                Segment::Text(prose) => {
                    let wrapped = self.wrap(&prose);
                    self.emit(&wrapped);
                }
                Segment::Code { language, code } => self.print_code(&code, &language),
            }
        }
    }

    pub fn print_system_message(&mut self, text: &str) {
        let painted = self.paint(text, |s| s.yellow());
        self.emit(&painted);
    }

    pub fn print_code(&mut self, code: &str, language: &str) {
        let header = if language.is_empty() {
            "[code]".to_string()
        } else {
            format!("[{language}]")
        };
        let header = self.paint(&header, |s| s.dimmed());
        self.emit(&header);
        for line in code.lines() {
            let painted = self.paint(&format!("    {line}"), |s| s.cyan());
            self.emit(&painted);
        }
    }

    pub fn clear_screen(&mut self) {
        if self.interactive {
            let output = &mut self.output;
            let result = write!(output, "\x1B[2J\x1B[1;1H").and_then(|_| output.flush());
            if let Err(e) = result {
                debug!(error = %e, "Failed to clear screen");
            }
        }
    }

    pub fn print_welcome_message(&mut self) {
        let title = format!("Sidekick v{}", env!("CARGO_PKG_VERSION"));
        let title = self.paint(&title, |s| s.bold().cyan());
        self.emit(&title);
        self.emit("Chat with your assistant. Type a message and press Enter.");
        self.print_help();
    }

    pub fn print_help(&mut self) {
        self.emit("Commands:");
        self.emit("  exit, quit  End the session");
        self.emit("  reset       Start a new conversation thread");
        self.emit("  help        Show this help");
    }

    pub fn print_divider(&mut self) {
        let rule = "─".repeat(self.width);
        let rule = self.paint(&rule, |s| s.dimmed());
        self.emit(&rule);
    }

    /// Prompt and read one line; `None` at end of input.
    pub async fn get_user_input(&mut self) -> Option<String> {
        let prompt = self.paint("You: ", |s| s.bold().blue());
        let result = write!(self.output, "{prompt}").and_then(|_| self.output.flush());
        if let Err(e) = result {
            debug!(error = %e, "Failed to write prompt");
        }

        let mut line = String::new();
        match self.input.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                debug!(error = %e, "Failed to read input");
                None
            }
        }
    }

    pub fn print_tool_usage(&mut self, name: &str, arguments: &Value) {
        let mut line = format!("Using tool: {name}");
        let has_args = match arguments {
            Value::Object(map) => !map.is_empty(),
            Value::Null => false,
            _ => true,
        };
        if has_args {
            let args = arguments.to_string();
            let mut shown: String = args.chars().take(MAX_TOOL_ARGS_CHARS).collect();
            if shown.len() < args.len() {
                shown.push_str("...");
            }
            line.push(' ');
            line.push_str(&shown);
        }
        let painted = self.paint(&line, |s| s.magenta());
        self.emit(&painted);
    }

    pub fn print_error(&mut self, error: &SidekickError, verbose: bool) {
        let headline = self.paint(&format!("Error: {error}"), |s| s.red().bold());
        self.emit(&headline);
        let summary = format_summary(&summarize_error(error), verbose);
        for line in summary.lines() {
            let painted = self.paint(line, |s| s.dimmed());
            self.emit(&painted);
        }
    }

    /// Show a spinner until `stop_spinner`; a no-op when not attached to a terminal.
    pub fn start_spinner(&mut self, message: &str) {
        if self.interactive && self.spinner.is_none() {
            self.spinner = Some(create_spinner(message));
        }
    }

    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("color", &self.color)
            .field("interactive", &self.interactive)
            .field("width", &self.width)
            .finish()
    }
}

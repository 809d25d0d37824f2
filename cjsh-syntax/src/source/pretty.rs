// This file is part of cjsh, a POSIX-compatible interactive shell.
// Copyright (C) 2025 Caden Finley
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Structured diagnostics
//!
//! Errors from any stage of the shell become a [`Report`]: severity,
//! category, a stable code string, a title, source annotations with
//! column spans, and an optional suggestion. Rendering goes through
//! `annotate-snippets` so the offending line is shown with the span
//! underlined.

use super::Location;
use annotate_snippets::{Level, Renderer, Snippet};

/// How serious a diagnostic is
///
/// Warnings and infos do not change `$?`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Which stage of the pipeline produced a diagnostic
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Category {
    Lexical,
    Syntax,
    Expansion,
    Redirection,
    Command,
    Runtime,
}

impl Category {
    /// Component name shown in front of rendered messages.
    #[must_use]
    pub fn component(self) -> &'static str {
        match self {
            Category::Lexical => "lexer",
            Category::Syntax => "parser",
            Category::Expansion => "expansion",
            Category::Redirection => "redirection",
            Category::Command => "command",
            Category::Runtime => "runtime",
        }
    }
}

/// Source span with a label
#[derive(Clone, Debug)]
pub struct Annotation {
    /// Label explaining the role of the span
    pub label: String,
    /// Span in the source code
    pub location: Location,
}

/// Complete diagnostic ready for rendering
#[derive(Clone, Debug)]
pub struct Report {
    /// Severity of the diagnostic
    pub severity: Severity,
    /// Producing stage
    pub category: Category,
    /// Stable code such as `SYN001`
    pub code: &'static str,
    /// One-line description
    pub title: String,
    /// Primary annotation, underlined in the rendering
    pub annotation: Annotation,
    /// Secondary annotations (e.g. the span of a matching opener)
    pub related: Vec<Annotation>,
    /// Optional "did you mean" text
    pub suggestion: Option<String>,
}

/// Maximum rendered width of a context line before truncation
const MAX_CONTEXT: usize = 120;

/// Internal placeholder bytes that must never reach the terminal
fn is_sentinel(c: char) -> bool {
    matches!(c, '\u{1}' | '\u{2}')
}

/// Extracted single-line context for one annotation
struct LineContext {
    text: String,
    line_number: u64,
    span: std::ops::Range<usize>,
}

/// Cuts the line containing the annotation span out of its code
/// fragment, strips sentinel bytes, and truncates long lines with `…`
/// while keeping the span visible.
fn line_context(location: &Location) -> LineContext {
    let (line_number, column_start, column_end) = location.line_column();
    let value = &location.code.value;

    // Find the char range of the spanned line.
    let mut line_start = 0;
    let mut current = location.code.start_line_number.get();
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    while current < line_number && i < chars.len() {
        if chars[i] == '\n' {
            current += 1;
            line_start = i + 1;
        }
        i += 1;
    }
    let line_end = chars[line_start..]
        .iter()
        .position(|&c| c == '\n')
        .map_or(chars.len(), |n| line_start + n);

    let mut line: Vec<char> = chars[line_start..line_end]
        .iter()
        .copied()
        .filter(|&c| !is_sentinel(c))
        .collect();
    let mut start = (column_start - 1).min(line.len());
    let mut end = (column_end - 1).clamp(start + 1, line.len().max(start + 1));

    if line.len() > MAX_CONTEXT {
        // Keep the span roughly centered in the visible window.
        let window = MAX_CONTEXT - 2;
        let mut from = start.saturating_sub(window / 2);
        if from + window < end {
            from = end.saturating_sub(window);
        }
        let to = (from + window).min(line.len());
        let mut truncated = Vec::with_capacity(window + 2);
        if from > 0 {
            truncated.push('…');
        }
        truncated.extend_from_slice(&line[from..to]);
        if to < line.len() {
            truncated.push('…');
        }
        let offset = if from > 0 { 1 } else { 0 };
        start = start.saturating_sub(from) + offset;
        end = (end.saturating_sub(from) + offset).clamp(start + 1, truncated.len().max(start + 1));
        line = truncated;
    }

    // annotate-snippets spans are byte-based.
    let byte_of = |char_index: usize| -> usize {
        line.iter().take(char_index).map(|c| c.len_utf8()).sum()
    };
    let span = byte_of(start)..byte_of(end);
    LineContext {
        text: line.into_iter().collect(),
        line_number,
        span,
    }
}

impl Severity {
    fn level(self) -> Level {
        match self {
            Severity::Critical | Severity::Error => Level::Error,
            Severity::Warning => Level::Warning,
            Severity::Info => Level::Info,
        }
    }
}

impl Report {
    /// Renders this report to a string, without trailing newline.
    #[must_use]
    pub fn render(&self) -> String {
        let title = format!("{}: {} [{}]", self.category.component(), self.title, self.code);
        let contexts: Vec<(LineContext, String, String)> =
            std::iter::once(&self.annotation)
                .chain(&self.related)
                .map(|a| {
                    (
                        line_context(&a.location),
                        a.label.clone(),
                        a.location.code.source.label(),
                    )
                })
                .collect();

        let mut message = self.severity.level().title(&title);
        for (context, label, origin) in &contexts {
            let end = context.span.end.min(context.text.len());
            let start = context.span.start.min(end);
            message = message.snippet(
                Snippet::source(&context.text)
                    .line_start(context.line_number as usize)
                    .origin(origin)
                    .annotation(self.severity.level().span(start..end).label(label)),
            );
        }
        if let Some(suggestion) = &self.suggestion {
            message = message.footer(Level::Help.title(suggestion));
        }
        // Snippet borrows from `contexts`; render before it drops.
        let rendered = Renderer::plain().render(message).to_string();
        rendered
    }
}

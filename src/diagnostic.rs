use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn line_content(source: &str, line_num: usize) -> &str {
    source
        .split('\n')
        .nth(line_num - 1)
        .unwrap_or("")
        .trim_end_matches('\r')
}

pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();

        let severity = match diagnostic.severity {
            Severity::Error => self.paint("1;31", "error"),
            Severity::Warning => self.paint("1;33", "warning"),
        };
        match &diagnostic.code {
            Some(code) => out.push_str(&format!(
                "{}[{}]: {}\n",
                severity,
                code,
                self.paint("1", &diagnostic.message)
            )),
            None => out.push_str(&format!(
                "{}: {}\n",
                severity,
                self.paint("1", &diagnostic.message)
            )),
        }

        if let Some(label) = diagnostic.labels.iter().find(|l| !l.span.is_dummy()) {
            let (line, col) = line_col(self.source, label.span.start);
            out.push_str(&format!(
                "  {} {}:{}:{}\n",
                self.paint("34", "-->"),
                self.file_name,
                line,
                col
            ));
        }

        for label in &diagnostic.labels {
            if label.span.is_dummy() {
                continue;
            }
            self.render_label(&mut out, label);
        }

        for note in &diagnostic.notes {
            out.push_str(&format!("  {} {}\n", self.paint("34", "="), note));
        }

        out
    }

    fn render_label(&self, out: &mut String, label: &Label) {
        let (line, col) = line_col(self.source, label.span.start);
        let content = line_content(self.source, line);
        let gutter_width = line.to_string().len();

        // Clamp the underline to the first line the span touches.
        let width = (label.span.end.saturating_sub(label.span.start))
            .max(1)
            .min(content.len().saturating_sub(col - 1).max(1));

        let (mark, color) = match label.style {
            LabelStyle::Primary => ("^", "31"),
            LabelStyle::Secondary => ("-", "34"),
        };
        let underline = format!("{}{}", " ".repeat(col - 1), mark.repeat(width));

        out.push_str(&format!(
            "{} {}\n",
            " ".repeat(gutter_width + 1),
            self.paint("34", "|")
        ));
        out.push_str(&format!(
            "{} {} {}\n",
            self.paint("34", &format!(" {}", line)),
            self.paint("34", "|"),
            content
        ));
        out.push_str(&format!(
            "{} {} {}",
            " ".repeat(gutter_width + 1),
            self.paint("34", "|"),
            self.paint(color, &underline)
        ));
        if !label.message.is_empty() {
            out.push(' ');
            out.push_str(&self.paint(color, &label.message));
        }
        out.push('\n');
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }
}

pub fn render_diagnostics(
    source: &str,
    file_name: &str,
    diagnostics: &[Diagnostic],
    use_color: bool,
) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut out = String::new();
    for diagnostic in diagnostics {
        out.push_str(&renderer.render(diagnostic));
        out.push('\n');
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if errors > 0 {
        out.push_str(&format!(
            "error: aborting due to {} error{}\n",
            errors,
            if errors == 1 { "" } else { "s" }
        ));
    }

    out
}

use owo_colors::OwoColorize;
use std::fmt;

/// A 1-based line/column location in Betty source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Placeholder for errors raised away from any syntax node.
    pub fn unknown() -> Self {
        Self { line: 0, column: 0 }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A label pointing at a source position.
#[derive(Debug, Clone)]
pub struct Label {
    pub position: Position,
    pub message: String,
}

impl Label {
    pub fn primary(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
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

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }

}

fn source_line(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line.checked_sub(1)?)
}

/// Renders diagnostics in a rustc-like layout.
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
        let mut output = String::new();
        self.render_header(&mut output, diagnostic);

        let mut labels: Vec<&Label> = diagnostic
            .labels
            .iter()
            .filter(|l| !l.position.is_unknown())
            .collect();
        labels.sort_by_key(|l| l.position);

        if let Some(first) = labels.first() {
            output.push_str(&format!(
                "  {} {}:{}\n",
                self.blue("-->"),
                self.file_name,
                first.position
            ));

            let width = labels
                .iter()
                .map(|l| l.position.line.to_string().len())
                .max()
                .unwrap_or(1);
            let gutter = " ".repeat(width + 1);
            output.push_str(&format!("{} {}\n", gutter, self.blue("|")));

            for label in &labels {
                let Some(content) = source_line(self.source, label.position.line) else {
                    continue;
                };
                output.push_str(&format!(
                    "{:>width$} {} {}\n",
                    self.blue(&label.position.line.to_string()),
                    self.blue("|"),
                    content,
                    width = width + 1
                ));

                let padding = " ".repeat(label.position.column.saturating_sub(1));
                let underline = if label.message.is_empty() {
                    "^".to_string()
                } else {
                    format!("^ {}", label.message)
                };
                output.push_str(&format!(
                    "{} {} {}{}\n",
                    gutter,
                    self.blue("|"),
                    padding,
                    self.red(&underline)
                ));
            }

            output.push_str(&format!("{} {}\n", gutter, self.blue("|")));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.blue("="), note));
        }

        output
    }

    fn render_header(&self, output: &mut String, diagnostic: &Diagnostic) {
        let severity = self.red_bold("error");
        match &diagnostic.code {
            Some(code) => output.push_str(&format!(
                "{}[{}]: {}\n",
                severity,
                code,
                self.bold(&diagnostic.message)
            )),
            None => output.push_str(&format!("{}: {}\n", severity, self.bold(&diagnostic.message))),
        }
    }

    fn red(&self, s: &str) -> String {
        if self.use_color { s.red().to_string() } else { s.to_string() }
    }

    fn red_bold(&self, s: &str) -> String {
        if self.use_color { s.red().bold().to_string() } else { s.to_string() }
    }

    fn blue(&self, s: &str) -> String {
        if self.use_color { s.blue().to_string() } else { s.to_string() }
    }

    fn bold(&self, s: &str) -> String {
        if self.use_color { s.bold().to_string() } else { s.to_string() }
    }
}

/// Render a batch of diagnostics followed by an abort summary.
pub fn render_diagnostics(
    source: &str,
    file_name: &str,
    diagnostics: &[Diagnostic],
    use_color: bool,
) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut output = String::new();

    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
        output.push('\n');
    }

    let errors = diagnostics.len();
    if errors > 0 {
        output.push_str(&format!(
            "error: aborting due to {} error{}\n",
            errors,
            if errors == 1 { "" } else { "s" }
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_position() {
        assert!(Position::unknown().is_unknown());
        assert!(!Position::new(1, 1).is_unknown());
    }

    #[test]
    fn test_diagnostic_rendering() {
        let source = "func main() {\n    x = ;\n}\n";
        let diagnostic = Diagnostic::error("Unexpected token ';'")
            .with_code("E0101")
            .with_label(Label::primary(Position::new(2, 9), "expected expression"))
            .with_help("provide a value after `=`");

        let output = DiagnosticRenderer::new(source, "script.bt", false).render(&diagnostic);

        assert!(output.contains("error[E0101]: Unexpected token ';'"));
        assert!(output.contains("script.bt:2:9"));
        assert!(output.contains("    x = ;"));
        assert!(output.contains("        ^ expected expression"));
        assert!(output.contains("help: provide a value"));
    }

    #[test]
    fn test_unknown_positions_render_header_only() {
        let diagnostic = Diagnostic::error("No main function found.")
            .with_label(Label::primary(Position::unknown(), ""));
        let output = DiagnosticRenderer::new("", "script.bt", false).render(&diagnostic);
        assert_eq!(output, "error: No main function found.\n");
    }

    #[test]
    fn test_summary_counts_errors() {
        let diags = vec![Diagnostic::error("a"), Diagnostic::error("b")];
        let output = render_diagnostics("", "input", &diags, false);
        assert!(output.ends_with("error: aborting due to 2 errors\n"));
    }
}

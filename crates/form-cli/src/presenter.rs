use form_spec::{Issue, Severity, SubmitOutcome, ValidationReport};

/// Controls how much the CLI prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: results only.
    Clean,
    /// Verbose output: also error codes and the fields that passed.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Formats command results for the terminal.
pub struct Presenter {
    verbosity: Verbosity,
}

impl Presenter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn issues(&self, issues: &[Issue]) -> String {
        if issues.is_empty() {
            return "No issues found.".to_string();
        }
        let mut lines = Vec::new();
        for issue in issues {
            let level = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            match &issue.field {
                Some(field) => lines.push(format!("{level}: {field}: {}", issue.message)),
                None => lines.push(format!("{level}: {}", issue.message)),
            }
        }
        lines.join("\n")
    }

    pub fn report(&self, report: &ValidationReport, fields: &[String]) -> String {
        let mut lines = vec![format!(
            "Validation result: {}",
            if report.valid { "valid" } else { "invalid" }
        )];
        if !report.errors.is_empty() {
            lines.push("Errors:".to_string());
            for (name, error) in &report.errors {
                if self.verbosity.is_verbose() {
                    lines.push(format!("  {} - {} [{}]", name, error.message, error.code));
                } else {
                    lines.push(format!("  {} - {}", name, error.message));
                }
            }
        }
        if self.verbosity.is_verbose() {
            let passed: Vec<&str> = fields
                .iter()
                .map(String::as_str)
                .filter(|name| !report.errors.contains_key(*name))
                .collect();
            if !passed.is_empty() {
                lines.push(format!("Passed: {}", passed.join(", ")));
            }
        }
        lines.join("\n")
    }

    pub fn outcome(&self, outcome: &SubmitOutcome, fields: &[String]) -> String {
        match outcome {
            SubmitOutcome::Ignored => "Submission ignored: the form is disabled or busy.".to_string(),
            SubmitOutcome::Invalid(report) => self.report(report, fields),
            SubmitOutcome::Succeeded => "Submitted.".to_string(),
            SubmitOutcome::Failed(message) => format!("Submission failed: {message}"),
        }
    }
}

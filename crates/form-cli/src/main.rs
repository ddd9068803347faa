mod input;
mod presenter;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use form_spec::{
    EndpointSpec, Form, FormSpec, HttpMethod, Severity, SubmissionData, SubmitError,
    SubmitHandler, SubmitOutcome, check, render_json_ui, render_text, validate_all, values_json,
};
use input::{FileArg, apply_files, apply_values, load_spec, parse_header};
use presenter::{Presenter, Verbosity};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Form definition CLI",
    long_about = "Checks, validates, renders and submits JSON form definitions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MethodArg {
    Post,
    Put,
    Patch,
}

impl From<MethodArg> for HttpMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Post => HttpMethod::Post,
            MethodArg::Put => HttpMethod::Put,
            MethodArg::Patch => HttpMethod::Patch,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Report configuration mistakes in a form definition.
    Check {
        /// Path to the form definition JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
    /// Validate a set of values against a form definition.
    Validate {
        /// Path to the form definition JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// JSON object mapping field names to values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Attach a file to a field: field=path[:media/type].
        #[arg(long = "file", value_name = "FIELD=PATH")]
        files: Vec<FileArg>,
        /// Also print error codes and the fields that passed.
        #[arg(long)]
        verbose: bool,
    },
    /// Render the form the way a presentation layer would receive it.
    Render {
        /// Path to the form definition JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// JSON object mapping field names to values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Mark every field touched so validation errors are shown.
        #[arg(long)]
        touch_all: bool,
        /// Output format.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Validate and submit values, printing what the submission produced.
    Submit {
        /// Path to the form definition JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// JSON object mapping field names to values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Attach a file to a field: field=path[:media/type].
        #[arg(long = "file", value_name = "FIELD=PATH")]
        files: Vec<FileArg>,
        /// Send to this URL instead of the endpoint in the definition.
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
        /// HTTP method for the endpoint.
        #[arg(long, value_enum)]
        method: Option<MethodArg>,
        /// Extra request header: NAME=VALUE.
        #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
        headers: Vec<(String, String)>,
        /// Request timeout in seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Also print error codes and the fields that passed.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the JSON schema of form definitions.
    Schema,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Check { spec } => run_check(spec),
        Command::Validate {
            spec,
            values,
            files,
            verbose,
        } => run_validate(spec, values, files, verbose).await,
        Command::Render {
            spec,
            values,
            touch_all,
            format,
        } => run_render(spec, values, touch_all, format),
        Command::Submit {
            spec,
            values,
            files,
            endpoint,
            method,
            headers,
            timeout,
            verbose,
        } => {
            let overrides = EndpointOverrides {
                url: endpoint,
                method,
                headers,
                timeout,
            };
            run_submit(spec, values, files, overrides, verbose).await
        }
        Command::Schema => run_schema(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_check(spec_path: PathBuf) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    let issues = check(&spec);
    println!("{}", Presenter::new(Verbosity::Clean).issues(&issues));
    if issues.iter().any(|issue| issue.severity == Severity::Error) {
        Err("form definition has errors".into())
    } else {
        Ok(())
    }
}

async fn load_form(
    spec_path: &Path,
    values: Option<&Path>,
    files: &[FileArg],
) -> CliResult<Form> {
    let mut form = Form::new(load_spec(spec_path)?)?;
    if let Some(values) = values {
        apply_values(&mut form, values)?;
    }
    apply_files(&mut form, files).await?;
    Ok(form)
}

fn field_names(spec: &FormSpec) -> Vec<String> {
    spec.fields.iter().map(|field| field.name.clone()).collect()
}

async fn run_validate(
    spec_path: PathBuf,
    values: Option<PathBuf>,
    files: Vec<FileArg>,
    verbose: bool,
) -> CliResult<()> {
    let form = load_form(&spec_path, values.as_deref(), &files).await?;
    let report = validate_all(form.spec(), form.state().values());
    let presenter = Presenter::new(Verbosity::from_verbose(verbose));
    println!("{}", presenter.report(&report, &field_names(form.spec())));
    if report.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_render(
    spec_path: PathBuf,
    values: Option<PathBuf>,
    touch_all: bool,
    format: RenderMode,
) -> CliResult<()> {
    let mut form = Form::new(load_spec(&spec_path)?)?;
    if let Some(values) = &values {
        apply_values(&mut form, values)?;
    }
    if touch_all {
        for name in field_names(form.spec()) {
            form.blur(&name)?;
        }
    }
    let view = form.view();
    match format {
        RenderMode::Text => println!("{}", render_text(&view)),
        RenderMode::Json => println!("{}", serde_json::to_string_pretty(&render_json_ui(&view))?),
    }
    Ok(())
}

struct EndpointOverrides {
    url: Option<String>,
    method: Option<MethodArg>,
    headers: Vec<(String, String)>,
    timeout: Option<u64>,
}

impl EndpointOverrides {
    fn apply(self, spec: &mut FormSpec) -> CliResult<()> {
        let endpoint = match (self.url, spec.settings.endpoint.take()) {
            (Some(url), Some(mut existing)) => {
                existing.url = url;
                Some(existing)
            }
            (Some(url), None) => Some(EndpointSpec::new(url)),
            (None, existing) => existing,
        };
        let Some(mut endpoint) = endpoint else {
            if self.method.is_some() || !self.headers.is_empty() || self.timeout.is_some() {
                return Err("--method, --header and --timeout need an endpoint".into());
            }
            return Ok(());
        };
        if let Some(method) = self.method {
            endpoint.method = method.into();
        }
        endpoint.headers.extend(self.headers);
        if self.timeout.is_some() {
            endpoint.timeout_secs = self.timeout;
        }
        spec.settings.endpoint = Some(endpoint);
        Ok(())
    }
}

/// Prints whatever the submission produced to stdout.
struct StdoutHandler;

#[async_trait]
impl SubmitHandler for StdoutHandler {
    async fn submit(&self, data: SubmissionData) -> Result<(), SubmitError> {
        let document = match data {
            SubmissionData::Local(values) => values_json(&values),
            SubmissionData::Remote(response) => response,
        };
        print_json(&document).map_err(|err| SubmitError::handler(err.to_string()))
    }
}

fn print_json(document: &Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(document)?);
    Ok(())
}

async fn run_submit(
    spec_path: PathBuf,
    values: Option<PathBuf>,
    files: Vec<FileArg>,
    overrides: EndpointOverrides,
    verbose: bool,
) -> CliResult<()> {
    let mut spec = load_spec(&spec_path)?;
    overrides.apply(&mut spec)?;
    let fields = field_names(&spec);

    let mut form = Form::new(spec)?.with_handler(StdoutHandler);
    if let Some(values) = &values {
        apply_values(&mut form, values)?;
    }
    apply_files(&mut form, &files).await?;

    let outcome = form.submit().await;
    let presenter = Presenter::new(Verbosity::from_verbose(verbose));
    match outcome {
        SubmitOutcome::Succeeded => {
            if let Some(banner) = form.state().banner() {
                eprintln!("{}", banner.text);
            }
            Ok(())
        }
        other => {
            eprintln!("{}", presenter.outcome(&other, &fields));
            Err("submission did not succeed".into())
        }
    }
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(FormSpec);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use serde_json::json;

    fn signup_spec() -> Value {
        json!({
            "id": "signup",
            "title": "Sign up",
            "fields": [
                { "name": "email", "type": "email", "label": "Email",
                  "validation": { "required": true, "validationType": "email" } },
                { "name": "plan", "type": "select", "defaultValue": "free",
                  "options": [{ "label": "Free", "value": "free" }, { "label": "Pro", "value": "pro" }] },
                { "name": "seats", "type": "number",
                  "dependsOn": { "field": "plan", "value": "pro" },
                  "validation": { "min": 1, "max": 50 } },
                { "name": "logo", "type": "file", "accept": "image/*" }
            ]
        })
    }

    fn write_json(dir: &assert_fs::TempDir, name: &str, value: &Value) -> PathBuf {
        let file = dir.child(name);
        file.write_str(&value.to_string()).expect("write fixture");
        file.path().to_path_buf()
    }

    fn formctl() -> Command {
        Command::cargo_bin("formctl").expect("binary")
    }

    #[test]
    fn overrides_create_endpoint() {
        let mut spec: FormSpec = serde_json::from_value(signup_spec()).unwrap();
        EndpointOverrides {
            url: Some("http://localhost:9/hook".into()),
            method: Some(MethodArg::Put),
            headers: vec![("X-Token".into(), "abc".into())],
            timeout: Some(5),
        }
        .apply(&mut spec)
        .unwrap();
        let endpoint = spec.settings.endpoint.unwrap();
        assert_eq!(endpoint.url, "http://localhost:9/hook");
        assert_eq!(endpoint.method, HttpMethod::Put);
        assert_eq!(endpoint.headers["X-Token"], "abc");
        assert_eq!(endpoint.timeout_secs, Some(5));
    }

    #[test]
    fn overrides_without_endpoint_are_rejected() {
        let mut spec: FormSpec = serde_json::from_value(signup_spec()).unwrap();
        let result = EndpointOverrides {
            url: None,
            method: Some(MethodArg::Patch),
            headers: Vec::new(),
            timeout: None,
        }
        .apply(&mut spec);
        assert!(result.is_err());
    }

    #[test]
    fn check_reports_clean_definition() {
        let dir = assert_fs::TempDir::new().unwrap();
        let spec = write_json(&dir, "form.json", &signup_spec());
        let output = formctl()
            .arg("check")
            .arg("--spec")
            .arg(&spec)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(String::from_utf8_lossy(&output).trim(), "No issues found.");
    }

    #[test]
    fn check_fails_on_unknown_match_target() {
        let dir = assert_fs::TempDir::new().unwrap();
        let spec = write_json(
            &dir,
            "form.json",
            &json!({
                "id": "broken",
                "fields": [{ "name": "confirm", "type": "password", "validation": { "matches": "password" } }]
            }),
        );
        let output = formctl()
            .arg("check")
            .arg("--spec")
            .arg(&spec)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        assert!(
            String::from_utf8_lossy(&output)
                .contains("error: confirm: matches refers to unknown field 'password'")
        );
    }

    #[test]
    fn validate_prints_field_errors() {
        let dir = assert_fs::TempDir::new().unwrap();
        let spec = write_json(&dir, "form.json", &signup_spec());
        let values = write_json(
            &dir,
            "values.json",
            &json!({ "email": "nope", "plan": "pro", "seats": 99 }),
        );
        let output = formctl()
            .args(["validate", "--spec"])
            .arg(&spec)
            .arg("--values")
            .arg(&values)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        let text = String::from_utf8_lossy(&output);
        assert!(text.contains("Validation result: invalid"));
        assert!(text.contains("  email - Invalid email format"));
        assert!(text.contains("  seats - Maximum value is 50"));
    }

    #[test]
    fn validate_rejects_unknown_fields() {
        let dir = assert_fs::TempDir::new().unwrap();
        let spec = write_json(&dir, "form.json", &signup_spec());
        let values = write_json(&dir, "values.json", &json!({ "nickname": "x" }));
        formctl()
            .args(["validate", "--spec"])
            .arg(&spec)
            .arg("--values")
            .arg(&values)
            .assert()
            .failure();
    }

    #[test]
    fn validate_checks_attached_file_types() {
        let dir = assert_fs::TempDir::new().unwrap();
        let spec = write_json(&dir, "form.json", &signup_spec());
        let values = write_json(&dir, "values.json", &json!({ "email": "a@b.co" }));
        let doc = dir.child("notes.txt");
        doc.write_str("hello").unwrap();
        let output = formctl()
            .args(["validate", "--spec"])
            .arg(&spec)
            .arg("--values")
            .arg(&values)
            .arg("--file")
            .arg(format!("logo={}:text/plain", doc.path().display()))
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        assert!(String::from_utf8_lossy(&output).contains("  logo - "));
    }

    #[test]
    fn render_json_hides_dependent_field() {
        let dir = assert_fs::TempDir::new().unwrap();
        let spec = write_json(&dir, "form.json", &signup_spec());
        let output = formctl()
            .args(["render", "--format", "json", "--spec"])
            .arg(&spec)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let ui: Value = serde_json::from_slice(&output).expect("json output");
        assert_eq!(ui["form_id"], "signup");
        let seats = ui["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|field| field["name"] == "seats")
            .cloned()
            .unwrap();
        assert_eq!(seats["visible"], false);
    }

    #[test]
    fn render_text_shows_errors_when_touched() {
        let dir = assert_fs::TempDir::new().unwrap();
        let spec = write_json(&dir, "form.json", &signup_spec());
        let output = formctl()
            .args(["render", "--touch-all", "--spec"])
            .arg(&spec)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let text = String::from_utf8_lossy(&output);
        assert!(text.starts_with("Form: Sign up (signup)"));
        assert!(text.contains("   ! Email is required"));
    }

    #[test]
    fn submit_without_endpoint_prints_values() {
        let dir = assert_fs::TempDir::new().unwrap();
        let spec = write_json(&dir, "form.json", &signup_spec());
        let values = write_json(&dir, "values.json", &json!({ "email": "a@b.co" }));
        let output = formctl()
            .args(["submit", "--spec"])
            .arg(&spec)
            .arg("--values")
            .arg(&values)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let printed: Value = serde_json::from_slice(&output).expect("json output");
        assert_eq!(
            printed,
            json!({ "email": "a@b.co", "plan": "free", "seats": "", "logo": null })
        );
    }

    #[test]
    fn submit_reports_validation_failure() {
        let dir = assert_fs::TempDir::new().unwrap();
        let spec = write_json(&dir, "form.json", &signup_spec());
        let output = formctl()
            .args(["submit", "--spec"])
            .arg(&spec)
            .assert()
            .failure()
            .get_output()
            .stderr
            .clone();
        assert!(String::from_utf8_lossy(&output).contains("  email - Email is required"));
    }

    #[test]
    fn schema_describes_form_definitions() {
        let output = formctl()
            .arg("schema")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let schema: Value = serde_json::from_slice(&output).expect("schema json");
        assert_eq!(schema["title"], "FormSpec");
        assert!(schema["properties"]["fields"].is_object());
    }
}

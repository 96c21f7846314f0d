//! Output formatting and request payload input
//!
//! Handles JSON, YAML, and table output formats, and reads JSON payloads
//! and templates from files, stdin, or the command line.

use std::fs;
use std::io::{IsTerminal, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::{OutputFormat, Payload, TemplateSource, Values};
use crate::config::RuntimeContext;

/// Format and print data according to the configured output format
pub fn print_output<T: Serialize>(ctx: &RuntimeContext, data: &T) -> Result<()> {
    let output = format_output(ctx.output_format(), std::io::stdout().is_terminal(), data)?;
    println!("{output}");
    Ok(())
}

/// Format data as JSON or YAML; table formats fall back to JSON here
pub fn format_output<T: Serialize>(format: OutputFormat, is_tty: bool, data: &T) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        _ if is_tty => Ok(serde_json::to_string_pretty(data)?),
        _ => Ok(serde_json::to_string(data)?),
    }
}

/// Whether the human-readable rendering should be used
pub fn wants_table(format: OutputFormat, is_tty: bool) -> bool {
    match format {
        OutputFormat::Table => true,
        OutputFormat::Auto => is_tty,
        _ => false,
    }
}

/// Run `table` for table output, otherwise print `data` as JSON/YAML
pub fn output_for_format<T, F>(ctx: &RuntimeContext, data: &T, table: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce() -> Result<()>,
{
    if wants_table(ctx.output_format(), std::io::stdout().is_terminal()) {
        table()
    } else {
        print_output(ctx, data)
    }
}

/// Print a table from items that implement Tabled
pub fn print_table<T: Tabled>(ctx: &RuntimeContext, items: &[T]) -> Result<()> {
    let table = build_table(items, ctx.config.output.no_headers);
    println!("{table}");
    Ok(())
}

fn build_table<T: Tabled>(items: &[T], no_headers: bool) -> Table {
    let mut table = Table::new(items);
    table.with(Style::sharp());

    if no_headers {
        table.with(tabled::settings::Remove::row(
            tabled::settings::object::Rows::first(),
        ));
    }

    table
}

/// Print a list: a table of `rows` for humans, `data` otherwise
pub fn print_list<T, R>(ctx: &RuntimeContext, data: &T, rows: Vec<R>, empty: &str) -> Result<()>
where
    T: Serialize,
    R: Tabled,
{
    output_for_format(ctx, data, || {
        if rows.is_empty() {
            println!("{empty}");
            Ok(())
        } else {
            print_table(ctx, &rows)
        }
    })
}

/// Print a confirmation line unless output is machine-readable
pub fn print_message(ctx: &RuntimeContext, message: &str) {
    if ctx.global.quiet {
        return;
    }
    if wants_table(ctx.output_format(), std::io::stdout().is_terminal()) {
        println!("{message}");
    } else {
        log::info!("{message}");
    }
}

/// Truncate a string to a maximum number of characters
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

/// Parse JSON input from various sources (inline, file, stdin)
pub fn parse_json_input(input: &str) -> Result<Value> {
    let text = read_text_input(input)?;
    serde_json::from_str(&text).context("parsing JSON payload")
}

/// Resolve `-` (stdin) and `@path` indirections, or return the text itself
fn read_text_input(input: &str) -> Result<String> {
    let trimmed = input.trim();

    if trimmed == "-" {
        return read_stdin();
    }

    if let Some(path) = trimmed.strip_prefix('@') {
        return read_file(Path::new(path));
    }

    Ok(input.to_string())
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("reading from stdin")?;
    Ok(buffer)
}

fn read_file(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        return read_stdin();
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Read a required JSON object payload from `-f FILE` or the inline argument
pub fn read_payload(payload: &Payload) -> Result<Value> {
    let value = match (&payload.file, &payload.inline) {
        (Some(path), _) => {
            let text = read_file(path)?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing JSON payload from {}", path.display()))?
        }
        (None, Some(inline)) => parse_json_input(inline)?,
        (None, None) => bail!("A JSON payload is required: pass -f FILE or inline JSON"),
    };
    ensure_object(value)
}

/// Read optional JSON object values; missing input yields `{}`
pub fn read_values(values: &Values) -> Result<Value> {
    let value = match (&values.file, &values.inline) {
        (Some(path), _) => {
            let text = read_file(path)?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing JSON values from {}", path.display()))?
        }
        (None, Some(inline)) => parse_json_input(inline)?,
        (None, None) => return Ok(Value::Object(serde_json::Map::new())),
    };
    ensure_object(value)
}

/// Read template text from `-f FILE` or the inline argument
pub fn read_template(source: &TemplateSource) -> Result<String> {
    let text = match (&source.file, &source.inline) {
        (Some(path), _) => read_file(path)?,
        (None, Some(inline)) => read_text_input(inline)?,
        (None, None) => bail!("A template is required: pass -f FILE or the template text"),
    };
    if text.trim().is_empty() {
        bail!("Template is empty");
    }
    Ok(text)
}

fn ensure_object(value: Value) -> Result<Value> {
    if value.is_object() {
        Ok(value)
    } else {
        bail!("Payload must be a JSON object")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_json_input_inline() {
        let json = r#"{"name": "web"}"#;
        let result = parse_json_input(json).unwrap();
        assert_eq!(result["name"], "web");
    }

    #[test]
    fn test_parse_json_input_file_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pod.json");
        fs::write(&path, r#"{"name": "db"}"#).unwrap();

        let result = parse_json_input(&format!("@{}", path.display())).unwrap();
        assert_eq!(result["name"], "db");
    }

    #[test]
    fn test_read_payload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pod.json");
        fs::write(&path, r#"{"name": "web", "containers": []}"#).unwrap();

        let payload = Payload {
            file: Some(path),
            inline: None,
        };
        let value = read_payload(&payload).unwrap();
        assert_eq!(value["containers"], serde_json::json!([]));
    }

    #[test]
    fn test_read_payload_rejects_non_object() {
        let payload = Payload {
            file: None,
            inline: Some("[1, 2]".to_string()),
        };
        let err = read_payload(&payload).unwrap_err();
        assert_eq!(err.to_string(), "Payload must be a JSON object");

        let payload = Payload {
            file: None,
            inline: Some("{not json".to_string()),
        };
        assert!(read_payload(&payload).is_err());
    }

    #[test]
    fn test_read_payload_missing_file() {
        let payload = Payload {
            file: Some(PathBuf::from("/nonexistent/pod.json")),
            inline: None,
        };
        let err = read_payload(&payload).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pod.json"));
    }

    #[test]
    fn test_read_values_defaults_to_empty_object() {
        let values = Values {
            file: None,
            inline: None,
        };
        assert_eq!(read_values(&values).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_read_template() {
        let source = TemplateSource {
            file: None,
            inline: Some("apiVersion: v1\nkind: ReplicationController\n".to_string()),
        };
        assert!(read_template(&source).unwrap().starts_with("apiVersion"));

        let source = TemplateSource {
            file: None,
            inline: Some("   ".to_string()),
        };
        assert!(read_template(&source).is_err());
    }

    #[test]
    fn test_format_output() {
        let data = serde_json::json!({"id": 1});
        assert_eq!(
            format_output(OutputFormat::Json, false, &data).unwrap(),
            r#"{"id":1}"#
        );
        assert_eq!(
            format_output(OutputFormat::Auto, false, &data).unwrap(),
            r#"{"id":1}"#
        );
        assert_eq!(format_output(OutputFormat::Yaml, false, &data).unwrap(), "id: 1\n");
    }

    #[test]
    fn test_wants_table() {
        assert!(wants_table(OutputFormat::Table, false));
        assert!(wants_table(OutputFormat::Auto, true));
        assert!(!wants_table(OutputFormat::Auto, false));
        assert!(!wants_table(OutputFormat::Json, true));
    }

    #[test]
    fn test_build_table_without_headers() {
        #[derive(Tabled)]
        struct Row {
            name: String,
        }
        let rows = vec![Row {
            name: "web".to_string(),
        }];
        let with = build_table(&rows, false).to_string();
        let without = build_table(&rows, true).to_string();
        assert!(with.contains("name"));
        assert!(!without.contains("name"));
        assert!(without.contains("web"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long description", 10), "a long ...");
    }
}

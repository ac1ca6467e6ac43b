//! Output renderers and formatting helpers for CLI commands.
//!
//! Records are printed in one of three shapes: a structured JSON or XML dump,
//! a fixed-column table for listings, or a minijinja template. Templates get a
//! small set of helpers that flatten nested record lists into comma-joined
//! labels and a `date` filter for timestamps.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use minijinja::value::ValueKind;
use minijinja::{Environment, Error, ErrorKind, Output, State, Value};
use serde::Serialize;

use crate::client::{CliError, CliResult};

const TEMPLATE_NAME: &str = "record";
const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// Destination for command output: stdout for results, stderr for notices.
pub(crate) struct Console {
    sink: Sink,
}

enum Sink {
    Stdio,
    #[cfg_attr(not(test), allow(dead_code))]
    Buffer {
        out: Mutex<String>,
        err: Mutex<String>,
    },
}

impl Console {
    pub(crate) const fn stdio() -> Self {
        Self { sink: Sink::Stdio }
    }

    #[cfg(test)]
    pub(crate) const fn buffered() -> Self {
        Self {
            sink: Sink::Buffer {
                out: Mutex::new(String::new()),
                err: Mutex::new(String::new()),
            },
        }
    }

    /// Write `text` to stdout unchanged.
    pub(crate) fn print(&self, text: &str) -> CliResult<()> {
        match &self.sink {
            Sink::Stdio => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(text.as_bytes())
                    .and_then(|()| stdout.flush())
                    .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
            }
            Sink::Buffer { out, .. } => {
                out.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_str(text);
                Ok(())
            }
        }
    }

    /// Write `text` and a newline to stdout.
    pub(crate) fn line(&self, text: &str) -> CliResult<()> {
        self.print(&format!("{text}\n"))
    }

    /// Write a one-line notice to stderr.
    pub(crate) fn notice(&self, text: &str) {
        match &self.sink {
            Sink::Stdio => {
                let mut stderr = io::stderr().lock();
                if let Err(err) = writeln!(stderr, "{text}") {
                    tracing::debug!(error = %err, "failed to write notice");
                }
            }
            Sink::Buffer { err, .. } => {
                let mut buffer = err.lock().unwrap_or_else(PoisonError::into_inner);
                buffer.push_str(text);
                buffer.push('\n');
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn stdout_text(&self) -> String {
        match &self.sink {
            Sink::Stdio => String::new(),
            Sink::Buffer { out, .. } => out.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn stderr_text(&self) -> String {
        match &self.sink {
            Sink::Stdio => String::new(),
            Sink::Buffer { err, .. } => err.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        }
    }
}

/// How a command prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputMode<'a> {
    Json,
    Xml,
    Template(&'a str),
    Default,
}

impl<'a> OutputMode<'a> {
    /// Resolve the output flags, rejecting `--json` together with `--xml`.
    pub(crate) fn resolve(format: Option<&'a str>, json: bool, xml: bool) -> CliResult<Self> {
        match (json, xml) {
            (true, true) => Err(CliError::validation(
                "Conflict, you can only use JSON or XML at once",
            )),
            (true, false) => Ok(Self::Json),
            (false, true) => Ok(Self::Xml),
            (false, false) => Ok(format.map_or(Self::Default, Self::Template)),
        }
    }
}

/// One column of a listing table, addressed by a dotted path into the record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Column {
    header: &'static str,
    path: &'static str,
}

pub(crate) const fn column(header: &'static str, path: &'static str) -> Column {
    Column { header, path }
}

/// Table layout and XML element name of a listing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Listing {
    pub(crate) element: &'static str,
    pub(crate) columns: &'static [Column],
}

/// Print a collection.
pub(crate) fn render_list<T: Serialize>(
    console: &Console,
    mode: OutputMode<'_>,
    listing: &Listing,
    records: &[T],
) -> CliResult<()> {
    match mode {
        OutputMode::Json => return console.line(&to_json(records)?),
        OutputMode::Xml => return console.line(&to_xml(listing.element, records)?),
        OutputMode::Template(_) | OutputMode::Default => {}
    }

    if records.is_empty() {
        console.notice("Empty result");
        return Ok(());
    }

    if let OutputMode::Template(source) = mode {
        let template = RecordTemplate::new(source)?;
        for record in records {
            console.line(&template.render(record)?)?;
        }
        return Ok(());
    }

    let rows = records
        .iter()
        .map(|record| {
            serde_json::to_value(record)
                .map_err(|err| CliError::failure(anyhow!("failed to format record: {err}")))
        })
        .collect::<CliResult<Vec<_>>>()?;
    console.print(&format_table(listing.columns, &rows))
}

/// Print a single record, falling back to `default_template` for the human view.
pub(crate) fn render_record<T: Serialize>(
    console: &Console,
    mode: OutputMode<'_>,
    element: &str,
    default_template: &str,
    record: &T,
) -> CliResult<()> {
    let text = match mode {
        OutputMode::Json => to_json(record)?,
        OutputMode::Xml => to_xml(element, record)?,
        OutputMode::Template(source) => RecordTemplate::new(source)?.render(record)?,
        OutputMode::Default => RecordTemplate::new(default_template)?.render(record)?,
    };
    console.line(&text)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

fn to_xml<T: Serialize + ?Sized>(element: &str, value: &T) -> CliResult<String> {
    let mut buffer = String::new();
    let mut serializer = quick_xml::se::Serializer::with_root(&mut buffer, Some(element))
        .map_err(|err| CliError::failure(anyhow!("failed to format XML: {err}")))?;
    serializer.indent(' ', 2);
    value
        .serialize(serializer)
        .map_err(|err| CliError::failure(anyhow!("failed to format XML: {err}")))?;
    Ok(buffer)
}

fn format_table(columns: &[Column], rows: &[serde_json::Value]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| cell(row, column.path))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|row| row[index].chars().count())
                .fold(column.header.len(), usize::max)
        })
        .collect();

    let mut output = String::new();
    let header: Vec<&str> = columns.iter().map(|column| column.header).collect();
    push_row(&mut output, &header, &widths);
    for row in &cells {
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&mut output, &row, &widths);
    }
    output
}

fn push_row(output: &mut String, cells: &[&str], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    output.push_str(line.trim_end());
    output.push('\n');
}

fn cell(row: &serde_json::Value, path: &str) -> String {
    let value = path
        .split('.')
        .try_fold(row, |value, key| value.get(key));
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// A compiled user or default template with the record helpers registered.
struct RecordTemplate {
    env: Environment<'static>,
}

impl RecordTemplate {
    fn new(source: &str) -> CliResult<Self> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_formatter(format_value);
        register_helpers(&mut env);
        env.add_template_owned(TEMPLATE_NAME, source.to_string())
            .map_err(|err| CliError::failure(anyhow!("failed to parse template: {err}")))?;
        Ok(Self { env })
    }

    fn render<T: Serialize>(&self, record: &T) -> CliResult<String> {
        self.env
            .get_template(TEMPLATE_NAME)
            .and_then(|template| template.render(record))
            .map_err(|err| CliError::failure(anyhow!("failed to render template: {err}")))
    }
}

/// Print booleans as `true`/`false` and defer everything else to minijinja.
fn format_value(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), Error> {
    if value.kind() == ValueKind::Bool {
        let text = if value.is_true() { "true" } else { "false" };
        return out
            .write_str(text)
            .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write boolean"));
    }
    minijinja::escape_formatter(out, state, value)
}

fn register_helpers(env: &mut Environment<'static>) {
    env.add_function("orglist", |records: Option<Vec<Value>>| {
        join_labels(records, "name")
    });
    env.add_function("namespacelist", |records: Option<Vec<Value>>| {
        join_labels(records, "name")
    });
    env.add_function("teamlist", |records: Option<Vec<Value>>| {
        join_labels(records, "name")
    });
    env.add_function("taglist", |records: Option<Vec<Value>>| {
        join_labels(records, "name")
    });
    env.add_function("userlist", |records: Option<Vec<Value>>| {
        join_labels(records, "username")
    });
    env.add_function("repolist", |records: Option<Vec<Value>>| {
        join_labels(records, "full_name")
    });
    env.add_filter("date", format_date);
}

fn join_labels(records: Option<Vec<Value>>, field: &str) -> String {
    records
        .unwrap_or_default()
        .iter()
        .filter_map(|record| record.get_attr(field).ok())
        .filter(|label| !label.is_undefined() && !label.is_none())
        .map(|label| label.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_date(value: Option<String>) -> String {
    let Some(raw) = value else {
        return String::new();
    };
    DateTime::parse_from_rfc3339(&raw).map_or(raw, |timestamp| {
        timestamp
            .with_timezone(&Utc)
            .format(DATE_FORMAT)
            .to_string()
    })
}

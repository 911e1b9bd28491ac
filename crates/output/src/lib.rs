use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
    Csv,
    Quiet,
}

pub struct OutputRenderer {
    format: OutputFormat,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn render<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered = self.render_to_string(value)?;
        if !rendered.is_empty() {
            println!("{}", rendered.trim_end());
        }
        Ok(())
    }

    pub fn render_to_string<T: Serialize>(&self, value: &T) -> Result<String> {
        let value = serde_json::to_value(value)?;

        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&value)?,
            OutputFormat::Yaml => serde_yaml::to_string(&value)?,
            OutputFormat::Table => match table_data(&value) {
                Some((headers, rows)) => {
                    let mut builder = Builder::default();
                    builder.push_record(headers);
                    for row in rows {
                        builder.push_record(row);
                    }
                    builder.build().with(Style::rounded()).to_string()
                }
                None => scalar_or_json(&value)?,
            },
            OutputFormat::Csv => match table_data(&value) {
                Some((headers, rows)) => write_csv(&headers, &rows)?,
                None => scalar_or_json(&value)?,
            },
            OutputFormat::Quiet => identifiers(&value).join("\n"),
        };

        Ok(rendered)
    }

    /// Status line for mutating commands; suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if self.format != OutputFormat::Quiet {
            eprintln!("{} {}", "✔".green(), message);
        }
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "!".yellow().bold(), message);
    }
}

/// Arrays of objects become one row per element; a lone object becomes a
/// field/value listing.
fn table_data(value: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    match value {
        Value::Array(rows) if !rows.is_empty() => {
            let mut headers: Vec<String> = Vec::new();
            let objects: Vec<&Map<String, Value>> =
                rows.iter().filter_map(Value::as_object).collect();
            if objects.len() != rows.len() {
                return None;
            }
            for obj in &objects {
                for key in obj.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
            if headers.is_empty() {
                return None;
            }

            let data = objects
                .iter()
                .map(|obj| {
                    headers
                        .iter()
                        .map(|h| obj.get(h).map(cell).unwrap_or_default())
                        .collect()
                })
                .collect();
            Some((headers, data))
        }
        Value::Object(obj) if !obj.is_empty() => {
            let data = obj
                .iter()
                .map(|(key, value)| vec![key.clone(), cell(value)])
                .collect();
            Some((vec!["field".to_string(), "value".to_string()], data))
        }
        _ => None,
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) if items.iter().all(|i| !i.is_object() && !i.is_array()) => {
            items.iter().map(cell).collect::<Vec<_>>().join(", ")
        }
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn write_csv(headers: &[String], rows: &[Vec<String>]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    let bytes = wtr.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn scalar_or_json(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::Array(items) if items.is_empty() => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(_) | Value::Bool(_) => value.to_string(),
        other => serde_json::to_string_pretty(other)?,
    })
}

/// `key` is preferred over `id` (issues, epics); boards and sprints only carry `id`.
fn identifiers(value: &Value) -> Vec<String> {
    fn ident(obj: &Map<String, Value>) -> Option<String> {
        ["key", "id", "name"]
            .iter()
            .find_map(|field| obj.get(*field).filter(|v| !v.is_null()).map(cell))
    }

    match value {
        Value::Array(rows) => rows
            .iter()
            .filter_map(|row| match row {
                Value::Object(obj) => ident(obj),
                Value::Null => None,
                other => Some(cell(other)),
            })
            .collect(),
        Value::Object(obj) => ident(obj).into_iter().collect(),
        Value::Null => Vec::new(),
        other => vec![cell(other)],
    }
}

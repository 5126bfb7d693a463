//! Terminal rendering of command results
//!
//! Lists print as tables and single records as a two-column sheet
//! (Champ / Valeur). With `--format json` everything is pretty JSON.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One line of a record sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Champ")]
    pub key: String,
    #[tabled(rename = "Valeur")]
    pub value: String,
}

fn print_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

fn print_table<T: Tabled>(rows: &[T]) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

/// Print a collection of rows
pub fn print_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(rows),
        OutputFormat::Table if rows.is_empty() => {
            println!("Aucun élément trouvé.");
            Ok(())
        }
        OutputFormat::Table => {
            print_table(rows);
            Ok(())
        }
    }
}

/// Sheet of one record, labelled with its column headers
pub fn record_sheet<T: Tabled>(record: &T) -> Vec<FieldRow> {
    T::headers()
        .into_iter()
        .zip(record.fields())
        .map(|(key, value)| FieldRow {
            key: key.into_owned(),
            value: value.into_owned(),
        })
        .collect()
}

/// Print one record
pub fn print_record<T: Serialize + Tabled>(record: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            print_table(&record_sheet(record));
            Ok(())
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(true) => "oui".to_string(),
        Value::Bool(false) => "non".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print a free-form server payload (statistics, activity)
pub fn print_value(value: &Value, format: OutputFormat) -> anyhow::Result<()> {
    match (format, value) {
        (OutputFormat::Table, Value::Object(map)) => {
            let rows: Vec<FieldRow> = map
                .iter()
                .map(|(key, v)| FieldRow {
                    key: key.clone(),
                    value: cell(v),
                })
                .collect();
            print_list(&rows, format)
        }
        _ => print_json(value),
    }
}

pub fn success(message: &str, quiet: bool) {
    if !quiet {
        println!("{}", message.green());
    }
}

pub fn note(message: &str, quiet: bool) {
    if !quiet {
        println!("{}", message);
    }
}

/// Errors go to stderr even in quiet mode
pub fn failure(message: &str) {
    eprintln!("{}", message.red());
}

/// Display helper for optional text cells
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Tabled)]
    struct SiteLine {
        #[tabled(rename = "Nom")]
        name: String,
        #[tabled(rename = "Agents")]
        agents: usize,
    }

    #[test]
    fn test_format_parsing_ignores_case() {
        assert_eq!(OutputFormat::from_str("JSON", true).unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("table", false).unwrap(), OutputFormat::Table);
        assert!(OutputFormat::from_str("xml", true).is_err());
    }

    #[test]
    fn test_record_sheet_uses_headers() {
        let sheet = record_sheet(&SiteLine {
            name: "Port de Bonabéri".to_string(),
            agents: 4,
        });
        assert_eq!(
            sheet,
            vec![
                FieldRow { key: "Nom".to_string(), value: "Port de Bonabéri".to_string() },
                FieldRow { key: "Agents".to_string(), value: "4".to_string() },
            ]
        );
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell(&Value::Null), "-");
        assert_eq!(cell(&serde_json::json!(true)), "oui");
        assert_eq!(cell(&serde_json::json!("ABSENT")), "ABSENT");
        assert_eq!(cell(&serde_json::json!(12)), "12");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some("Douala")), "Douala");
        assert_eq!(or_dash(Some("  ")), "-");
        assert_eq!(or_dash(None), "-");
    }
}

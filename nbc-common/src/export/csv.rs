//! CSV serialization of projected tables
//!
//! UTF-8, header row first, `\n` line endings. Fields containing a comma,
//! double quote or line break are quoted with inner quotes doubled.

use serde_json::Value;

use crate::db::Table;

/// Render a table as CSV (header + one line per row)
pub fn to_csv(table: &Table) -> String {
    let mut out = String::new();
    push_line(&mut out, table.columns.iter().map(String::as_str));
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        push_line(&mut out, cells.iter().map(String::as_str));
    }
    out
}

fn push_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let line = fields.map(escape).collect::<Vec<_>>().join(",");
    out.push_str(&line);
    out.push('\n');
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Quote a field when it would otherwise break the row
pub fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(rows: Vec<Vec<Value>>) -> Table {
        Table {
            columns: vec!["id".into(), "woreda".into(), "guava_length".into()],
            rows,
        }
    }

    #[test]
    fn test_header_only_for_empty_table() {
        assert_eq!(to_csv(&table(vec![])), "id,woreda,guava_length\n");
    }

    #[test]
    fn test_rows_follow_header() {
        let csv = to_csv(&table(vec![
            vec![json!(1), json!("Merawi"), json!(12.5)],
            vec![json!(2), Value::Null, json!(0.0)],
        ]));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,Merawi,12.5");
        assert_eq!(lines[2], "2,,0.0");
    }

    #[test]
    fn test_escape_quotes_and_commas() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("Bahir Dar, Zuria"), "\"Bahir Dar, Zuria\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_unicode_passes_through() {
        let csv = to_csv(&table(vec![vec![json!(1), json!("ሜራዊ"), json!(1)]]));
        assert!(csv.contains("ሜራዊ"));
    }
}

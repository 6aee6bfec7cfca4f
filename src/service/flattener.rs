use crate::error::InvoiceError;
use crate::models::{Cell, Grid};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 表格序列化格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlattenFormat {
    /// JSON 二维数组, 保留空行 (为 `[]`), 行数与表格一致
    Json,
    /// 每行一条, 单元格以 Tab 分隔, 跳过全空行
    Tabbed,
}

/// 将表格序列化为 prompt 文本, 保持原始行列顺序
pub fn flatten(grid: &Grid, format: FlattenFormat) -> Result<String, InvoiceError> {
    if grid.rows.is_empty() || !grid.has_content() {
        return Err(InvoiceError::EmptySheet);
    }

    let text = match format {
        FlattenFormat::Json => flatten_json(grid),
        FlattenFormat::Tabbed => flatten_tabbed(grid),
    };
    tracing::debug!("Flattened {} rows into {} bytes ({:?})", grid.rows.len(), text.len(), format);
    Ok(text)
}

fn flatten_json(grid: &Grid) -> String {
    let rows: Vec<String> = grid
        .rows
        .iter()
        .map(|row| {
            let cells = trim_trailing_empty(row);
            Value::Array(cells.iter().map(cell_to_json).collect()).to_string()
        })
        .collect();

    if rows.is_empty() {
        return "[]".to_string();
    }
    format!("[\n  {}\n]", rows.join(",\n  "))
}

fn flatten_tabbed(grid: &Grid) -> String {
    grid.rows
        .iter()
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .map(|row| {
            row.iter()
                .map(cell_to_text)
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn trim_trailing_empty(row: &[Cell]) -> &[Cell] {
    let end = row
        .iter()
        .rposition(|c| !matches!(c, Cell::Empty))
        .map_or(0, |i| i + 1);
    &row[..end]
}

fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Empty => Value::Null,
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Number(n) => number_to_json(*n),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Date(dt) => Value::String(format_date(dt)),
    }
}

fn cell_to_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.clone(),
        Cell::Number(n) => number_to_json(*n).to_string(),
        Cell::Bool(b) => b.to_string(),
        Cell::Date(dt) => format_date(dt),
    }
}

// 整数值不输出 ".0"
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn format_date(dt: &NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn one_populated_row(empty_rows: usize) -> Grid {
        let mut rows = vec![vec![Cell::Empty, Cell::Empty]; empty_rows];
        rows.insert(1, vec![Cell::from("Invoice No."), Cell::from("M04")]);
        Grid::new(rows)
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(matches!(
            flatten(&Grid::default(), FlattenFormat::Json),
            Err(InvoiceError::EmptySheet)
        ));
        let blank = Grid::new(vec![vec![Cell::Empty], vec![Cell::from("  ")]]);
        assert!(matches!(
            flatten(&blank, FlattenFormat::Tabbed),
            Err(InvoiceError::EmptySheet)
        ));
    }

    #[test]
    fn json_keeps_empty_rows() {
        let grid = one_populated_row(4);
        let text = flatten(&grid, FlattenFormat::Json).unwrap();
        let parsed: Vec<Vec<Value>> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[0], Vec::<Value>::new());
        assert_eq!(parsed[1], vec![Value::from("Invoice No."), Value::from("M04")]);
    }

    #[test]
    fn tabbed_skips_empty_rows() {
        let grid = one_populated_row(4);
        let text = flatten(&grid, FlattenFormat::Tabbed).unwrap();
        assert_eq!(text, "Invoice No.\tM04");
    }

    #[test]
    fn preserves_column_order_and_inner_gaps() {
        let grid = Grid::new(vec![vec![
            Cell::from("Part No"),
            Cell::Empty,
            Cell::Number(12.0),
            Cell::Number(3.5),
            Cell::Date(
                NaiveDate::from_ymd_opt(2025, 3, 18)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
            Cell::Empty,
        ]]);
        let json = flatten(&grid, FlattenFormat::Json).unwrap();
        assert_eq!(json, "[\n  [\"Part No\",null,12,3.5,\"2025-03-18\"]\n]");
        let tabbed = flatten(&grid, FlattenFormat::Tabbed).unwrap();
        assert_eq!(tabbed, "Part No\t\t12\t3.5\t2025-03-18\t");
    }
}

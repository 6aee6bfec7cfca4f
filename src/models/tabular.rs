use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;

/// 输入表格单元格
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// 二维表格 (行优先)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn has_content(&self) -> bool {
        self.rows.iter().flatten().any(|c| !c.is_empty())
    }
}

/// 输出列定义: 表头 / 列宽 / 是否文本格式
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    pub header: &'static str,
    pub width: f64,
    pub text_format: bool,
}

/// 输出单元格值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(BigDecimal),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    /// 统一的文本表示 (CSV 导出与测试断言使用)
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
        }
    }
}

/// 输出表: 固定列顺序 + 数据行
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<FieldValue>>,
}

impl Sheet {
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header).collect()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.header == header)
    }

    /// 按表头取某行的值
    pub fn value(&self, row: usize, header: &str) -> Option<&FieldValue> {
        let col = self.column_index(header)?;
        self.rows.get(row)?.get(col)
    }
}

use crate::error::InvoiceError;
use crate::models::{Cell, Grid};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::io::Cursor;

/// 读取工作簿第一个工作表为二维表格
pub fn load(bytes: &[u8]) -> Result<Grid, InvoiceError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| InvoiceError::Workbook(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(InvoiceError::Workbook(e.to_string())),
        None => return Err(InvoiceError::EmptySheet),
    };

    let rows: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    tracing::debug!("Loaded worksheet: {} rows", rows.len());
    Ok(Grid::new(rows))
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_datetime(serial)
                .map(Cell::Date)
                .unwrap_or(Cell::Number(serial))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("#ERR:{:?}", e)),
    }
}

/// Excel 序列日期 (1899-12-30 起算) 转为日期时间
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(Duration::milliseconds(millis))
}

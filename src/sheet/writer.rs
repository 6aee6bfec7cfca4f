use crate::error::InvoiceError;
use crate::models::{FieldValue, Sheet};
use bigdecimal::ToPrimitive;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};

/// 按列定义生成 xlsx 字节
pub fn write_xlsx(sheet: &Sheet) -> Result<Vec<u8>, InvoiceError> {
    let err = |e: XlsxError| InvoiceError::Render {
        schema: sheet.name,
        reason: e.to_string(),
    };

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let text_format = Format::new().set_num_format("@");

    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Sheet1").map_err(err)?;

        for (col, spec) in sheet.columns.iter().enumerate() {
            let col = col as u16;
            worksheet.set_column_width(col, spec.width).map_err(err)?;
            if spec.text_format {
                worksheet.set_column_format(col, &text_format).map_err(err)?;
            }
            worksheet
                .write_string_with_format(0, col, spec.header, &header_format)
                .map_err(err)?;
        }

        for (idx, row) in sheet.rows.iter().enumerate() {
            let row_num = (idx + 1) as u32;
            for (col, value) in row.iter().enumerate() {
                let text_column = sheet.columns.get(col).is_some_and(|c| c.text_format);
                let col = col as u16;
                match value {
                    FieldValue::Text(s) if s.is_empty() => {}
                    FieldValue::Text(s) if text_column => {
                        worksheet
                            .write_string_with_format(row_num, col, s.as_str(), &text_format)
                            .map_err(err)?;
                    }
                    FieldValue::Text(s) => {
                        worksheet.write_string(row_num, col, s.as_str()).map_err(err)?;
                    }
                    FieldValue::Number(n) => {
                        let n = n.to_f64().unwrap_or_default();
                        worksheet.write_number(row_num, col, n).map_err(err)?;
                    }
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(err)
}

/// CSV 导出 (与 xlsx 相同的列顺序)
pub fn write_csv(sheet: &Sheet) -> Result<Vec<u8>, InvoiceError> {
    let err = |reason: String| InvoiceError::Render {
        schema: sheet.name,
        reason,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(sheet.headers())
        .map_err(|e| err(e.to_string()))?;
    for row in &sheet.rows {
        writer
            .write_record(row.iter().map(FieldValue::as_text))
            .map_err(|e| err(e.to_string()))?;
    }
    writer.into_inner().map_err(|e| err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, ColumnSpec};
    use crate::sheet::load;
    use bigdecimal::BigDecimal;

    fn sample_sheet() -> Sheet {
        Sheet {
            name: "Inv",
            columns: vec![
                ColumnSpec {
                    header: "Date",
                    width: 15.0,
                    text_format: true,
                },
                ColumnSpec {
                    header: "Quantity",
                    width: 10.0,
                    text_format: false,
                },
                ColumnSpec {
                    header: "Total Amount",
                    width: 15.0,
                    text_format: false,
                },
            ],
            rows: vec![vec![
                FieldValue::text("18/03/2025"),
                FieldValue::Number(BigDecimal::from(5)),
                FieldValue::text("10.00"),
            ]],
        }
    }

    #[test]
    fn xlsx_keeps_header_order_and_values() {
        let bytes = write_xlsx(&sample_sheet()).unwrap();
        let grid = load(&bytes).unwrap();

        assert_eq!(
            grid.rows[0],
            vec![
                Cell::Text("Date".to_string()),
                Cell::Text("Quantity".to_string()),
                Cell::Text("Total Amount".to_string()),
            ]
        );
        assert_eq!(grid.rows[1][0], Cell::Text("18/03/2025".to_string()));
        assert_eq!(grid.rows[1][1], Cell::Number(5.0));
        assert_eq!(grid.rows[1][2], Cell::Text("10.00".to_string()));
    }

    #[test]
    fn csv_uses_same_columns() {
        let bytes = write_csv(&sample_sheet()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "Date,Quantity,Total Amount\n18/03/2025,5,10.00\n");
    }
}

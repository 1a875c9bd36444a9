//! Writing of the report as XLSX workbook.

use std::path::Path;

use rust_xlsxwriter::{Format, Url, Workbook, Worksheet, XlsxError};

use super::{Cell, Report, Sheet};

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), XlsxError> {
    let header_format = Format::new().set_bold();

    worksheet.set_name(&sheet.name)?;
    for (col, name) in sheet.header.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }
    for (row_no, row) in sheet.rows.iter().enumerate() {
        let row_no = row_no as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(row_no, col, text)?;
                }
                Cell::Number(number) => {
                    worksheet.write_number(row_no, col, *number)?;
                }
                Cell::Link(link) => {
                    worksheet.write_url(row_no, col, Url::new(&link.url).set_text(&link.text))?;
                }
                Cell::Blank => (),
            }
        }
    }
    worksheet.set_freeze_panes(sheet.freeze.0, sheet.freeze.1)?;

    Ok(())
}

/// Write `report` to `path`, one worksheet per sheet.
pub fn write_report<P: AsRef<Path>>(report: &Report, path: P) -> Result<(), anyhow::Error> {
    let mut workbook = Workbook::new();
    for sheet in report.sheets() {
        write_sheet(workbook.add_worksheet(), sheet)?;
    }
    workbook
        .save(path.as_ref())
        .map_err(|e| anyhow::anyhow!("could not write workbook to {:?}: {}", path.as_ref(), e))?;
    tracing::debug!("wrote workbook to {:?}", path.as_ref());
    Ok(())
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use super::*;
    use crate::variants::Link;

    #[test]
    fn write_report_smoke() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("out.xlsx");
        let sheet = |name: &str| Sheet {
            name: name.into(),
            header: vec!["#Participant_ID".into(), "link".into(), "MT_cov".into()],
            rows: vec![vec![
                Cell::text("A-B-7-0"),
                Cell::Link(Link {
                    url: "https://example.org/chrM-3243-A-G".into(),
                    text: "chrM:3243_A>G".into(),
                }),
                Cell::Number(2011.5),
                Cell::Blank,
            ]],
            freeze: (1, 1),
        };
        let report = Report {
            variants: sheet("Variants"),
            cohort: sheet("Cohort"),
        };

        write_report(&report, &path)?;

        let mut magic = [0u8; 2];
        std::fs::File::open(&path)?.read_exact(&mut magic)?;
        assert_eq!(&magic, b"PK");
        Ok(())
    }

    #[test]
    fn write_report_with_overlong_url() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("out.xlsx");
        let text = format!("chrM:302_{}>A", "C".repeat(2100));
        let cell = Cell::link(&Link {
            url: format!("https://example.org/{}", text.replace([':', '_', '>'], "-")),
            text: text.clone(),
        });
        let sheet = |name: &str| Sheet {
            name: name.into(),
            header: vec!["link".into()],
            rows: vec![vec![cell.clone()]],
            freeze: (1, 0),
        };

        write_report(
            &Report {
                variants: sheet("Variants"),
                cohort: sheet("Cohort"),
            },
            &path,
        )?;

        assert_eq!(cell, Cell::text(&text));
        assert!(path.exists());
        Ok(())
    }
}

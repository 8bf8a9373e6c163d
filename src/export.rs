//! Spreadsheet export: one workbook, a dashboard sheet and one sheet per record kind.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::{error, info};

use crate::aggregate::Summary;
use crate::db::GrowStore;
use crate::error::{Result, TrackerError};
use crate::models::MAX_NUTRIENTS;

/// MIME type to serve the exported workbook with.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Excel refuses sheet names longer than this.
pub const MAX_SHEET_NAME: usize = 31;

const DATE_FORMAT: &str = "yyyy-mm-dd";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<&String> for Cell {
    fn from(s: &String) -> Self {
        Cell::from(s.as_str())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Cell::Number(f64::from(n))
    }
}

impl From<NaiveDate> for Cell {
    fn from(d: NaiveDate) -> Self {
        Cell::Date(d)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, Into::into)
    }
}

/// A sheet laid out in memory before it is written to the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new<S: AsRef<str>>(name: &str, headers: &[S]) -> Self {
        Sheet {
            name: sheet_name(name),
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

/// Clips `name` to the longest sheet name a workbook accepts.
pub fn sheet_name(name: &str) -> String {
    name.chars().take(MAX_SHEET_NAME).collect()
}

fn dashboard_sheet(store: &GrowStore) -> Sheet {
    let summary = Summary::of(store);
    let mut sheet = Sheet::new("Dashboard", &["Metric", "Value"]);
    for (label, value) in summary.metrics() {
        sheet.rows.push(vec![label.into(), value.into()]);
    }
    let counts = summary.counts;
    for (label, count) in [
        ("Plants", counts.plants),
        ("Strains", counts.strains),
        ("Expenses", counts.expenses),
        ("Income Records", counts.income),
        ("Stock Items", counts.stock),
        ("Feedings", counts.feeding),
    ] {
        sheet.rows.push(vec![label.into(), Cell::Number(count as f64)]);
    }
    sheet
}

fn plants_sheet(store: &GrowStore, today: NaiveDate) -> Sheet {
    let mut sheet = Sheet::new(
        "Plants",
        &[
            "Plant ID",
            "Strain Name",
            "Variety",
            "Gender",
            "Environment",
            "Type",
            "Source",
            "Batch #",
            "Date Germination",
            "Date Transplant Veg",
            "Date Flip Flower",
            "Date Harvest",
            "Wet Weight (g)",
            "Dry Weight (g)",
            "Trimmed Yield (g)",
            "Mother ID",
            "Growing Medium",
            "Container Size (L)",
            "Phenotype Notes",
            "Health Issues",
            "Rating (1-10)",
            "Photos Link",
            "Status",
            "Current Stage",
            "Flowering Days",
            "Total Days",
        ],
    );
    for row in store.plant_rows(today) {
        let p = row.plant;
        sheet.rows.push(vec![
            (&p.plant_id).into(),
            (&p.strain_name).into(),
            p.variety.label().into(),
            p.gender.label().into(),
            p.environment.label().into(),
            p.propagation.label().into(),
            (&p.source).into(),
            (&p.batch).into(),
            p.germination.into(),
            p.transplant_veg.into(),
            p.flip_flower.into(),
            p.harvest.into(),
            p.wet_weight_g.into(),
            p.dry_weight_g.into(),
            p.trimmed_yield_g.into(),
            p.mother_id.as_ref().into(),
            p.medium.label().into(),
            p.container_litres.into(),
            (&p.phenotype_notes).into(),
            (&p.health_issues).into(),
            p.rating.map(u32::from).into(),
            (&p.photos_link).into(),
            p.status.label().into(),
            row.stage.to_string().as_str().into(),
            row.flowering_days.map(|d| d as f64).into(),
            row.total_days.map(|d| d as f64).into(),
        ]);
    }
    sheet
}

fn feeding_sheet(store: &GrowStore) -> Sheet {
    let mut headers = vec!["Date".to_string(), "Plant IDs".into(), "Stage".into()];
    for n in 1..=MAX_NUTRIENTS {
        headers.push(format!("Nutrient {}", n));
        headers.push(format!("Amount {}", n));
    }
    headers.push("Notes".into());
    let mut sheet = Sheet::new("Feeding", headers.as_slice());

    for event in store.feeding.scan() {
        let mut cells: Vec<Cell> = vec![
            event.date.into(),
            event.plant_ids.join(", ").as_str().into(),
            (&event.stage).into(),
        ];
        for n in 0..MAX_NUTRIENTS {
            match event.nutrients.get(n) {
                Some(dose) => {
                    cells.push((&dose.name).into());
                    cells.push(dose.amount.into());
                }
                None => cells.extend([Cell::Empty, Cell::Empty]),
            }
        }
        cells.push((&event.notes).into());
        sheet.rows.push(cells);
    }
    sheet
}

fn strains_sheet(store: &GrowStore) -> Sheet {
    let mut sheet = Sheet::new(
        "Strains",
        &[
            "Strain Name",
            "Breeder",
            "Variety",
            "Flower Time",
            "THC %",
            "Terpenes",
            "Avg Yield (g)",
            "Times Grown",
            "Keeper",
            "Notes",
        ],
    );
    for s in store.strains.scan() {
        sheet.rows.push(vec![
            (&s.name).into(),
            (&s.breeder).into(),
            s.variety.label().into(),
            (&s.flower_time).into(),
            s.thc_percent.into(),
            (&s.terpenes).into(),
            s.avg_yield_g.into(),
            s.times_grown.into(),
            s.keeper.label().into(),
            (&s.notes).into(),
        ]);
    }
    sheet
}

fn expenses_sheet(store: &GrowStore) -> Sheet {
    let mut sheet = Sheet::new(
        "Expenses",
        &[
            "Date",
            "Category",
            "Item",
            "Supplier",
            "Cost",
            "Quantity",
            "Paid To",
            "Notes",
            "Receipt Link",
            "Unit Cost",
        ],
    );
    for e in store.expenses.scan() {
        sheet.rows.push(vec![
            e.date.into(),
            e.category.label().into(),
            (&e.item).into(),
            (&e.supplier).into(),
            e.cost.into(),
            e.quantity.into(),
            (&e.paid_to).into(),
            (&e.notes).into(),
            (&e.receipt_link).into(),
            e.unit_cost().into(),
        ]);
    }
    sheet
}

fn income_sheet(store: &GrowStore) -> Sheet {
    let mut sheet = Sheet::new(
        "Income",
        &[
            "Date",
            "Strain",
            "Grams Sold",
            "Price per Gram",
            "Buyer",
            "Payment Method",
            "Notes",
            "Total",
        ],
    );
    for i in store.income.scan() {
        sheet.rows.push(vec![
            i.date.into(),
            (&i.strain).into(),
            i.grams_sold.into(),
            i.price_per_gram.into(),
            (&i.buyer).into(),
            i.payment.label().into(),
            (&i.notes).into(),
            i.total().into(),
        ]);
    }
    sheet
}

fn stock_sheet(store: &GrowStore) -> Sheet {
    let mut sheet = Sheet::new(
        "Seed & Clone Stock",
        &["Strain", "Breeder", "Units Left", "Pack Cost", "Cost per Unit"],
    );
    for s in store.stock.scan() {
        sheet.rows.push(vec![
            (&s.strain).into(),
            (&s.breeder).into(),
            s.units_left.into(),
            s.pack_cost.into(),
            s.cost_per_unit().into(),
        ]);
    }
    sheet
}

/// Lays out every sheet of the export, dashboard first.
pub fn build_sheets(store: &GrowStore, today: NaiveDate) -> Vec<Sheet> {
    vec![
        dashboard_sheet(store),
        plants_sheet(store, today),
        feeding_sheet(store),
        strains_sheet(store),
        expenses_sheet(store),
        income_sheet(store),
        stock_sheet(store),
    ]
}

fn write_sheet(sheet: &Sheet, bold: &Format, date: &Format) -> Result<Worksheet, XlsxError> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(&sheet.name)?;

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, bold)?;
    }
    for (r, cells) in sheet.rows.iter().enumerate() {
        let row = r as u32 + 1;
        for (c, cell) in cells.iter().enumerate() {
            let col = c as u16;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                Cell::Date(d) => {
                    worksheet.write_datetime_with_format(row, col, d, date)?;
                }
                Cell::Empty => {}
            }
        }
    }
    Ok(worksheet)
}

/// Renders the whole store as an xlsx workbook held in memory.
pub fn serialize(store: &GrowStore, today: NaiveDate) -> Result<Vec<u8>> {
    let bold = Format::new().set_bold();
    let date = Format::new().set_num_format(DATE_FORMAT);

    let mut workbook = Workbook::new();
    for sheet in build_sheets(store, today) {
        let worksheet = write_sheet(&sheet, &bold, &date).map_err(export_failed)?;
        workbook.push_worksheet(worksheet);
    }
    workbook.save_to_buffer().map_err(export_failed)
}

fn export_failed(e: impl std::fmt::Display) -> TrackerError {
    error!(error = %e, "export failed");
    TrackerError::ExportFailed(e.to_string())
}

/// File name for an export made at `now`, e.g. `grow_tracker_20240215_143000.xlsx`.
pub fn export_filename(now: NaiveDateTime) -> String {
    format!("grow_tracker_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Writes the export into `dir` and returns the path of the new file.
pub fn write_export(store: &GrowStore, now: NaiveDateTime, dir: &Path) -> Result<PathBuf> {
    let bytes = serialize(store, now.date())?;
    let path = dir.join(export_filename(now));
    std::fs::write(&path, &bytes).map_err(export_failed)?;
    info!(path = %path.display(), bytes = bytes.len(), "export written");
    Ok(path)
}

//! Tabular and JSON export
//!
//! [`CsvExporter`] writes classified records with a selectable column set;
//! columns can be shown or hidden one at a time, and raw record fields can be
//! added as extra columns. Reports and records render as JSON through serde.

use std::collections::BTreeSet;
use std::io::Write;

use knose_core::{ClassificationReport, ClassifiedRecord, FieldValue, GroupReport};

use crate::SchemaResult;

/// One CSV column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    /// Device id
    Device,
    /// Sensor id
    Sensor,
    /// Profile label as written in the store
    Profile,
    /// Timestamp key as written in the store
    Timestamp,
    /// Cycle index
    Cycle,
    /// Seconds since the cycle anchor
    Elapsed,
    /// Sequential step
    Step,
    /// Target heater temperature
    Temperature,
    /// Anomaly flag
    Anomaly,
    /// Record issue, empty for clean records
    Issue,
    /// Raw record field by name
    Field(String),
}

impl Column {
    /// Engine columns in their default order
    pub fn standard() -> Vec<Column> {
        vec![
            Column::Device,
            Column::Sensor,
            Column::Profile,
            Column::Timestamp,
            Column::Cycle,
            Column::Elapsed,
            Column::Step,
            Column::Temperature,
            Column::Anomaly,
            Column::Issue,
        ]
    }

    /// Header text
    pub fn header(&self) -> &str {
        match self {
            Column::Device => "device_id",
            Column::Sensor => "sensor_id",
            Column::Profile => "profile_label",
            Column::Timestamp => "timestamp",
            Column::Cycle => "cycle_index",
            Column::Elapsed => "elapsed_in_cycle_s",
            Column::Step => "step",
            Column::Temperature => "target_temperature_c",
            Column::Anomaly => "is_anomaly",
            Column::Issue => "issue",
            Column::Field(name) => name,
        }
    }

    fn cell(&self, record: &ClassifiedRecord) -> String {
        let reading = &record.reading;
        match self {
            Column::Device => reading.device_id.clone(),
            Column::Sensor => reading.sensor_id.clone(),
            Column::Profile => reading.profile_label.clone(),
            Column::Timestamp => reading.raw_timestamp.clone(),
            Column::Cycle => record.cycle_index.to_string(),
            Column::Elapsed => format!("{:.3}", record.elapsed_in_cycle_s),
            Column::Step => record.step.to_string(),
            Column::Temperature => format!("{:.1}", record.target_temperature_c),
            Column::Anomaly => record.is_anomaly.to_string(),
            Column::Issue => record.issue.map(|i| i.to_string()).unwrap_or_default(),
            Column::Field(name) => reading.fields.get(name).map(field_cell).unwrap_or_default(),
        }
    }
}

fn field_cell(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Text(s) => s.clone(),
    }
}

/// CSV writer for classified records
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExporter {
    columns: Vec<Column>,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvExporter {
    /// Exporter with the engine columns
    pub fn new() -> Self {
        Self {
            columns: Column::standard(),
        }
    }

    /// Exporter with an explicit column list
    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Engine columns followed by every raw field seen in `records`
    pub fn with_record_fields(records: &[ClassifiedRecord]) -> Self {
        let names: BTreeSet<&String> = records.iter().flat_map(|r| r.reading.fields.keys()).collect();
        let mut exporter = Self::new();
        exporter
            .columns
            .extend(names.into_iter().map(|name| Column::Field(name.clone())));
        exporter
    }

    /// Add a column at the end if it is not shown yet
    pub fn show(mut self, column: Column) -> Self {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self
    }

    /// Remove a column
    pub fn hide(mut self, column: &Column) -> Self {
        self.columns.retain(|c| c != column);
        self
    }

    /// Columns in output order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Write a header row and one row per record
    pub fn write<W: Write>(&self, records: &[ClassifiedRecord], writer: W) -> SchemaResult<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.columns.iter().map(Column::header))?;
        for record in records {
            writer.write_record(self.columns.iter().map(|c| c.cell(record)))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Render to a string
    pub fn to_csv_string(&self, records: &[ClassifiedRecord]) -> SchemaResult<String> {
        let mut buffer = Vec::new();
        self.write(records, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Report groups as a pretty-printed JSON array
pub fn report_to_json(report: &ClassificationReport) -> SchemaResult<String> {
    let groups: Vec<&GroupReport> = report.groups().collect();
    Ok(serde_json::to_string_pretty(&groups)?)
}

/// Records as a JSON array
pub fn records_to_json(records: &[ClassifiedRecord]) -> SchemaResult<String> {
    Ok(serde_json::to_string(records)?)
}

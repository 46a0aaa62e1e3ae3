use std::{
    fmt::{self, Display, Formatter},
    io::Write,
};

use crate::resample::Sample;

/// Column names of the flattened table.
pub const COLUMNS: [&str; 3] = ["Address", "Nanos", "Size"];

/// One row per address per step, grouped by address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Sample>,
}

impl Table {
    pub fn new(rows: Vec<Sample>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct addresses in row order.
    pub fn addresses(&self) -> Vec<&str> {
        let mut addresses: Vec<&str> = Vec::new();
        for row in &self.rows {
            if addresses.last() != Some(&row.address.as_str())
                && !addresses.contains(&row.address.as_str())
            {
                addresses.push(&row.address);
            }
        }
        addresses
    }

    /// Write the table as tab-separated text with a header line.
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "{}", COLUMNS.join("\t"))?;
        for row in &self.rows {
            writeln!(writer, "{}\t{}\t{}", row.address, row.timestamp, row.size)?;
        }
        writer.flush()
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|r| r.address.len())
            .max()
            .unwrap_or(0)
            .max(COLUMNS[0].len());

        writeln!(
            f,
            "{:<width$}  {:>12}  {:>10}",
            COLUMNS[0], COLUMNS[1], COLUMNS[2]
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<width$}  {:>12}  {:>10}",
                row.address, row.timestamp, row.size
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(address: &str, timestamp: u64, size: u64) -> Sample {
        Sample {
            address: address.into(),
            timestamp,
            size,
        }
    }

    fn table() -> Table {
        Table::new(vec![
            row("0xB", 0, 8),
            row("0xB", 100, 0),
            row("0xA", 0, 0),
            row("0xA", 100, 64),
        ])
    }

    #[test]
    fn tsv_has_header_and_rows() {
        let mut out = Vec::new();
        table().write_tsv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Address\tNanos\tSize\n0xB\t0\t8\n0xB\t100\t0\n0xA\t0\t0\n0xA\t100\t64\n"
        );
    }

    #[test]
    fn addresses_keep_row_order() {
        assert_eq!(table().addresses(), vec!["0xB", "0xA"]);
    }

    #[test]
    fn display_aligns_columns() {
        let text = table().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Address"));
        assert!(lines[4].starts_with("0xA    "));
        assert!(lines[4].ends_with("64"));
    }
}

use std::path::Path;

use serde::Serialize;

use crate::{error::Result, table::Table};

const TEMPLATE: &str = include_str!("../template.html");
const PLACEHOLDER: &str = "{undefined}";

/// One stacked trace of the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaSeries {
    pub address: String,
    pub nanos: Vec<u64>,
    pub sizes: Vec<u64>,
}

/// Stacked area chart of memory usage: x = nanos, y = size, one stack
/// group per address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackedAreaChart {
    pub title: String,
    pub series: Vec<AreaSeries>,
}

impl StackedAreaChart {
    pub fn from_table(table: &Table, title: impl Into<String>) -> Self {
        let mut series: Vec<AreaSeries> = Vec::new();
        for row in &table.rows {
            let idx = match series.iter().rposition(|s| s.address == row.address) {
                Some(idx) => idx,
                None => {
                    series.push(AreaSeries {
                        address: row.address.clone(),
                        nanos: Vec::new(),
                        sizes: Vec::new(),
                    });
                    series.len() - 1
                }
            };
            series[idx].nanos.push(row.timestamp);
            series[idx].sizes.push(row.size);
        }

        Self {
            title: title.into(),
            series,
        }
    }

    /// Render the chart as a standalone HTML page.
    pub fn to_html(&self) -> Result<String> {
        let data = serde_json::to_string(self)?;
        Ok(TEMPLATE.replace(PLACEHOLDER, &escape_script_json(&data)))
    }

    /// Write an HTML file with the chart at the given path.
    pub fn write_html<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let html = self.to_html()?;
        std::fs::write(path.as_ref(), html)?;
        tracing::info!(path = %path.as_ref().display(), "wrote chart");
        Ok(())
    }
}

/// Escape JSON for an inline `<script>`; the result is still valid JSON.
fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::Sample;
    use pretty_assertions::assert_eq;

    fn table() -> Table {
        let row = |address: &str, timestamp, size| Sample {
            address: address.into(),
            timestamp,
            size,
        };
        Table::new(vec![
            row("0xA", 0, 100),
            row("0xA", 100, 0),
            row("0xB", 0, 0),
            row("0xB", 100, 8),
        ])
    }

    #[test]
    fn groups_rows_by_address() {
        let chart = StackedAreaChart::from_table(&table(), "trace");
        assert_eq!(
            chart.series,
            vec![
                AreaSeries {
                    address: "0xA".into(),
                    nanos: vec![0, 100],
                    sizes: vec![100, 0],
                },
                AreaSeries {
                    address: "0xB".into(),
                    nanos: vec![0, 100],
                    sizes: vec![0, 8],
                },
            ]
        );
    }

    #[test]
    fn html_embeds_chart_data() {
        let html = StackedAreaChart::from_table(&table(), "trace")
            .to_html()
            .unwrap();
        assert!(!html.contains(PLACEHOLDER));
        assert!(html.contains(r#""address":"0xB""#));
        assert!(html.contains(r#""sizes":[100,0]"#));
    }

    #[test]
    fn addresses_cannot_close_the_script_block() {
        let table = Table::new(vec![Sample {
            address: "</script><script>alert(1)</script>".into(),
            timestamp: 0,
            size: 8,
        }]);
        let chart = StackedAreaChart::from_table(&table, "a & b");
        let html = chart.to_html().unwrap();

        assert_eq!(
            html.matches("</script>").count(),
            TEMPLATE.matches("</script>").count()
        );

        let start = html.find("const data = ").unwrap() + "const data = ".len();
        let end = start + html[start..].find(";\n").unwrap();
        let data: serde_json::Value = serde_json::from_str(&html[start..end]).unwrap();
        assert_eq!(data["series"][0]["address"], "</script><script>alert(1)</script>");
        assert_eq!(data["title"], "a & b");
    }
}

use std::fmt::{self, Display};
use std::path::PathBuf;

use patmix_core::utils::split_ext_gz;

/// Per-source line of the diagnostic table.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCoverageEntry {
    pub source: PathBuf,
    pub requested_rate: f64,
    pub original_coverage: f64,
    pub adjusted_rate: f64,
}

impl SourceCoverageEntry {
    pub fn name(&self) -> String {
        split_ext_gz(&self.source)
    }
}

///
/// The numbers a mix is built from, assembled once after the coverages are
/// known. `Display` renders the operator-facing table.
///
#[derive(Debug, Clone, PartialEq)]
pub struct MixStats {
    pub target_coverage: f64,
    pub entries: Vec<SourceCoverageEntry>,
}

impl MixStats {
    pub fn new(
        sources: &[PathBuf],
        rates: &[f64],
        coverages: &[f64],
        adjusted: &[f64],
        target_coverage: f64,
    ) -> Self {
        let entries = sources
            .iter()
            .zip(rates)
            .zip(coverages)
            .zip(adjusted)
            .map(|(((source, rate), coverage), adj)| SourceCoverageEntry {
                source: source.clone(),
                requested_rate: *rate,
                original_coverage: *coverage,
                adjusted_rate: *adj,
            })
            .collect();
        MixStats {
            target_coverage,
            entries,
        }
    }

    /// Sub-sampling probabilities, in source order.
    pub fn adjusted_rates(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.adjusted_rate).collect()
    }
}

const HEADERS: [&str; 3] = ["ReqstRates", "OrigCov", "AdjRates"];

impl Display for MixStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Requested Coverage: {:.2}", self.target_coverage)?;

        let rows: Vec<(String, [String; 3])> = self
            .entries
            .iter()
            .map(|e| {
                (
                    e.name(),
                    [
                        format!("{:.4}", e.requested_rate),
                        format!("{:.2}", e.original_coverage),
                        format!("{:.4}", e.adjusted_rate),
                    ],
                )
            })
            .collect();

        let name_width = rows.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        let widths: Vec<usize> = (0..HEADERS.len())
            .map(|i| {
                rows.iter()
                    .map(|(_, cells)| cells[i].len())
                    .chain(std::iter::once(HEADERS[i].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:name_width$}", "")?;
        for (header, width) in HEADERS.iter().zip(&widths) {
            write!(f, "  {:>width$}", header, width = width)?;
        }
        for (name, cells) in &rows {
            write!(f, "\n{:<name_width$}", name)?;
            for (cell, width) in cells.iter().zip(&widths) {
                write!(f, "  {:>width$}", cell, width = width)?;
            }
        }
        Ok(())
    }
}

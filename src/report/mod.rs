//! Run outputs: intermediate artifacts and chart descriptions.

pub mod charts;
mod sink;

pub use charts::{Chart, ChartData, ChartSink, JsonChartSink};
pub use sink::{Artifact, FileReportSink, ReportSink};

use std::io::{self, Write};

use serde::Serialize;

use crate::app::{AnalysisResult, AtlasResult, ListResult, UploadResult};
use crate::metrics::MetricsSummary;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_analysis(result: &AnalysisResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_upload(result: &UploadResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_metrics(result: &MetricsSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_atlas(result: &AtlasResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl crate::app::ProgressSink for JsonOutput {
    fn event(&self, _event: crate::app::ProgressEvent) {}
}

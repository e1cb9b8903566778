//! JSON export of job, batch and download reports

pub mod json;

pub use json::{to_json_string, write_json, DownloadReport, JobReport, Report, ReportJson};

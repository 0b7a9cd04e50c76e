//! Per-trial export: delimited text for analysis, JSON for archiving.

use crate::config::SessionConfig;
use gonogo_core::{
    ParseError, ReportError, Reporter, SessionLog, SessionSummary, TrialResult,
};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const CSV_HEADER: &str = "Participant ID,Shape,Color,Reaction Time (ms),Error";

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub participant_id: String,
    pub result: TrialResult,
}

/// Renders the log with a fixed header, one row per trial in log order.
/// Omitted reaction times become empty fields.
pub fn to_csv(participant_id: &str, log: &SessionLog) -> String {
    let participant = escape_field(participant_id);
    let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + log.len() * 32);
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for r in log {
        let rt = r.reaction_time_ms.map(|v| v.to_string()).unwrap_or_default();
        csv.push_str(&format!(
            "{participant},{},{},{rt},{}\n",
            r.shape,
            r.color,
            u8::from(r.is_error)
        ));
    }
    csv
}

/// Reads text produced by [`to_csv`] back into rows.
pub fn parse_csv(input: &str) -> Result<Vec<ExportRow>, ParseError> {
    let mut records = split_records(input)?.into_iter();
    match records.next() {
        Some((_, header)) if header.join(",") == CSV_HEADER => {}
        Some((line, _)) => {
            return Err(ParseError::Record {
                line,
                reason: "unexpected header".into(),
            });
        }
        None => {
            return Err(ParseError::Record {
                line: 1,
                reason: "missing header".into(),
            });
        }
    }

    records
        .filter(|(_, fields)| !(fields.len() == 1 && fields[0].is_empty()))
        .map(|(line, fields)| parse_row(line, fields))
        .collect()
}

fn parse_row(line: usize, fields: Vec<String>) -> Result<ExportRow, ParseError> {
    let bad = |reason: String| ParseError::Record { line, reason };
    let [participant_id, shape, color, rt, err]: [String; 5] = fields
        .try_into()
        .map_err(|f: Vec<String>| bad(format!("expected 5 fields, found {}", f.len())))?;

    let reaction_time_ms = if rt.is_empty() {
        None
    } else {
        Some(
            rt.parse::<u64>()
                .map_err(|e| bad(format!("reaction time '{rt}': {e}")))?,
        )
    };
    let is_error = match err.as_str() {
        "0" => false,
        "1" => true,
        other => return Err(bad(format!("error flag '{other}' is not 0 or 1"))),
    };

    Ok(ExportRow {
        participant_id,
        result: TrialResult {
            shape: shape.parse()?,
            color: color.parse()?,
            reaction_time_ms,
            is_error,
        },
    })
}

fn escape_field(value: &str) -> String {
    let needs_quotes = value.contains(&[',', '"', '\n', '\r'][..]);
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Splits delimited text into records of fields, honouring quoted fields
/// that contain separators, quotes or line breaks. Each record carries the
/// line it started on.
fn split_records(input: &str) -> Result<Vec<(usize, Vec<String>)>, ParseError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match (in_quotes, ch) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            (true, '"') => in_quotes = false,
            (true, c) => {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
            (false, '"') if field.is_empty() => in_quotes = true,
            (false, ',') => fields.push(std::mem::take(&mut field)),
            (false, '\r') if chars.peek() == Some(&'\n') => {}
            (false, '\n') => {
                fields.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut fields)));
                line += 1;
                record_line = line;
            }
            (false, c) => field.push(c),
        }
    }

    if in_quotes {
        return Err(ParseError::Record {
            line: record_line,
            reason: "unterminated quoted field".into(),
        });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push((record_line, fields));
    }
    Ok(records)
}

#[derive(Serialize)]
struct SessionRecord<'a> {
    participant_id: &'a str,
    config: &'a SessionConfig,
    summary: &'a SessionSummary,
    results: &'a SessionLog,
}

/// Writes `participant_<id>_results.csv` and `participant_<id>_session.json`
/// into the output directory when the session finishes. Existing files are
/// never replaced: later sessions get ` (1)`, ` (2)`, ... before the extension.
#[derive(Debug, Clone)]
pub struct CsvReporter {
    participant_id: String,
    output_dir: PathBuf,
    config: SessionConfig,
    written: Vec<PathBuf>,
}

impl CsvReporter {
    pub fn new(
        participant_id: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        config: SessionConfig,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            output_dir: output_dir.into(),
            config,
            written: Vec::new(),
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn file_stem(&self) -> String {
        let safe: String = self
            .participant_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("participant_{safe}")
    }

    /// First pair of result paths where neither file exists yet.
    fn free_paths(&self, stem: &str) -> (PathBuf, PathBuf) {
        (0usize..)
            .map(|n| {
                let suffix = if n == 0 { String::new() } else { format!(" ({n})") };
                (
                    self.output_dir.join(format!("{stem}_results{suffix}.csv")),
                    self.output_dir.join(format!("{stem}_session{suffix}.json")),
                )
            })
            .find(|(csv, json)| !csv.exists() && !json.exists())
            .unwrap_or_default()
    }

    fn write(&mut self, path: PathBuf, contents: &[u8]) -> Result<(), ReportError> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut file| file.write_all(contents))
            .inspect_err(|e| {
                error!(path = %path.display(), error = %e, "failed to write results");
            })?;
        info!(path = %path.display(), "results saved");
        self.written.push(path);
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl Reporter for CsvReporter {
    fn session_finished(
        &mut self,
        log: &SessionLog,
        summary: &SessionSummary,
    ) -> Result<(), ReportError> {
        fs::create_dir_all(&self.output_dir)?;
        let (csv_path, json_path) = self.free_paths(&self.file_stem());

        let csv = to_csv(&self.participant_id, log);
        self.write(csv_path, csv.as_bytes())?;

        let record = SessionRecord {
            participant_id: &self.participant_id,
            config: &self.config,
            summary,
            results: log,
        };
        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| ReportError::Encode(e.to_string()))?;
        self.write(json_path, &json)?;

        info!(
            participant = %self.participant_id,
            "Average Reaction Time: {:.2} ms, Total Errors: {}",
            summary.mean_correct_reaction_time_ms,
            summary.total_errors
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonogo_core::{Color, Shape};

    fn sample_log() -> SessionLog {
        [
            TrialResult {
                shape: Shape::Circle,
                color: Color::Red,
                reaction_time_ms: Some(350),
                is_error: false,
            },
            TrialResult {
                shape: Shape::Cross,
                color: Color::Orange,
                reaction_time_ms: None,
                is_error: false,
            },
            TrialResult {
                shape: Shape::Circle,
                color: Color::Blue,
                reaction_time_ms: None,
                is_error: true,
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn csv_has_header_and_empty_omissions() {
        let csv = to_csv("P01", &sample_log());
        assert_eq!(
            csv,
            "Participant ID,Shape,Color,Reaction Time (ms),Error\n\
             P01,circle,red,350,0\n\
             P01,X,orange,,0\n\
             P01,circle,blue,,1\n"
        );
    }

    #[test]
    fn csv_reads_back_losslessly() {
        let log = sample_log();
        for participant in ["P01", "Doe, Jane", "say \"hi\"", "two\nlines"] {
            let rows = parse_csv(&to_csv(participant, &log)).unwrap();
            assert!(rows.iter().all(|r| r.participant_id == participant));
            let back: SessionLog = rows.into_iter().map(|r| r.result).collect();
            assert_eq!(back, log);
        }
    }

    #[test]
    fn empty_log_is_just_the_header() {
        let csv = to_csv("P01", &SessionLog::new());
        assert_eq!(csv, format!("{CSV_HEADER}\n"));
        assert!(parse_csv(&csv).unwrap().is_empty());
    }

    #[test]
    fn tolerates_crlf_and_missing_final_newline() {
        let text = "Participant ID,Shape,Color,Reaction Time (ms),Error\r\nP9,square,green,412,0";
        let rows = parse_csv(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].result.reaction_time_ms, Some(412));
        assert_eq!(rows[0].result.shape, Shape::Square);
    }

    #[test]
    fn malformed_rows_report_their_line() {
        let wrong_header = "id,shape\nP1,circle\n";
        assert!(matches!(
            parse_csv(wrong_header),
            Err(ParseError::Record { line: 1, .. })
        ));

        let bad_flag = format!("{CSV_HEADER}\nP1,circle,red,300,0\nP1,circle,red,300,2\n");
        assert!(matches!(
            parse_csv(&bad_flag),
            Err(ParseError::Record { line: 3, .. })
        ));

        let short = format!("{CSV_HEADER}\nP1,circle,red\n");
        assert!(matches!(
            parse_csv(&short),
            Err(ParseError::Record { line: 2, .. })
        ));

        let bad_shape = format!("{CSV_HEADER}\nP1,hexagon,red,,0\n");
        assert_eq!(
            parse_csv(&bad_shape),
            Err(ParseError::UnknownShape("hexagon".into()))
        );

        assert!(parse_csv("").is_err());
        assert!(parse_csv(&format!("{CSV_HEADER}\n\"P1,circle")).is_err());
    }

    #[test]
    fn reporter_writes_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        let mut reporter = CsvReporter::new("P 07/a", &out, SessionConfig::default());
        let log = sample_log();
        let summary = SessionSummary::from_log(&log);

        reporter.session_finished(&log, &summary).unwrap();

        let csv_path = out.join("participant_P_07_a_results.csv");
        let json_path = out.join("participant_P_07_a_session.json");
        assert_eq!(reporter.written(), [csv_path.clone(), json_path.clone()]);

        let rows = parse_csv(&fs::read_to_string(&csv_path).unwrap()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].participant_id, "P 07/a");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["participant_id"], "P 07/a");
        assert_eq!(json["summary"]["total_errors"], 1);
        assert_eq!(json["summary"]["mean_correct_reaction_time_ms"], 350.0);
        assert_eq!(json["results"][1]["shape"], "X");
        assert!(json["results"][1]["reaction_time_ms"].is_null());
        assert_eq!(json["config"]["mode"], "icon");
    }

    #[test]
    fn later_sessions_never_replace_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = sample_log();
        let second: SessionLog = first.iter().rev().copied().collect();

        for log in [&first, &second] {
            let mut reporter = CsvReporter::new("P1", dir.path(), SessionConfig::default());
            reporter
                .session_finished(log, &SessionSummary::from_log(log))
                .unwrap();
        }

        let read = |name: &str| -> SessionLog {
            let text = fs::read_to_string(dir.path().join(name)).unwrap();
            parse_csv(&text).unwrap().into_iter().map(|r| r.result).collect()
        };
        assert_eq!(read("participant_P1_results.csv"), first);
        assert_eq!(read("participant_P1_results (1).csv"), second);
        assert!(dir.path().join("participant_P1_session.json").exists());
        assert!(dir.path().join("participant_P1_session (1).json").exists());
    }

    #[test]
    fn ids_that_sanitise_alike_keep_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = sample_log();
        let summary = SessionSummary::from_log(&log);
        let mut written = Vec::new();
        for id in ["P/1", "P_1"] {
            let mut reporter = CsvReporter::new(id, dir.path(), SessionConfig::default());
            reporter.session_finished(&log, &summary).unwrap();
            written.push(reporter.written()[0].clone());
        }

        assert_ne!(written[0], written[1]);
        for (path, id) in written.iter().zip(["P/1", "P_1"]) {
            let rows = parse_csv(&fs::read_to_string(path).unwrap()).unwrap();
            assert!(rows.iter().all(|r| r.participant_id == id));
        }
    }
}

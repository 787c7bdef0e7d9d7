//! Labelled text datasets loaded from CSV.
//!
//! Rows are `label,text`. A header row naming `label` and `text` columns is
//! recognised in any column order; without one the first two columns are
//! taken as label and text. Quoted fields may contain commas, newlines, and
//! doubled quotes.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{Result, TrainError};

/// One labelled text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextExample {
    /// Class label.
    pub label: i64,
    /// Raw text.
    pub text: String,
}

/// In-memory labelled text dataset.
#[derive(Clone, Debug, Default)]
pub struct TextDataset {
    examples: Vec<TextExample>,
}

impl TextDataset {
    /// Wrap already-loaded examples.
    pub fn new(examples: Vec<TextExample>) -> Self {
        Self { examples }
    }

    /// Load a CSV file. `~/` is expanded to the home directory.
    pub fn from_csv(path: &str) -> Result<Self> {
        let resolved = expand_home(path);
        debug!(path = %resolved.display(), "loading dataset");
        let content = std::fs::read_to_string(&resolved)?;
        let dataset = Self::parse_csv(&content)?;
        info!(path = %resolved.display(), rows = dataset.len(), "dataset loaded");
        Ok(dataset)
    }

    /// Parse CSV content into a dataset.
    pub fn parse_csv(content: &str) -> Result<Self> {
        let mut records = parse_records(content)?.into_iter().peekable();

        let header = match records.peek() {
            Some((_, first)) => header_columns(first),
            None => return Ok(Self::default()),
        };
        let (label_col, text_col) = match header {
            Some(cols) => {
                let _ = records.next();
                cols
            }
            None => (0, 1),
        };

        let mut examples = Vec::new();
        for (line, fields) in records {
            let raw_label = fields.get(label_col).ok_or_else(|| TrainError::Data {
                line,
                reason: "missing label column".into(),
            })?;
            let label = raw_label.trim().parse::<i64>().map_err(|_| TrainError::Data {
                line,
                reason: format!("label {raw_label:?} is not an integer"),
            })?;
            let text = fields.get(text_col).ok_or_else(|| TrainError::Data {
                line,
                reason: "missing text column".into(),
            })?;
            examples.push(TextExample {
                label,
                text: text.clone(),
            });
        }
        Ok(Self { examples })
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Example at `index`.
    pub fn get(&self, index: usize) -> Option<&TextExample> {
        self.examples.get(index)
    }

    /// All examples in file order.
    pub fn examples(&self) -> &[TextExample] {
        &self.examples
    }
}

/// Expand a leading `~/` to `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn header_columns(header: &[String]) -> Option<(usize, usize)> {
    let find = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    Some((find("label")?, find("text")?))
}

/// Split CSV content into records, each tagged with its starting line.
fn parse_records(content: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    let _ = chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(TrainError::Data {
            line: record_line,
            reason: "unterminated quoted field".into(),
        });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        push_record(&mut records, record_line, fields);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>) {
    // blank line
    if fields.len() == 1 && fields[0].trim().is_empty() {
        return;
    }
    records.push((line, fields));
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_header_and_rows() {
        let ds = TextDataset::parse_csv("label,text\n1,great food\n0,cold fries\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.get(0),
            Some(&TextExample {
                label: 1,
                text: "great food".into()
            })
        );
        assert_eq!(ds.get(1).unwrap().label, 0);
    }

    #[test]
    fn header_in_any_order() {
        let ds = TextDataset::parse_csv("text,Label\nnice,4\n").unwrap();
        assert_eq!(ds.examples()[0].label, 4);
        assert_eq!(ds.examples()[0].text, "nice");
    }

    #[test]
    fn headerless_defaults_to_label_text() {
        let ds = TextDataset::parse_csv("5,\"loved it\"\n1,meh").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.examples()[1].text, "meh");
    }

    #[test]
    fn quoted_fields_with_commas_newlines_and_quotes() {
        let csv = "label,text\n3,\"a, b\nc \"\"quoted\"\"\"\n2,plain\n";
        let ds = TextDataset::parse_csv(csv).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.examples()[0].text, "a, b\nc \"quoted\"");
        assert_eq!(ds.examples()[1].label, 2);
    }

    #[test]
    fn crlf_and_blank_lines() {
        let ds = TextDataset::parse_csv("label,text\r\n1,x\r\n\r\n2,y\r\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.examples()[0].text, "x");
    }

    #[test]
    fn bad_label_reports_line() {
        let err = TextDataset::parse_csv("label,text\n1,ok\n\"multi\nline\",x\n").unwrap_err();
        assert_matches!(err, TrainError::Data { line: 3, .. });
    }

    #[test]
    fn missing_text_column() {
        let err = TextDataset::parse_csv("label,text\n1\n").unwrap_err();
        assert_matches!(err, TrainError::Data { line: 2, reason } if reason.contains("text"));
    }

    #[test]
    fn unterminated_quote() {
        let err = TextDataset::parse_csv("label,text\n1,\"open").unwrap_err();
        assert_matches!(err, TrainError::Data { line: 2, .. });
    }

    #[test]
    fn empty_content() {
        assert!(TextDataset::parse_csv("").unwrap().is_empty());
    }

    #[test]
    fn from_csv_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(&path, "label,text\n1,a\n2,b\n").unwrap();
        let ds = TextDataset::from_csv(path.to_str().unwrap()).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn from_csv_missing_file_is_io() {
        let err = TextDataset::from_csv("/nonexistent/train.csv").unwrap_err();
        assert_matches!(err, TrainError::Io(_));
    }

    #[test]
    fn expand_home_only_prefix() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        let expanded = expand_home("~/data/yelp/train.csv");
        assert!(expanded.ends_with("data/yelp/train.csv"));
        assert!(!expanded.starts_with("~"));
    }
}

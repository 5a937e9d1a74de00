use std::fs;
use std::mem;
use std::path::Path;

use serde::Deserialize;

use crate::error::SgptError;

/// Accepted shapes of a JSON question file.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionsJson {
    Wrapped { questions: Vec<String> },
    Plain(Vec<String>),
    Records(Vec<QuestionRecord>),
}

#[derive(Deserialize)]
struct QuestionRecord {
    question: String,
}

/// Reads the questions of a batch file, choosing the format by extension.
/// Unknown extensions are read as plain text.
pub fn read_questions(path: &Path) -> Result<Vec<String>, SgptError> {
    if !path.is_file() {
        return Err(SgptError::MalformedInput(format!(
            "question file {} does not exist",
            path.display()
        )));
    }
    let contents = fs::read_to_string(path).map_err(|err| {
        SgptError::MalformedInput(format!("failed to read {}: {err}", path.display()))
    })?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => parse_json(&contents).map_err(|err| {
            SgptError::MalformedInput(format!("{}: {err}", path.display()))
        }),
        Some("csv") => Ok(parse_csv(&contents)),
        _ => Ok(parse_txt(&contents)),
    }
}

/// One question per line, skipping blank lines and `#` comments.
fn parse_txt(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn parse_json(contents: &str) -> Result<Vec<String>, String> {
    let parsed: QuestionsJson = serde_json::from_str(contents).map_err(|_| {
        "expected {\"questions\": [...]}, a list of strings, or [{\"question\": \"...\"}, ...]"
            .to_string()
    })?;
    Ok(match parsed {
        QuestionsJson::Wrapped { questions } | QuestionsJson::Plain(questions) => questions,
        QuestionsJson::Records(records) => records.into_iter().map(|r| r.question).collect(),
    })
}

/// First column of every record after the header.
fn parse_csv(contents: &str) -> Vec<String> {
    csv_records(contents)
        .into_iter()
        .skip(1)
        .filter_map(|record| record.into_iter().next())
        .map(|field| field.trim().to_string())
        .filter(|field| !field.is_empty())
        .collect()
}

/// Splits CSV text into records. Quoted fields may hold commas, doubled
/// quotes and line breaks.
fn csv_records(contents: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = contents.chars().peekable();
    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => quoted = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            ',' => record.push(mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(mem::take(&mut field));
                records.push(mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

use crate::domain::analysis::AnalysisRecord;
use anyhow::Context;
use std::path::Path;

/// Append a success row to the results CSV and return the persisted record.
pub fn append_success(
    path: impl AsRef<Path>,
    query: &str,
    response: &str,
) -> anyhow::Result<AnalysisRecord> {
    let record = AnalysisRecord::success(query, response);
    append_record(path, &record)?;
    Ok(record)
}

/// Append a failure row so every run, successful or not, is on record.
pub fn append_failure(
    path: impl AsRef<Path>,
    query: &str,
    error: &str,
) -> anyhow::Result<AnalysisRecord> {
    let record = AnalysisRecord::failure(query, error);
    append_record(path, &record)?;
    Ok(record)
}

pub fn append_record(path: impl AsRef<Path>, record: &AnalysisRecord) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    // Header goes in only when the file is new or empty.
    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open results file {}", path.display()))?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    wtr.serialize(record)
        .with_context(|| format!("failed to append result row to {}", path.display()))?;
    wtr.flush()
        .with_context(|| format!("failed to flush results file {}", path.display()))?;

    tracing::debug!(run_id = %record.run_id, path = %path.display(), "appended analysis result");
    Ok(())
}

/// Read back the full analysis history. A results file that does not exist
/// yet is an empty history, not an error.
pub fn load_results(path: impl AsRef<Path>) -> anyhow::Result<Vec<AnalysisRecord>> {
    let path = path.as_ref();
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to open {}", path.display()));
        }
    };

    let mut rdr = csv::Reader::from_reader(file);
    let mut out = Vec::new();
    for row in rdr.deserialize::<AnalysisRecord>() {
        out.push(row.with_context(|| format!("invalid result row in {}", path.display()))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::RunStatus;

    fn temp_results_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("stocksense_results_{}.csv", uuid::Uuid::new_v4()))
    }

    #[test]
    fn appends_rows_and_reads_them_back() {
        let path = temp_results_path();

        let a = append_success(&path, "highest price?", "MSFT at $402.10").unwrap();
        let b = append_failure(&path, "bad question", "Groq request failed").unwrap();

        let rows = load_results(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].run_id, a.run_id);
        assert_eq!(rows[0].status, RunStatus::Success);
        assert_eq!(rows[0].response, "MSFT at $402.10");
        assert_eq!(rows[1].run_id, b.run_id);
        assert_eq!(rows[1].status, RunStatus::Error);
        assert_eq!(rows[1].error.as_deref(), Some("Groq request failed"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn header_is_written_only_once() {
        let path = temp_results_path();

        append_success(&path, "q1", "a1").unwrap();
        append_success(&path, "q2", "a2").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let headers = contents
            .lines()
            .filter(|l| l.starts_with("run_id,"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(contents.lines().count(), 3);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_results_file_is_empty_history() {
        let rows = load_results(temp_results_path()).unwrap();
        assert!(rows.is_empty());
    }
}

//! CSV exports of the mapping store.
//!
//! Two artifacts: the full source → published-URL mapping, and a secondary
//! file of descriptions for sources that were local files. Both are written
//! to a temporary sibling and renamed into place so readers never observe a
//! partial file.

use std::io::Write;
use std::path::Path;

use tracing::info;

use super::types::{MappingError, MappingRecord};

const MAPPING_HEADER: &str =
    "source_id,published_url,max_width,quality,smart_format_enabled,description_text";
const LOCAL_HEADER: &str = "filename,published_url,description_text";

/// Write the full mapping as CSV.
pub fn export_mapping_csv(records: &[MappingRecord], path: &Path) -> Result<(), MappingError> {
    let mut out = String::with_capacity(records.len() * 96);
    out.push_str(MAPPING_HEADER);
    out.push('\n');

    for record in records {
        let max_width = record
            .spec
            .max_width
            .map(|w| w.to_string())
            .unwrap_or_default();
        let quality = record.spec.quality.to_string();
        let row = [
            record.source_id.as_str(),
            record.artifact.public_url.as_str(),
            max_width.as_str(),
            quality.as_str(),
            if record.spec.smart_format { "true" } else { "false" },
            record.description_text(),
        ];
        push_row(&mut out, &row);
    }

    write_atomic(path, out.as_bytes())?;
    info!("Exported {} mapping rows to {}", records.len(), path.display());
    Ok(())
}

/// Write descriptions of local-file sources as CSV.
pub fn export_local_descriptions_csv(
    records: &[MappingRecord],
    path: &Path,
) -> Result<(), MappingError> {
    let locals: Vec<&MappingRecord> = records.iter().filter(|r| r.is_local_source()).collect();

    let mut out = String::new();
    out.push_str(LOCAL_HEADER);
    out.push('\n');

    for record in &locals {
        let filename = Path::new(&record.source_id)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.source_id.clone());
        let row = [
            filename.as_str(),
            record.artifact.public_url.as_str(),
            record.description_text(),
        ];
        push_row(&mut out, &row);
    }

    write_atomic(path, out.as_bytes())?;
    info!(
        "Exported {} local-file description rows to {}",
        locals.len(),
        path.display()
    );
    Ok(())
}

fn push_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(field));
    }
    out.push('\n');
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write to a temporary sibling, then rename over the target.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), MappingError> {
    let tmp = path.with_extension("csv.tmp");
    let io_err = |source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::create(&tmp).map_err(io_err)?;
    file.write_all(contents).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;
    use crate::describer::Description;
    use crate::optimizer::OptimizationSpec;
    use crate::publisher::PublishedArtifact;

    fn record(source_id: &str, description: Option<Description>) -> MappingRecord {
        MappingRecord::new(
            source_id,
            PublishedArtifact {
                backend: BackendKind::Cloudinary,
                public_url: "https://res.example.com/a_1".to_string(),
                remote_name: "a_1".to_string(),
                extra: serde_json::Value::Null,
            },
            OptimizationSpec::new(Some(600), 82, true),
            description,
        )
    }

    #[test]
    fn test_mapping_csv_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images_mapping.csv");
        let records = vec![
            record("https://ex.com/a.jpg", None),
            record(
                "https://ex.com/b.jpg",
                Some(Description::complete("a red ball", vec![])),
            ),
        ];

        export_mapping_csv(&records, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines[0], MAPPING_HEADER);
        assert_eq!(
            lines[1],
            "https://ex.com/a.jpg,https://res.example.com/a_1,600,82,true,"
        );
        assert!(lines[2].ends_with(",a red ball"));
    }

    #[test]
    fn test_failed_description_exports_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.csv");
        let records = vec![record(
            "https://ex.com/a.jpg",
            Some(Description::failed(vec![])),
        )];

        export_mapping_csv(&records, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.lines().nth(1).unwrap().ends_with(",true,"));
    }

    #[test]
    fn test_local_descriptions_filters_remote_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.csv");
        let records = vec![
            record("https://ex.com/a.jpg", None),
            record(
                "data/local_images/cat.png",
                Some(Description::complete("a cat", vec![])),
            ),
        ];

        export_local_descriptions_csv(&records, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "cat.png,https://res.example.com/a_1,a cat");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.csv");
        let records = vec![record(
            "https://ex.com/a.jpg",
            Some(Description::complete("a dog, running", vec![])),
        )];

        export_mapping_csv(&records, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"a dog, running\""));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.csv");
        export_mapping_csv(&[], &path).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["mapping.csv".to_string()]);
    }
}

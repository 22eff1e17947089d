use std::io::Write;

use tabular_ingestion::IngestionError;
use tabular_ingestion::ingestion::{
    BatchOptions, IngestionOptions, IngestionRequest, UploadProfile, ingest_batch, ingest_from_path,
    ingest_with_options,
};
use tabular_ingestion::types::{FieldSchema, FieldSpec, FieldType, RejectionPolicy, Value};

fn people_schema() -> FieldSchema {
    FieldSchema::new(vec![
        FieldSpec::required("id", FieldType::Integer),
        FieldSpec::required("name", FieldType::String),
        FieldSpec::required("email", FieldType::String),
        FieldSpec::optional("balance", FieldType::Decimal),
        FieldSpec::required("joined", FieldType::Date),
    ])
}

#[test]
fn unified_ingest_csv_by_extension() {
    let report = ingest_from_path("tests/fixtures/people.csv", &people_schema(), &IngestionOptions::default()).unwrap();
    assert_eq!(report.total_rows(), 2);
    assert_eq!(report.accepted()[0].get("id"), Some(&Value::Integer(1)));
}

#[test]
fn unified_ingest_tsv_infers_tab_delimiter() {
    let report = ingest_from_path("tests/fixtures/people.tsv", &people_schema(), &IngestionOptions::default()).unwrap();
    assert_eq!(report.total_rows(), 2);
    assert!(report.is_clean());
    assert_eq!(
        report.accepted()[1].get("name"),
        Some(&Value::String("Bob".to_string()))
    );
}

#[test]
fn explicit_delimiter_overrides_extension() {
    let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
    write!(file, "id|name\n1|Ada\n").unwrap();
    file.flush().unwrap();

    let schema = FieldSchema::new(vec![
        FieldSpec::required("id", FieldType::Integer),
        FieldSpec::required("name", FieldType::String),
    ]);
    let opts = IngestionOptions {
        delimiter: b'|',
        ..Default::default()
    };
    let report = ingest_from_path(file.path(), &schema, &opts).unwrap();
    assert_eq!(report.accepted().len(), 1);
}

#[test]
fn comma_delimiter_is_replaced_on_tsv_paths() {
    let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
    write!(file, "id,name\n1,Ada\n").unwrap();
    file.flush().unwrap();

    let schema = FieldSchema::new(vec![FieldSpec::required("id", FieldType::Integer)]);
    let opts = IngestionOptions {
        delimiter: b',',
        ..Default::default()
    };
    // Read as tab-separated, the single header cell is "id,name".
    let report = ingest_from_path(file.path(), &schema, &opts).unwrap();
    assert_eq!(report.total_rows(), 1);
    assert_eq!(report.rejected_count(), 1);
    assert_eq!(report.errors()[0].field.as_deref(), Some("id"));

    let body = std::fs::read(file.path()).unwrap();
    let report = ingest_with_options(body.as_slice(), &schema, &opts).unwrap();
    assert_eq!(report.accepted()[0].get("id"), Some(&Value::Integer(1)));
}

#[test]
fn missing_file_is_io_error() {
    let err = ingest_from_path("tests/fixtures/nope.csv", &people_schema(), &IngestionOptions::default()).unwrap_err();
    assert!(matches!(err, IngestionError::Io(_)));
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.public_message(), "internal error while processing upload");
}

#[test]
fn profile_fixture_drives_ingestion() {
    let profile = UploadProfile::from_path("tests/fixtures/people_profile.json").unwrap();
    let opts = profile.options().unwrap();

    let ok = ingest_from_path("tests/fixtures/people.csv", &profile.schema, &opts).unwrap();
    assert_eq!(ok.status_code(profile.rejection_policy), 200);

    let mixed = ingest_from_path("tests/fixtures/mixed.csv", &profile.schema, &opts).unwrap();
    assert_eq!(mixed.rejected_count(), 3);
    assert_eq!(mixed.status_code(profile.rejection_policy), 422);
    assert_eq!(mixed.status_code(RejectionPolicy::Lenient), 200);
}

#[test]
fn batch_isolates_failures_and_keeps_order() {
    let schema = FieldSchema::new(vec![FieldSpec::required("id", FieldType::Integer)]);
    let requests = vec![
        IngestionRequest::new("id\n1\n2\n", schema.clone(), IngestionOptions::default()),
        IngestionRequest::new("", schema.clone(), IngestionOptions::default()),
        IngestionRequest::new(b"id\n\xff\n".to_vec(), schema.clone(), IngestionOptions::default()),
        IngestionRequest::new("id\nx\n3\n", schema, IngestionOptions::default()),
    ];

    let results = ingest_batch(&requests, &BatchOptions { num_threads: Some(2) }).unwrap();
    assert_eq!(results.len(), 4);

    let first = results[0].as_ref().unwrap();
    assert_eq!(first.accepted().len(), 2);
    assert!(matches!(results[1], Err(IngestionError::MalformedHeader { .. })));
    assert!(matches!(results[2], Err(IngestionError::Decoding { .. })));
    let last = results[3].as_ref().unwrap();
    assert_eq!(last.total_rows(), 2);
    assert_eq!(last.rejected_count(), 1);
}

#[test]
fn report_serializes_to_json_for_http_callers() {
    let report = ingest_from_path("tests/fixtures/mixed.csv", &people_schema(), &IngestionOptions::default()).unwrap();
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();

    assert_eq!(json["total_rows"], 5);
    assert_eq!(json["rejected_count"], 3);
    assert_eq!(json["accepted"][0]["values"]["balance"], "12.50");
    assert_eq!(json["accepted"][0]["values"]["joined"], "2025-09-20");
    assert_eq!(json["errors"][3]["field"], serde_json::Value::Null);
    assert_eq!(json["errors"][3]["message"], "column count mismatch");
}

use leadflow::{
    BatchImporter, ImportReport, InMemoryLeadStore, NormalizerConfig, ProjectRegistryEntry,
    normalize_row, normalize_rows, parse_table,
};

const SHEET: &str = "\u{feff}fullname,Contact,Type,call_status,Project-Name\n\
    Asha,+91 99999 99999,high,new,Skyline\n\
    \n\
    \"Ravi, K\",88888-88888,Medium,hot,oceanview\n\
    Asha again,919999999999,low,cold,skyline towers\n\
    Meera,7777777777,,,Riverside\n\
    ,,fake,completed,Skyline\n\
    Meera B,77777 77777,cold,callback,Hilltop\n";

fn registry() -> Vec<ProjectRegistryEntry> {
    vec![
        ProjectRegistryEntry::new("p-sky", "Skyline Towers").with_keywords(["skyline"]),
        ProjectRegistryEntry::new("p-ocean", "Oceanview"),
    ]
}

async fn run_once() -> ImportReport {
    let store = InMemoryLeadStore::new();
    BatchImporter::default()
        .import_text(SHEET, &registry(), &store)
        .await
        .expect("sheet is well formed")
}

#[tokio::test]
async fn repeated_imports_produce_identical_reports() {
    let first = run_once().await;
    let second = run_once().await;

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}

#[tokio::test]
async fn mixed_sheet_balances() {
    let report = run_once().await;

    assert_eq!(report.total_uploaded, 6);
    assert_eq!(report.invalid_rows.len(), 1);
    // Asha again: same digits, "skyline towers" resolves to the same project.
    // Meera B: unresolved Hilltop shares the no-project bucket with Riverside.
    assert_eq!(report.csv_duplicates_removed.len(), 2);
    assert_eq!(report.accepted.len(), 3);
    assert_eq!(report.successfully_saved, 3);
    assert!(report.is_balanced());

    let names: Vec<_> = report.accepted.iter().map(|l| l.full_name.as_str()).collect();
    assert_eq!(names, vec!["Asha", "Ravi, K", "Meera"]);
}

#[test]
fn normalizing_canonical_rows_is_idempotent() {
    let cfg = NormalizerConfig::default();
    let rows = parse_table(SHEET).expect("sheet parses");
    let batch = normalize_rows(&rows, &cfg);

    for (idx, lead) in batch.leads.iter().enumerate() {
        let again = normalize_row(&lead.to_raw_row(idx + 2), &cfg).expect("canonical row is valid");
        assert_eq!(&again, lead);
    }
}

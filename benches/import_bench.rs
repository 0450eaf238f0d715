use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use leadflow::{BatchImporter, ProjectRegistryEntry, parse_table};
use std::hint::black_box;

const PROJECTS: [&str; 4] = ["Skyline", "oceanview", "green acres", "Riverside"];

/// Sheet with `rows` data rows; roughly one row in ten repeats an earlier phone.
fn generate_sheet(rows: usize) -> String {
    let mut sheet = String::from("Name,Phone,Priority,Status,project_name\n");
    for i in 0..rows {
        let phone = if i % 10 == 9 { i - 1 } else { i };
        sheet.push_str(&format!(
            "Lead {i},+91 {:010},high,new,{}\n",
            9_000_000_000u64 + phone as u64,
            PROJECTS[i % PROJECTS.len()]
        ));
    }
    sheet
}

fn registry() -> Vec<ProjectRegistryEntry> {
    vec![
        ProjectRegistryEntry::new("p-sky", "Skyline Towers").with_keywords(["skyline", "tower"]),
        ProjectRegistryEntry::new("p-ocean", "Oceanview"),
        ProjectRegistryEntry::new("p-green", "Green Acres").with_keywords(["garden"]),
    ]
}

/// Benchmark parsing plus normalize/resolve/dedupe at different sheet sizes
fn bench_prepare(c: &mut Criterion) {
    let importer = BatchImporter::default();
    let registry = registry();
    let mut group = c.benchmark_group("import_prepare");

    for rows in [100usize, 1_000, 10_000] {
        let sheet = generate_sheet(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &sheet, |b, sheet| {
            b.iter(|| {
                let parsed = parse_table(black_box(sheet)).expect("sheet parses");
                importer.prepare(&parsed, black_box(&registry))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_prepare);
criterion_main!(benches);

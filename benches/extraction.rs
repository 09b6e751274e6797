//! Report extraction benchmarks
//!
//! Benchmarks for the reduction phase hot path:
//! - Scanning flat power reports (every line against every rule)
//! - Reduce + derive per work item
//! - Breakdown table assembly
//!
//! Toyota Way: Measure before optimizing (Genchi Genbutsu)

use auto_sweep::breakdown::BreakdownTable;
use auto_sweep::config::Family;
use auto_sweep::extract::Catalogue;
use auto_sweep::metrics::{AreaKey, MetricSet, PowerKey};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Flat power report with `registers` register rows under the hierarchy rows
fn power_report(registers: usize) -> String {
    let mut report = String::from(
        "top_L4_mac   3000  0.01 0.20 0.30 0.40 900000.0\n\
         \x20 L4         2500  0.01 0.20 0.30 0.40 800000.0\n\
         \x20 L4_mult    2000  0.01 0.10 0.20 0.30 600000.0\n",
    );
    for i in 0..registers {
        let _ = writeln!(report, "L4/acc_reg[{i}]  0.1 0.2 {}.0", i % 97);
        let _ = writeln!(report, "  mult_2b_{i}  mult  12  0.00 0.00 0.00 0.00 {}.5", i % 13);
        let _ = writeln!(report, "U{i}/Y  NAND2X1  0.001  0.002  0.003");
    }
    report
}

fn bench_power_scan(c: &mut Criterion) {
    let catalogue = Catalogue::<PowerKey>::builtin().unwrap();
    let mut group = c.benchmark_group("power_scan");
    for registers in [100, 1_000, 10_000] {
        let report = power_report(registers);
        group.bench_with_input(BenchmarkId::from_parameter(registers), &report, |b, report| {
            b.iter(|| catalogue.scan(black_box(report).lines()));
        });
    }
    group.finish();
}

fn bench_reduce_derive(c: &mut Criterion) {
    let catalogue = Catalogue::<PowerKey>::builtin().unwrap();
    let samples = catalogue.extract("bench", &power_report(1_000));
    c.bench_function("reduce_and_derive_power", |b| {
        b.iter(|| black_box(&samples).reduce_and_derive());
    });
}

fn bench_area_table(c: &mut Criterion) {
    let catalogue = Catalogue::<AreaKey>::builtin().unwrap();
    let designs = Family::FullUnit.catalogue();
    let sets: HashMap<String, MetricSet<AreaKey>> = designs
        .iter()
        .map(|d| {
            let report = "top_L4_mac  1  2  3  5210\n  L4  L4_mac_BG  1  2  3  3400\n";
            (d.id().to_string(), catalogue.extract(d.id(), report).reduce_and_derive())
        })
        .collect();
    c.bench_function("area_table_fu_catalogue", |b| {
        b.iter(|| BreakdownTable::area(black_box(&designs), black_box(&sets)).unwrap());
    });
}

criterion_group!(benches, bench_power_scan, bench_reduce_derive, bench_area_table);
criterion_main!(benches);

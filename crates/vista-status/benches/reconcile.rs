//! Status scan benchmarks.
//!
//! ```bash
//! cargo bench -p vista-status --bench reconcile
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vista_status::{MemoryFile, MemoryWorktree, NativeBackend, Repository, StatusOptions};
use vista_store::InMemoryObjectStore;
use vista_types::PathKey;

fn key(s: &str) -> PathKey {
    PathKey::parse(s).expect("valid path")
}

/// `tracked` committed files spread over 100 directories, a tenth of them
/// edited, plus `ignored` files under an ignored `target/`.
fn repository(tracked: usize, ignored: usize) -> Repository<NativeBackend<MemoryWorktree>> {
    let store = Arc::new(InMemoryObjectStore::new());
    let mut backend = NativeBackend::new(store, MemoryWorktree::new());

    let mut files = vec![(".gitignore".to_string(), "target/\n".to_string())];
    for i in 0..tracked {
        files.push((format!("src/d{:03}/f{i}.rs", i % 100), format!("fn f{i}() {{}}\n")));
    }
    for (path, data) in &files {
        let path = key(path);
        let file = MemoryFile::new(data.as_bytes());
        backend
            .index_mut()
            .stage_file(&path, data.as_bytes(), file.mode, file.stat())
            .expect("stage");
        backend.worktree_mut().insert_file(&path, file);
    }
    backend.commit_index().expect("commit");

    for (path, _) in files.iter().skip(1).step_by(10) {
        backend.worktree_mut().insert(&key(path), "// edited, longer than before\n");
    }
    for i in 0..ignored {
        backend
            .worktree_mut()
            .insert(&key(&format!("target/debug/o{i}.o")), "obj");
    }
    Repository::new(backend)
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");
    for tracked in [1_000, 10_000] {
        let repo = repository(tracked, 0);
        let options = StatusOptions::default();
        group.throughput(Throughput::Elements(tracked as u64));
        group.bench_with_input(BenchmarkId::from_parameter(tracked), &tracked, |b, _| {
            b.iter(|| repo.statuses(&options).expect("scan").len());
        });
    }
    group.finish();
}

fn bench_ignored_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("ignored_directory");
    for ignored in [1_000, 100_000] {
        let repo = repository(100, ignored);
        let options = StatusOptions::default();
        group.bench_with_input(BenchmarkId::from_parameter(ignored), &ignored, |b, _| {
            b.iter(|| repo.statuses(&options).expect("scan").len());
        });
    }
    group.finish();
}

fn bench_first_entry(c: &mut Criterion) {
    let repo = repository(10_000, 0);
    let options = StatusOptions::default();
    c.bench_function("first_entry", |b| {
        b.iter(|| {
            repo.for_each(&options, |path, _| ControlFlow::Break(path.clone()))
                .expect("scan")
        });
    });
}

criterion_group!(benches, bench_full_scan, bench_ignored_directory, bench_first_entry);
criterion_main!(benches);

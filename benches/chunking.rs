use std::collections::BTreeMap;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use r3m::chunking::{AdvancedChunker, AdvancedChunkerConfig, QualityAssessor};
use r3m::tokenizer::{BasicTokenizer, Tokenizer};

/// Generates a realistic document with paragraphs and section headings.
fn generate_document(target_bytes: usize) -> String {
    let paragraphs = [
        "The architecture employs a microservices pattern with each service owning its data store. \
         Services communicate through an event bus using CloudEvents specification. \
         This ensures loose coupling while maintaining eventual consistency across boundaries.",
        "Performance requirements dictate that the system must handle 10,000 concurrent WebSocket \
         connections per node. Each connection maintains a heartbeat interval of 30 seconds. \
         Load balancing uses consistent hashing to minimize connection migration during scaling events.",
        "Security considerations include mandatory mTLS for all east-west traffic within the cluster. \
         JWT tokens are validated at the API gateway level with JWKS rotation every 24 hours. \
         Rate limiting is enforced per tenant with configurable burst allowances.",
        "The data pipeline processes approximately 2TB of raw event data daily. Events are first \
         landed in a staging area, then validated against the schema registry before being \
         transformed and loaded into the analytical data warehouse.",
        "Monitoring and observability are built on OpenTelemetry with traces, metrics, and logs \
         correlated by trace ID. Custom dashboards track the four golden signals: latency, traffic, \
         errors, and saturation.",
        "Database operations use connection pooling with a maximum of 50 connections per service \
         instance. Read replicas are used for reporting queries to avoid impacting transactional \
         workloads.",
    ];

    let mut text = String::with_capacity(target_bytes + 500);
    let mut i = 0;
    while text.len() < target_bytes {
        if i > 0 && i % 3 == 0 {
            text.push_str(&format!("\n\n## Section {}\n\n", i / 3));
        }
        text.push_str(paragraphs[i % paragraphs.len()]);
        text.push_str("\n\n");
        i += 1;
    }
    text
}

fn chunker(chunk_token_limit: usize) -> AdvancedChunker {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(BasicTokenizer::new(8192));
    let config = AdvancedChunkerConfig { chunk_token_limit, ..Default::default() };
    AdvancedChunker::new(tokenizer, QualityAssessor::default(), config)
}

fn bench_chunking_by_doc_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking_doc_size");
    group.sample_size(20);

    for &doc_size in &[10_000, 50_000, 100_000] {
        let doc = generate_document(doc_size);
        let chunker = chunker(2048);

        group.bench_with_input(BenchmarkId::new("doc_size", format!("{}kb", doc_size / 1000)), &doc_size, |b, _| {
            b.iter(|| chunker.chunk_document("bench-doc", black_box(&doc), "", &BTreeMap::new(), None));
        });
    }
    group.finish();
}

fn bench_chunking_by_token_limit(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking_token_limit");
    group.sample_size(20);

    let doc = generate_document(50_000);

    for &limit in &[256, 512, 1024, 2048, 4096] {
        let chunker = chunker(limit);

        group.bench_with_input(BenchmarkId::new("chunk_token_limit", limit), &limit, |b, _| {
            b.iter(|| chunker.chunk_document("bench-doc", black_box(&doc), "", &BTreeMap::new(), None));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chunking_by_doc_size, bench_chunking_by_token_limit);
criterion_main!(benches);

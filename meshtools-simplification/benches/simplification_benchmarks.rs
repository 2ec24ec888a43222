//! Benchmarks for the edge collapse pipeline stages

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshtools_core::{Face, MeshContainer, Point3f, Submesh, VertexBuffer};
use meshtools_simplification::{CollapseTarget, EdgeCollapseEngine, EdgeCollapseSimplifier, EdgeCostIndex};

fn generate_grid(size: usize) -> (VertexBuffer, Vec<Face>) {
    let mut buffer = VertexBuffer::new();
    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / (size - 1) as f32 * std::f32::consts::PI;
            let fy = y as f32 / (size - 1) as f32 * std::f32::consts::PI;
            buffer.add_vertex(Point3f::new(x as f32, y as f32, (fx.sin() * fy.sin()) * 2.0));
        }
    }
    let mut faces = Vec::with_capacity((size - 1) * (size - 1) * 2);
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = y * size + x;
            let tr = tl + 1;
            let bl = (y + 1) * size + x;
            let br = bl + 1;
            faces.push([tl, bl, tr]);
            faces.push([tr, bl, br]);
        }
    }
    (buffer, faces)
}

fn generate_mesh(size: usize) -> MeshContainer {
    let (vertex_buffer, faces) = generate_grid(size);
    let mut mesh = MeshContainer::new();
    mesh.push_submesh(Submesh {
        faces,
        vertex_buffer,
        ..Submesh::default()
    });
    mesh
}

fn bench_prepare(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare");
    for size in [20, 40, 80] {
        let (buffer, faces) = generate_grid(size);
        group.bench_with_input(BenchmarkId::from_parameter(faces.len()), &(buffer, faces), |b, (buffer, faces)| {
            let mut buffer = buffer.clone();
            b.iter(|| black_box(EdgeCostIndex::prepare(black_box(faces), &mut buffer)));
        });
    }
    group.finish();
}

fn bench_collapse(c: &mut Criterion) {
    let mut group = c.benchmark_group("collapse");
    let (buffer, faces) = generate_grid(40);
    for fraction in [0.3, 0.5, 0.8] {
        group.bench_with_input(
            BenchmarkId::new("engine", format!("{}f_r{}", faces.len(), (fraction * 100.0) as u32)),
            &fraction,
            |b, &fraction| {
                let mut buffer = buffer.clone();
                b.iter(|| {
                    let outcome = EdgeCollapseEngine::new().run(&faces, &mut buffer, CollapseTarget::Fraction(fraction));
                    black_box(outcome);
                });
            },
        );
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("decimate");
    for size in [10, 20, 40] {
        let mesh = generate_mesh(size);
        let face_count = mesh.statistics().total_faces();
        for fraction in [0.3, 0.5, 0.7] {
            group.bench_with_input(
                BenchmarkId::new("edge_collapse", format!("{}f_r{}", face_count, (fraction * 100.0) as u32)),
                &(&mesh, fraction),
                |b, &(mesh, fraction)| {
                    let simplifier = EdgeCollapseSimplifier::new().with_target(CollapseTarget::Fraction(fraction));
                    b.iter(|| {
                        let mut mesh = mesh.clone();
                        black_box(simplifier.decimate(black_box(&mut mesh)));
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_prepare, bench_collapse, bench_pipeline);
criterion_main!(benches);

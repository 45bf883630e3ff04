use std::any::Any;

use ash::vk;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use frame_graph::{
    CommandEncoder, DummyEncoder, FrameGraph, ImageDesc, NodeDesc, RenderPass, ResourceDesc,
    ResourcePool, ResourceType,
};

struct NullPass;

impl RenderPass for NullPass {
    fn record_commands(
        &mut self,
        _encoder: &mut dyn CommandEncoder,
        _frame_index: u32,
        _scene: &dyn Any,
    ) {
    }
}

fn color_image(name: &str) -> ImageDesc {
    ImageDesc::new_2d(
        name,
        1920,
        1080,
        vk::Format::R8G8B8A8_UNORM,
        vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
    )
}

/// A chain of `length` passes where each samples the previous attachment.
fn build_chain(length: usize) -> (ResourcePool, FrameGraph) {
    let mut pool = ResourcePool::new();
    let images: Vec<_> = (0..length)
        .map(|i| pool.add_image(color_image(&format!("stage_{i}"))))
        .collect();

    let mut graph = FrameGraph::new();
    for i in 0..length {
        let mut desc = NodeDesc::new(format!("pass_{i}"), NullPass)
            .with_output(ResourceDesc::image(images[i], ResourceType::ATTACHMENT));
        if i > 0 {
            desc = desc.with_input(ResourceDesc::image(images[i - 1], ResourceType::TEXTURE));
        }
        graph.add_node(&pool, desc).unwrap();
    }
    (pool, graph)
}

// ---------------------------------------------------------------------------
// Graph construction
// ---------------------------------------------------------------------------

fn bench_graph_add_nodes(c: &mut Criterion) {
    c.bench_function("frame_graph_add_16_nodes", |b| {
        b.iter(|| {
            let (_, graph) = build_chain(16);
            black_box(&graph);
        });
    });
}

// ---------------------------------------------------------------------------
// Graph build (edges + sort + barriers)
// ---------------------------------------------------------------------------

fn bench_graph_build_small(c: &mut Criterion) {
    c.bench_function("frame_graph_build_8_chain", |b| {
        b.iter_with_setup(
            || build_chain(8),
            |(pool, mut graph)| {
                graph.build(&pool).unwrap();
                black_box(&graph);
            },
        );
    });
}

fn bench_graph_build_large(c: &mut Criterion) {
    c.bench_function("frame_graph_build_64_chain", |b| {
        b.iter_with_setup(
            || build_chain(64),
            |(pool, mut graph)| {
                graph.build(&pool).unwrap();
                black_box(&graph);
            },
        );
    });
}

fn bench_graph_rebuild(c: &mut Criterion) {
    // Rebuild over an already-built graph, the resize path minus the
    // resource recreation.
    let (pool, mut graph) = build_chain(16);
    graph.build(&pool).unwrap();

    c.bench_function("frame_graph_rebuild_16_chain", |b| {
        b.iter(|| {
            graph.build(&pool).unwrap();
            black_box(&graph);
        });
    });
}

// ---------------------------------------------------------------------------
// Per-frame replay
// ---------------------------------------------------------------------------

fn bench_record_commands(c: &mut Criterion) {
    let (pool, mut graph) = build_chain(16);
    graph.build(&pool).unwrap();
    let mut encoder = DummyEncoder::new();

    c.bench_function("frame_graph_record_16_chain", |b| {
        b.iter(|| {
            encoder.clear();
            graph.record_commands(&mut encoder, 0, &());
            black_box(&encoder);
        });
    });
}

criterion_group!(
    benches,
    bench_graph_add_nodes,
    bench_graph_build_small,
    bench_graph_build_large,
    bench_graph_rebuild,
    bench_record_commands,
);
criterion_main!(benches);

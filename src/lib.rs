//! # Frame Graph
//!
//! Pass scheduling and automatic barrier placement for a Vulkan renderer.
//!
//! Render and compute passes declare the resources they consume and produce;
//! the graph infers a valid execution order from those declarations,
//! synthesizes the layout transitions and memory barriers between passes,
//! and replays the precomputed schedule every frame. Pass callbacks only
//! issue draw and dispatch commands; synchronization is owned entirely by
//! the graph.
//!
//! ## Overview
//!
//! | Layer | Type | Purpose |
//! |-------|------|---------|
//! | Resources | [`ResourcePool`] | Externally owned images/buffers, addressed by handle |
//! | Graph | [`FrameGraph`] | Pass dependencies, ordering, barrier synthesis |
//! | Pass | [`RenderPass`] | Single GPU operation recorded per frame |
//! | Encoding | [`CommandEncoder`] | Backend boundary ([`VulkanEncoder`], [`DummyEncoder`]) |
//!
//! ## Example
//!
//! ```ignore
//! use frame_graph::{FrameGraph, NodeDesc, ResourceDesc, ResourceType};
//!
//! let mut graph = FrameGraph::new();
//! graph.add_node(
//!     &pool,
//!     NodeDesc::new("geometry", GeometryPass::new())
//!         .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT)),
//! )?;
//! graph.build(&pool)?;
//!
//! // Every frame:
//! let mut encoder = VulkanEncoder::new(device.clone(), command_buffer);
//! graph.record_commands(&mut encoder, frame_index, &scene);
//! ```

pub mod encoder;
pub mod error;
pub mod graph;
pub mod resources;

// Re-export main types for convenience
pub use encoder::{CommandEncoder, DummyEncoder, EncodedCommand, VulkanEncoder};
pub use error::FrameGraphError;
pub use graph::barrier::{BufferBarrier, ImageBarrier, TransitionState};
pub use graph::{
    FrameGraph, NodeDesc, NodeHandle, QueueType, RenderPass, ResourceDesc, ResourceType,
};
pub use resources::{BufferDesc, BufferHandle, ImageDesc, ImageHandle, ResourcePool};

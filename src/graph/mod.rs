//! Frame graph construction, compilation, and replay.
//!
//! The frame graph is built once per pipeline configuration, not per frame.
//! Passes declare the resources they consume and produce; the graph resolves
//! those declarations into producer→consumer edges, orders the passes with a
//! topological sort, and synthesizes the image layout transitions and buffer
//! memory barriers each pass requires. Per-frame work is reduced to replaying
//! the precomputed schedule through a [`CommandEncoder`].
//!
//! # Architecture
//!
//! | Stage | Entry point | Runs |
//! |-------|-------------|------|
//! | Declaration | [`FrameGraph::add_node`] | once per configuration |
//! | Compilation | [`FrameGraph::build`] | once per configuration / resize |
//! | Replay | [`FrameGraph::record_commands`] | once per frame |
//!
//! # Example
//!
//! ```ignore
//! let mut graph = FrameGraph::new();
//!
//! graph.add_node(
//!     &pool,
//!     NodeDesc::new("geometry", GeometryPass::new())
//!         .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT))
//!         .with_output(ResourceDesc::image(depth, ResourceType::ATTACHMENT)),
//! )?;
//! graph.add_node(
//!     &pool,
//!     NodeDesc::new("lighting", LightingPass::new())
//!         .with_input(ResourceDesc::image(albedo, ResourceType::TEXTURE))
//!         .with_output(ResourceDesc::image(hdr, ResourceType::ATTACHMENT)),
//! )?;
//!
//! graph.build(&pool)?;
//!
//! // Every frame:
//! graph.record_commands(&mut encoder, frame_index, &scene);
//! ```

pub mod barrier;

mod node;
mod resource;
mod sort;

use std::any::Any;
use std::collections::HashMap;

use ash::vk;

pub use node::{NodeDesc, NodeHandle, QueueType, RenderPass};
pub use resource::{ResourceDesc, ResourceInfo, ResourceType};

use crate::encoder::CommandEncoder;
use crate::error::FrameGraphError;
use crate::resources::ResourcePool;

use barrier::{BufferBarrier, ImageBarrier};
use node::Node;
use resource::{ResourceId, ResourceRecord};

/// A registered producer: the node that declared the output and the record
/// holding its resolved info.
#[derive(Debug, Clone, Copy)]
struct ProducerEntry {
    node: NodeHandle,
    resource: ResourceId,
}

/// The frame graph: a dependency graph of rendering and compute passes.
///
/// The graph owns its nodes and resource records; nodes reference resources
/// and each other only by index, so the whole structure can be rebuilt by
/// [`clear`](Self::clear)ing and re-adding passes (the resize / pipeline
/// hot-reload path).
///
/// Pool records referenced by the graph are owned by the surrounding
/// renderer; the graph must be rebuilt before replaying whenever those
/// resources are recreated.
#[derive(Default)]
pub struct FrameGraph {
    nodes: Vec<Node>,
    resources: Vec<ResourceRecord>,
    producers: HashMap<String, ProducerEntry>,
    sorted: Vec<NodeHandle>,
}

impl FrameGraph {
    /// Create a new empty frame graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pass to the graph.
    ///
    /// Registers each non-reference output under the resource's pool name;
    /// a name that is already claimed is a [`DuplicateProducer`] error.
    /// Inputs are recorded unresolved and matched against producers by
    /// [`build`](Self::build).
    ///
    /// Nodes may be added in any order: a consumer can be added before its
    /// producer as long as both are present when `build` runs.
    ///
    /// [`DuplicateProducer`]: FrameGraphError::DuplicateProducer
    pub fn add_node(
        &mut self,
        pool: &ResourcePool,
        desc: NodeDesc,
    ) -> Result<NodeHandle, FrameGraphError> {
        let handle = NodeHandle::new(self.nodes.len() as u32);
        let NodeDesc {
            name,
            pass,
            queue_type,
            enabled,
            label_color,
            inputs,
            outputs,
        } = desc;

        let mut node = Node::new(name, pass, queue_type, enabled, label_color);

        for output in outputs {
            let id = self.create_output_resource(pool, output, handle, &node.name)?;
            node.outputs.push(id);
        }

        for input in inputs {
            let id = self.create_input_resource(pool, input, &node.name)?;
            node.inputs.push(id);
        }

        self.nodes.push(node);
        Ok(handle)
    }

    /// Build the graph from the declared nodes.
    ///
    /// Resolves inputs to producers and links edges, derives each graphics
    /// node's viewport and scissor from its attachments, topologically sorts
    /// the enabled nodes, and synthesizes the barriers each scheduled node
    /// must emit before recording.
    ///
    /// Safe to call again after [`clear`](Self::clear) and re-registration;
    /// building twice over an unchanged node set yields the same order and
    /// the same barriers.
    pub fn build(&mut self, pool: &ResourcePool) -> Result<(), FrameGraphError> {
        // A failed build must not leave the previous schedule replayable.
        self.sorted.clear();

        self.process_nodes(pool)?;
        self.sorted = sort::sort_nodes(&self.nodes)?;
        self.create_barriers(pool)?;

        log::debug!(
            "frame graph built: {} nodes declared, {} scheduled",
            self.nodes.len(),
            self.sorted.len()
        );
        Ok(())
    }

    /// Replay the built graph for one frame.
    ///
    /// For every node in sorted order: begins a debug label, emits the
    /// precomputed barriers (image barriers first, then buffer barriers, in
    /// declaration order), sets the viewport and scissor for graphics
    /// nodes, and invokes the pass's recording callback with the encoder,
    /// frame index, and scene.
    ///
    /// Graph structure is read-only here; all side effects go through the
    /// encoder. `scene` is passed through to the callbacks untouched.
    pub fn record_commands(
        &mut self,
        encoder: &mut dyn CommandEncoder,
        frame_index: u32,
        scene: &dyn Any,
    ) {
        for i in 0..self.sorted.len() {
            let handle = self.sorted[i];
            let node = &mut self.nodes[handle.index()];

            encoder.begin_debug_label(&node.name, node.label_color);

            if !node.image_barriers.is_empty() || !node.buffer_barriers.is_empty() {
                encoder.pipeline_barrier(&node.image_barriers, &node.buffer_barriers);
            }

            if node.queue_type == QueueType::Graphics {
                encoder.set_viewport(node.viewport);
                encoder.set_scissor(node.scissor);
            }

            node.pass.record_commands(encoder, frame_index, scene);

            encoder.end_debug_label();
        }
    }

    /// Drop every node and resource record so the graph can be repopulated.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.resources.clear();
        self.producers.clear();
        self.sorted.clear();
    }

    /// Look up the producer of a resource name.
    ///
    /// Returns the producing node and the output's declared type, or `None`
    /// if no producer has been registered under that name yet.
    pub fn resource_producer(&self, name: &str) -> Option<(NodeHandle, ResourceType)> {
        let entry = self.producers.get(name)?;
        let record = &self.resources[entry.resource.index()];
        Some((record.producer?, record.ty))
    }

    /// Get the number of declared nodes, enabled or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node's name.
    pub fn node_name(&self, handle: NodeHandle) -> &str {
        &self.nodes[handle.index()].name
    }

    /// Check if a node is enabled.
    pub fn is_node_enabled(&self, handle: NodeHandle) -> bool {
        self.nodes[handle.index()].enabled
    }

    /// Get a node's downstream consumers, as computed by the last build.
    pub fn node_edges(&self, handle: NodeHandle) -> &[NodeHandle] {
        &self.nodes[handle.index()].edges
    }

    /// Get the execution order computed by the last build.
    pub fn execution_order(&self) -> &[NodeHandle] {
        &self.sorted
    }

    /// Get the image barriers a node emits before recording.
    pub fn node_image_barriers(&self, handle: NodeHandle) -> &[ImageBarrier] {
        &self.nodes[handle.index()].image_barriers
    }

    /// Get the buffer barriers a node emits before recording.
    pub fn node_buffer_barriers(&self, handle: NodeHandle) -> &[BufferBarrier] {
        &self.nodes[handle.index()].buffer_barriers
    }

    /// Get the viewport derived for a graphics node.
    pub fn node_viewport(&self, handle: NodeHandle) -> vk::Viewport {
        self.nodes[handle.index()].viewport
    }

    /// Get the scissor rectangle derived for a graphics node.
    pub fn node_scissor(&self, handle: NodeHandle) -> vk::Rect2D {
        self.nodes[handle.index()].scissor
    }

    fn create_output_resource(
        &mut self,
        pool: &ResourcePool,
        desc: ResourceDesc,
        producer: NodeHandle,
        node_name: &str,
    ) -> Result<ResourceId, FrameGraphError> {
        if desc.ty.is_empty() {
            return Err(FrameGraphError::UntypedResource {
                node: node_name.to_owned(),
            });
        }

        let name = Self::resource_name(pool, &desc);
        let id = ResourceId::new(self.resources.len() as u32);
        let mut record = ResourceRecord {
            ty: desc.ty,
            info: desc.info,
            producer: None,
            output: None,
            name: name.clone(),
        };

        // Reference outputs alias a resource owned elsewhere; they never
        // claim the name, so any number of passes may declare them.
        if !desc.ty.contains(ResourceType::REFERENCE) {
            if let Some(existing) = self.producers.get(&name) {
                let producer_name = self
                    .nodes
                    .get(existing.node.index())
                    .map(|n| n.name.as_str())
                    .unwrap_or(node_name);
                return Err(FrameGraphError::DuplicateProducer {
                    resource: name,
                    producer: producer_name.to_owned(),
                });
            }

            record.producer = Some(producer);
            record.output = Some(id);
            self.producers.insert(
                name,
                ProducerEntry {
                    node: producer,
                    resource: id,
                },
            );
        }

        self.resources.push(record);
        Ok(id)
    }

    fn create_input_resource(
        &mut self,
        pool: &ResourcePool,
        desc: ResourceDesc,
        node_name: &str,
    ) -> Result<ResourceId, FrameGraphError> {
        if desc.ty.is_empty() {
            return Err(FrameGraphError::UntypedResource {
                node: node_name.to_owned(),
            });
        }

        let id = ResourceId::new(self.resources.len() as u32);
        self.resources.push(ResourceRecord {
            ty: desc.ty,
            info: desc.info,
            producer: None,
            output: None,
            name: Self::resource_name(pool, &desc),
        });
        Ok(id)
    }

    /// Derive the dependency-matching name from the pool record, so the
    /// identity follows the resource rather than declaration order.
    fn resource_name(pool: &ResourcePool, desc: &ResourceDesc) -> String {
        match desc.info {
            ResourceInfo::Image(handle) => pool.image(handle).name.clone(),
            ResourceInfo::Buffer { handle, .. } => pool.buffer(handle).name.clone(),
        }
    }

    /// Resolve inputs, link edges, and derive viewports for enabled nodes.
    fn process_nodes(&mut self, pool: &ResourcePool) -> Result<(), FrameGraphError> {
        for node in &mut self.nodes {
            node.edges.clear();
        }

        for index in 0..self.nodes.len() {
            if !self.nodes[index].enabled {
                continue;
            }

            let handle = NodeHandle::new(index as u32);
            self.compute_node_edges(handle)?;
            self.compute_node_viewport(handle, pool)?;
        }
        Ok(())
    }

    fn compute_node_edges(&mut self, handle: NodeHandle) -> Result<(), FrameGraphError> {
        let input_ids = self.nodes[handle.index()].inputs.clone();

        for input_id in input_ids {
            let name = self.resources[input_id.index()].name.clone();
            let Some(&entry) = self.producers.get(&name) else {
                return Err(FrameGraphError::UnresolvedInput {
                    resource: name,
                    consumer: self.nodes[handle.index()].name.clone(),
                });
            };

            let input = &mut self.resources[input_id.index()];
            input.producer = Some(entry.node);
            input.output = Some(entry.resource);

            self.nodes[entry.node.index()].edges.push(handle);

            log::trace!(
                "frame graph edge: '{}' -> '{}' via '{}'",
                self.nodes[entry.node.index()].name,
                self.nodes[handle.index()].name,
                self.resources[input_id.index()].name,
            );
        }
        Ok(())
    }

    /// Derive viewport and scissor from the node's attachment extents.
    ///
    /// The first attachment input sets the extent, then the first attachment
    /// output overrides it: the pass renders at the size of what it writes,
    /// falling back to what it reads.
    fn compute_node_viewport(
        &mut self,
        handle: NodeHandle,
        pool: &ResourcePool,
    ) -> Result<(), FrameGraphError> {
        if self.nodes[handle.index()].queue_type != QueueType::Graphics {
            return Ok(());
        }

        let mut extent = None;

        for &input_id in &self.nodes[handle.index()].inputs {
            let record = &self.resources[input_id.index()];
            if record.ty.contains(ResourceType::ATTACHMENT) {
                if let ResourceInfo::Image(image_handle) = record.info {
                    let image = pool.image(image_handle);
                    extent = Some((image.width, image.height));
                    break;
                }
            }
        }

        for &output_id in &self.nodes[handle.index()].outputs {
            let record = &self.resources[output_id.index()];
            // Reference outputs do not contribute to the pass's extent.
            if record.ty == ResourceType::ATTACHMENT {
                if let ResourceInfo::Image(image_handle) = record.info {
                    let image = pool.image(image_handle);
                    extent = Some((image.width, image.height));
                    break;
                }
            }
        }

        let Some((width, height)) = extent else {
            return Err(FrameGraphError::MissingAttachment {
                node: self.nodes[handle.index()].name.clone(),
            });
        };

        let node = &mut self.nodes[handle.index()];
        node.viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        node.scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D { width, height },
        };
        Ok(())
    }

    /// Synthesize each scheduled node's barriers.
    ///
    /// Walks the sorted order so read-state tracking is well defined: once a
    /// resource has been transitioned for its first reader it stays readable,
    /// and later readers of the same output skip the barrier. Producing a
    /// resource resets that state.
    fn create_barriers(&mut self, pool: &ResourcePool) -> Result<(), FrameGraphError> {
        let mut consumed: HashMap<ResourceId, bool> = HashMap::new();

        for i in 0..self.sorted.len() {
            let handle = self.sorted[i];
            self.nodes[handle.index()].image_barriers.clear();
            self.nodes[handle.index()].buffer_barriers.clear();

            let input_ids = self.nodes[handle.index()].inputs.clone();
            for input_id in input_ids {
                let record = self.resources[input_id.index()].clone();
                let Some(output_id) = record.output else {
                    continue;
                };

                if consumed.get(&output_id).copied().unwrap_or(false) {
                    continue;
                }
                consumed.insert(output_id, true);

                if record.ty == ResourceType::TEXTURE {
                    let ResourceInfo::Image(image_handle) = record.info else {
                        continue;
                    };
                    let image = pool.image(image_handle);

                    let (old_layout, aspect) = if image.is_depth_stencil() {
                        (
                            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                            vk::ImageAspectFlags::DEPTH,
                        )
                    } else {
                        (
                            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                            vk::ImageAspectFlags::COLOR,
                        )
                    };

                    let barrier = ImageBarrier::layout_transition(
                        image,
                        old_layout,
                        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                        aspect,
                    )?;
                    self.nodes[handle.index()].image_barriers.push(barrier);
                } else if record.ty == ResourceType::BUFFER {
                    let ResourceInfo::Buffer {
                        handle: buffer_handle,
                        stage_usage,
                    } = record.info
                    else {
                        continue;
                    };

                    // Source stages come from the producer's declaration,
                    // destination stages from this consumer's.
                    let producer_stage = match self.resources[output_id.index()].info {
                        ResourceInfo::Buffer { stage_usage, .. } => stage_usage,
                        ResourceInfo::Image(_) => continue,
                    };

                    // TODO: distinguish INDIRECT_COMMAND_READ from SHADER_READ
                    // based on the consumer's stage usage.
                    let barrier = BufferBarrier {
                        buffer: pool.buffer(buffer_handle).buffer,
                        src_stage: producer_stage,
                        src_access: vk::AccessFlags2::SHADER_WRITE,
                        dst_stage: stage_usage,
                        dst_access: vk::AccessFlags2::MEMORY_READ,
                        offset: 0,
                        size: vk::WHOLE_SIZE,
                    };
                    self.nodes[handle.index()].buffer_barriers.push(barrier);
                }
            }

            let output_ids = self.nodes[handle.index()].outputs.clone();
            for output_id in output_ids {
                consumed.insert(output_id, false);

                let record = self.resources[output_id.index()].clone();
                if record.ty != ResourceType::ATTACHMENT {
                    continue;
                }
                let ResourceInfo::Image(image_handle) = record.info else {
                    continue;
                };
                let image = pool.image(image_handle);

                let (new_layout, aspect) = if image.is_depth_stencil() {
                    (
                        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                        vk::ImageAspectFlags::DEPTH,
                    )
                } else {
                    (
                        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                        vk::ImageAspectFlags::COLOR,
                    )
                };

                let barrier = ImageBarrier::layout_transition(
                    image,
                    vk::ImageLayout::UNDEFINED,
                    new_layout,
                    aspect,
                )?;
                self.nodes[handle.index()].image_barriers.push(barrier);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{BufferDesc, ImageDesc};

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

    fn color_image(name: &str, width: u32, height: u32) -> ImageDesc {
        ImageDesc::new_2d(
            name,
            width,
            height,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
        )
    }

    #[test]
    fn test_inputs_resolve_to_producer() {
        let mut pool = ResourcePool::new();
        let albedo = pool.add_image(color_image("albedo", 64, 64));
        let target = pool.add_image(color_image("target", 64, 64));

        let mut graph = FrameGraph::new();
        let geometry = graph
            .add_node(
                &pool,
                NodeDesc::new("geometry", NullPass)
                    .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT)),
            )
            .unwrap();
        let lighting = graph
            .add_node(
                &pool,
                NodeDesc::new("lighting", NullPass)
                    .with_input(ResourceDesc::image(albedo, ResourceType::TEXTURE))
                    .with_output(ResourceDesc::image(target, ResourceType::ATTACHMENT)),
            )
            .unwrap();

        graph.build(&pool).unwrap();

        assert_eq!(graph.node_edges(geometry), &[lighting]);
        assert_eq!(
            graph.resource_producer("albedo"),
            Some((geometry, ResourceType::ATTACHMENT))
        );
    }

    #[test]
    fn test_consumer_added_before_producer() {
        let mut pool = ResourcePool::new();
        let albedo = pool.add_image(color_image("albedo", 64, 64));
        let target = pool.add_image(color_image("target", 64, 64));

        let mut graph = FrameGraph::new();
        let lighting = graph
            .add_node(
                &pool,
                NodeDesc::new("lighting", NullPass)
                    .with_input(ResourceDesc::image(albedo, ResourceType::TEXTURE))
                    .with_output(ResourceDesc::image(target, ResourceType::ATTACHMENT)),
            )
            .unwrap();
        let geometry = graph
            .add_node(
                &pool,
                NodeDesc::new("geometry", NullPass)
                    .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT)),
            )
            .unwrap();

        graph.build(&pool).unwrap();

        let order = graph.execution_order();
        let geometry_pos = order.iter().position(|&h| h == geometry).unwrap();
        let lighting_pos = order.iter().position(|&h| h == lighting).unwrap();
        assert!(geometry_pos < lighting_pos);
    }

    #[test]
    fn test_duplicate_producer_rejected_at_add() {
        let mut pool = ResourcePool::new();
        let albedo = pool.add_image(color_image("gbuffer-albedo", 64, 64));

        let mut graph = FrameGraph::new();
        graph
            .add_node(
                &pool,
                NodeDesc::new("first", NullPass)
                    .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT)),
            )
            .unwrap();

        let err = graph
            .add_node(
                &pool,
                NodeDesc::new("second", NullPass)
                    .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT)),
            )
            .unwrap_err();

        assert_eq!(
            err,
            FrameGraphError::DuplicateProducer {
                resource: "gbuffer-albedo".into(),
                producer: "first".into(),
            }
        );
    }

    #[test]
    fn test_reference_outputs_may_alias() {
        let mut pool = ResourcePool::new();
        let shared = pool.add_image(color_image("shared", 64, 64));
        let a = pool.add_image(color_image("a", 64, 64));
        let b = pool.add_image(color_image("b", 64, 64));

        let mut graph = FrameGraph::new();
        graph
            .add_node(
                &pool,
                NodeDesc::new("owner", NullPass)
                    .with_output(ResourceDesc::image(shared, ResourceType::ATTACHMENT)),
            )
            .unwrap();
        graph
            .add_node(
                &pool,
                NodeDesc::new("alias_a", NullPass)
                    .with_output(ResourceDesc::image(a, ResourceType::ATTACHMENT))
                    .with_output(ResourceDesc::image(shared, ResourceType::REFERENCE)),
            )
            .unwrap();
        graph
            .add_node(
                &pool,
                NodeDesc::new("alias_b", NullPass)
                    .with_output(ResourceDesc::image(b, ResourceType::ATTACHMENT))
                    .with_output(ResourceDesc::image(shared, ResourceType::REFERENCE)),
            )
            .unwrap();

        graph.build(&pool).unwrap();
        assert_eq!(graph.execution_order().len(), 3);
    }

    #[test]
    fn test_untyped_resource_rejected() {
        let mut pool = ResourcePool::new();
        let albedo = pool.add_image(color_image("albedo", 64, 64));

        let mut graph = FrameGraph::new();
        let err = graph
            .add_node(
                &pool,
                NodeDesc::new("broken", NullPass)
                    .with_output(ResourceDesc::image(albedo, ResourceType::empty())),
            )
            .unwrap_err();

        assert_eq!(
            err,
            FrameGraphError::UntypedResource {
                node: "broken".into()
            }
        );
    }

    #[test]
    fn test_unresolved_input_fails_build() {
        let mut pool = ResourcePool::new();
        let albedo = pool.add_image(color_image("albedo", 64, 64));
        let target = pool.add_image(color_image("target", 64, 64));

        let mut graph = FrameGraph::new();
        graph
            .add_node(
                &pool,
                NodeDesc::new("lighting", NullPass)
                    .with_input(ResourceDesc::image(albedo, ResourceType::TEXTURE))
                    .with_output(ResourceDesc::image(target, ResourceType::ATTACHMENT)),
            )
            .unwrap();

        let err = graph.build(&pool).unwrap_err();
        assert_eq!(
            err,
            FrameGraphError::UnresolvedInput {
                resource: "albedo".into(),
                consumer: "lighting".into(),
            }
        );
    }

    #[test]
    fn test_graphics_node_without_attachment_fails_build() {
        let mut pool = ResourcePool::new();
        let albedo = pool.add_image(color_image("albedo", 64, 64));
        let target = pool.add_image(color_image("target", 64, 64));

        let mut graph = FrameGraph::new();
        graph
            .add_node(
                &pool,
                NodeDesc::new("geometry", NullPass)
                    .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT)),
            )
            .unwrap();
        graph
            .add_node(
                &pool,
                // Reads a texture but renders to nothing.
                NodeDesc::new("floating", NullPass)
                    .with_input(ResourceDesc::image(albedo, ResourceType::TEXTURE))
                    .with_output(ResourceDesc::image(target, ResourceType::REFERENCE)),
            )
            .unwrap();

        let err = graph.build(&pool).unwrap_err();
        assert_eq!(
            err,
            FrameGraphError::MissingAttachment {
                node: "floating".into()
            }
        );
    }

    #[test]
    fn test_compute_node_needs_no_attachment() {
        let mut pool = ResourcePool::new();
        let culled = pool.add_buffer(BufferDesc::new("culled_draws", 4096));

        let mut graph = FrameGraph::new();
        graph
            .add_node(
                &pool,
                NodeDesc::new("culling", NullPass)
                    .with_queue_type(QueueType::Compute)
                    .with_output(ResourceDesc::buffer(
                        culled,
                        ResourceType::BUFFER,
                        vk::PipelineStageFlags2::COMPUTE_SHADER,
                    )),
            )
            .unwrap();

        graph.build(&pool).unwrap();
        assert_eq!(graph.execution_order().len(), 1);
    }

    #[test]
    fn test_viewport_prefers_output_attachment() {
        let mut pool = ResourcePool::new();
        let depth_read = pool.add_image(ImageDesc::new_2d(
            "depth",
            1920,
            1080,
            vk::Format::D32_SFLOAT,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
        ));
        let half_res = pool.add_image(color_image("half_res", 960, 540));

        let mut graph = FrameGraph::new();
        graph
            .add_node(
                &pool,
                NodeDesc::new("depth_prepass", NullPass)
                    .with_output(ResourceDesc::image(depth_read, ResourceType::ATTACHMENT)),
            )
            .unwrap();
        let ssao = graph
            .add_node(
                &pool,
                NodeDesc::new("ssao", NullPass)
                    .with_input(ResourceDesc::image(depth_read, ResourceType::ATTACHMENT))
                    .with_output(ResourceDesc::image(half_res, ResourceType::ATTACHMENT)),
            )
            .unwrap();

        graph.build(&pool).unwrap();

        // The output attachment overrides the full-res input attachment.
        assert_eq!(graph.node_viewport(ssao).width, 960.0);
        assert_eq!(graph.node_scissor(ssao).extent.height, 540);
    }

    #[test]
    fn test_viewport_follows_first_output_attachment() {
        let mut pool = ResourcePool::new();
        let full = pool.add_image(color_image("full", 1920, 1080));
        let half = pool.add_image(color_image("half", 960, 540));

        let mut graph = FrameGraph::new();
        let node = graph
            .add_node(
                &pool,
                NodeDesc::new("mixed", NullPass)
                    .with_output(ResourceDesc::image(full, ResourceType::ATTACHMENT))
                    .with_output(ResourceDesc::image(half, ResourceType::ATTACHMENT)),
            )
            .unwrap();

        graph.build(&pool).unwrap();

        assert_eq!(graph.node_viewport(node).width, 1920.0);
        assert_eq!(graph.node_scissor(node).extent.height, 1080);
    }

    #[test]
    fn test_cycle_fails_build() {
        let mut pool = ResourcePool::new();
        let ping = pool.add_buffer(BufferDesc::new("ping", 256));
        let pong = pool.add_buffer(BufferDesc::new("pong", 256));
        let stage = vk::PipelineStageFlags2::COMPUTE_SHADER;

        let mut graph = FrameGraph::new();
        graph
            .add_node(
                &pool,
                NodeDesc::new("forward", NullPass)
                    .with_queue_type(QueueType::Compute)
                    .with_input(ResourceDesc::buffer(pong, ResourceType::BUFFER, stage))
                    .with_output(ResourceDesc::buffer(ping, ResourceType::BUFFER, stage)),
            )
            .unwrap();
        graph
            .add_node(
                &pool,
                NodeDesc::new("backward", NullPass)
                    .with_queue_type(QueueType::Compute)
                    .with_input(ResourceDesc::buffer(ping, ResourceType::BUFFER, stage))
                    .with_output(ResourceDesc::buffer(pong, ResourceType::BUFFER, stage)),
            )
            .unwrap();

        let err = graph.build(&pool).unwrap_err();
        assert!(matches!(err, FrameGraphError::DependencyCycle { .. }));
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut pool = ResourcePool::new();
        let albedo = pool.add_image(color_image("albedo", 64, 64));
        let target = pool.add_image(color_image("target", 64, 64));

        let mut graph = FrameGraph::new();
        let geometry = graph
            .add_node(
                &pool,
                NodeDesc::new("geometry", NullPass)
                    .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT)),
            )
            .unwrap();
        let lighting = graph
            .add_node(
                &pool,
                NodeDesc::new("lighting", NullPass)
                    .with_input(ResourceDesc::image(albedo, ResourceType::TEXTURE))
                    .with_output(ResourceDesc::image(target, ResourceType::ATTACHMENT)),
            )
            .unwrap();

        graph.build(&pool).unwrap();
        let first_order = graph.execution_order().to_vec();
        let first_geometry = graph.node_image_barriers(geometry).to_vec();
        let first_lighting = graph.node_image_barriers(lighting).to_vec();

        graph.build(&pool).unwrap();

        assert_eq!(graph.execution_order(), first_order.as_slice());
        assert_eq!(graph.node_image_barriers(geometry), first_geometry);
        assert_eq!(graph.node_image_barriers(lighting), first_lighting);
        assert_eq!(graph.node_edges(geometry), &[lighting]);
    }

    #[test]
    fn test_clear_allows_rebuild() {
        let mut pool = ResourcePool::new();
        let albedo = pool.add_image(color_image("albedo", 64, 64));

        let mut graph = FrameGraph::new();
        graph
            .add_node(
                &pool,
                NodeDesc::new("geometry", NullPass)
                    .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT)),
            )
            .unwrap();
        graph.build(&pool).unwrap();

        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.execution_order().is_empty());
        assert_eq!(graph.resource_producer("albedo"), None);

        // Same declarations are legal again after the clear.
        graph
            .add_node(
                &pool,
                NodeDesc::new("geometry", NullPass)
                    .with_output(ResourceDesc::image(albedo, ResourceType::ATTACHMENT)),
            )
            .unwrap();
        graph.build(&pool).unwrap();
        assert_eq!(graph.execution_order().len(), 1);
    }

    #[test]
    fn test_resource_producer_unresolved() {
        let graph = FrameGraph::new();
        assert_eq!(graph.resource_producer("nothing"), None);
    }
}

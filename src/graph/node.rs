//! Pass nodes and their declarations.

use std::any::Any;

use ash::vk;

use super::barrier::{BufferBarrier, ImageBarrier};
use super::resource::{ResourceDesc, ResourceId};
use crate::encoder::CommandEncoder;

/// Handle to a node in a [`FrameGraph`](super::FrameGraph).
///
/// `NodeHandle` is `Copy` and cheap to pass around. It is only valid within
/// the graph that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(u32);

impl NodeHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which queue a pass records for.
///
/// Only graphics passes get a viewport and scissor; compute passes dispatch
/// without either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueType {
    #[default]
    Graphics,
    Compute,
}

/// The recording callback of a pass.
///
/// Implementations issue only drawing and dispatch commands for their own
/// pass. Barriers, layout transitions, and viewport state are owned by the
/// graph and are already recorded when this is called.
///
/// The `scene` parameter is opaque to the graph; passes downcast it to the
/// renderer's concrete scene type.
pub trait RenderPass {
    /// Record this pass's commands for one frame.
    fn record_commands(
        &mut self,
        encoder: &mut dyn CommandEncoder,
        frame_index: u32,
        scene: &dyn Any,
    );
}

/// Declaration of a pass, consumed by [`FrameGraph::add_node`].
///
/// # Example
///
/// ```ignore
/// let desc = NodeDesc::new("lighting", LightingPass::new(pipeline))
///     .with_input(ResourceDesc::image(albedo, ResourceType::TEXTURE))
///     .with_input(ResourceDesc::image(normals, ResourceType::TEXTURE))
///     .with_output(ResourceDesc::image(hdr_target, ResourceType::ATTACHMENT))
///     .with_label_color([1.0, 0.5, 0.0, 1.0]);
/// let lighting = graph.add_node(&pool, desc)?;
/// ```
///
/// [`FrameGraph::add_node`]: super::FrameGraph::add_node
pub struct NodeDesc {
    pub(crate) name: String,
    pub(crate) pass: Box<dyn RenderPass>,
    pub(crate) queue_type: QueueType,
    pub(crate) enabled: bool,
    pub(crate) label_color: [f32; 4],
    pub(crate) inputs: Vec<ResourceDesc>,
    pub(crate) outputs: Vec<ResourceDesc>,
}

impl NodeDesc {
    /// Create a graphics pass declaration, enabled by default.
    pub fn new(name: impl Into<String>, pass: impl RenderPass + 'static) -> Self {
        Self {
            name: name.into(),
            pass: Box::new(pass),
            queue_type: QueueType::Graphics,
            enabled: true,
            label_color: [0.0, 0.0, 0.0, 1.0],
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the queue type.
    pub fn with_queue_type(mut self, queue_type: QueueType) -> Self {
        self.queue_type = queue_type;
        self
    }

    /// Enable or disable the pass. Disabled passes are skipped entirely,
    /// including from edge computation.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the debug label color used when recording.
    pub fn with_label_color(mut self, color: [f32; 4]) -> Self {
        self.label_color = color;
        self
    }

    /// Declare a resource this pass consumes.
    pub fn with_input(mut self, input: ResourceDesc) -> Self {
        self.inputs.push(input);
        self
    }

    /// Declare a resource this pass produces.
    pub fn with_output(mut self, output: ResourceDesc) -> Self {
        self.outputs.push(output);
        self
    }
}

/// A pass in the graph, with everything derived at build time.
pub(crate) struct Node {
    pub name: String,
    pub pass: Box<dyn RenderPass>,
    pub queue_type: QueueType,
    pub enabled: bool,
    pub label_color: [f32; 4],
    pub inputs: Vec<ResourceId>,
    pub outputs: Vec<ResourceId>,
    /// Downstream consumers, filled in by edge computation.
    pub edges: Vec<NodeHandle>,
    pub image_barriers: Vec<ImageBarrier>,
    pub buffer_barriers: Vec<BufferBarrier>,
    pub viewport: vk::Viewport,
    pub scissor: vk::Rect2D,
}

impl Node {
    pub(crate) fn new(
        name: String,
        pass: Box<dyn RenderPass>,
        queue_type: QueueType,
        enabled: bool,
        label_color: [f32; 4],
    ) -> Self {
        Self {
            name,
            pass,
            queue_type,
            enabled,
            label_color,
            inputs: Vec::new(),
            outputs: Vec::new(),
            edges: Vec::new(),
            image_barriers: Vec::new(),
            buffer_barriers: Vec::new(),
            viewport: vk::Viewport::default(),
            scissor: vk::Rect2D::default(),
        }
    }
}

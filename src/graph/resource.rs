//! Resource declarations and the per-declaration records the graph tracks.

use ash::vk;
use bitflags::bitflags;

use crate::resources::{BufferHandle, ImageHandle};
use super::node::NodeHandle;

bitflags! {
    /// How a pass uses a declared resource.
    ///
    /// The type tag drives both dependency matching and barrier synthesis.
    /// `REFERENCE` may be combined with the other flags to declare an output
    /// that orders against an externally owned resource without claiming to
    /// produce it, so several passes can alias the same resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceType: u8 {
        /// Render target the pass writes to.
        const ATTACHMENT = 1 << 0;
        /// Image the pass samples in a shader.
        const TEXTURE = 1 << 1;
        /// Buffer the pass reads or writes.
        const BUFFER = 1 << 2;
        /// Ordering-only alias of a resource owned elsewhere.
        const REFERENCE = 1 << 3;
    }
}

/// Handle payload of a resource declaration.
///
/// Buffers additionally carry the pipeline stages that touch them, which
/// become the source/destination stages of the synthesized buffer barriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceInfo {
    /// An image registered in the resource pool.
    Image(ImageHandle),
    /// A buffer registered in the resource pool, with its stage usage hint.
    Buffer {
        handle: BufferHandle,
        stage_usage: vk::PipelineStageFlags2,
    },
}

/// A single input or output declaration on a [`NodeDesc`](super::NodeDesc).
#[derive(Debug, Clone)]
pub struct ResourceDesc {
    pub(crate) ty: ResourceType,
    pub(crate) info: ResourceInfo,
}

impl ResourceDesc {
    /// Declare an image resource.
    pub fn image(handle: ImageHandle, ty: ResourceType) -> Self {
        Self {
            ty,
            info: ResourceInfo::Image(handle),
        }
    }

    /// Declare a buffer resource with the pipeline stages that access it.
    pub fn buffer(
        handle: BufferHandle,
        ty: ResourceType,
        stage_usage: vk::PipelineStageFlags2,
    ) -> Self {
        Self {
            ty,
            info: ResourceInfo::Buffer {
                handle,
                stage_usage,
            },
        }
    }

    /// Get the declared resource type.
    pub fn resource_type(&self) -> ResourceType {
        self.ty
    }
}

/// Index of a resource record inside the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ResourceId(u32);

impl ResourceId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One declared input or output, as tracked by the graph.
///
/// Inputs start unresolved; edge computation fills in `producer` and
/// `output` from the registered producer of the same resource name.
#[derive(Debug, Clone)]
pub(crate) struct ResourceRecord {
    pub ty: ResourceType,
    pub info: ResourceInfo,
    /// Node that produces this resource, once resolved.
    pub producer: Option<NodeHandle>,
    /// Output record this input resolved against. For registered outputs
    /// this is the record's own id.
    pub output: Option<ResourceId>,
    /// Identity used for dependency matching, taken from the pool record.
    pub name: String,
}

//! Image layout transitions and memory barriers.
//!
//! The stage/access masks for a layout transition come from a fixed lookup
//! keyed by the layout on each side of the transition. An unhandled layout is
//! a hard error rather than a fallback barrier; a fallback that picks wrong
//! masks would silently admit GPU data races.

use ash::vk;

use crate::error::FrameGraphError;
use crate::resources::ImageDesc;

/// Pipeline stage and access mask pair for one side of a layout transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionState {
    pub stage: vk::PipelineStageFlags2,
    pub access: vk::AccessFlags2,
}

/// Get the stage/access pair for transitioning *out of* a layout.
pub fn source_state(layout: vk::ImageLayout) -> Result<TransitionState, FrameGraphError> {
    let state = match layout {
        vk::ImageLayout::UNDEFINED => TransitionState {
            stage: vk::PipelineStageFlags2::TOP_OF_PIPE,
            access: vk::AccessFlags2::NONE,
        },
        vk::ImageLayout::TRANSFER_DST_OPTIMAL | vk::ImageLayout::TRANSFER_SRC_OPTIMAL => {
            TransitionState {
                stage: vk::PipelineStageFlags2::TRANSFER,
                access: vk::AccessFlags2::TRANSFER_WRITE,
            }
        }
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => TransitionState {
            stage: vk::PipelineStageFlags2::FRAGMENT_SHADER,
            access: vk::AccessFlags2::SHADER_READ,
        },
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => TransitionState {
            stage: vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            access: vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
        },
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => TransitionState {
            stage: vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
            access: vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
        },
        other => return Err(FrameGraphError::UnsupportedSourceLayout(other)),
    };
    Ok(state)
}

/// Get the stage/access pair for transitioning *into* a layout.
pub fn destination_state(layout: vk::ImageLayout) -> Result<TransitionState, FrameGraphError> {
    let state = match layout {
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => TransitionState {
            stage: vk::PipelineStageFlags2::TRANSFER,
            access: vk::AccessFlags2::TRANSFER_WRITE,
        },
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => TransitionState {
            stage: vk::PipelineStageFlags2::TRANSFER,
            access: vk::AccessFlags2::TRANSFER_READ,
        },
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => TransitionState {
            stage: vk::PipelineStageFlags2::FRAGMENT_SHADER,
            access: vk::AccessFlags2::SHADER_READ,
        },
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => TransitionState {
            stage: vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            access: vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
        },
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => TransitionState {
            stage: vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS,
            access: vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
        },
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL => TransitionState {
            stage: vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS,
            access: vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ,
        },
        vk::ImageLayout::PRESENT_SRC_KHR => TransitionState {
            stage: vk::PipelineStageFlags2::BOTTOM_OF_PIPE,
            access: vk::AccessFlags2::NONE,
        },
        other => return Err(FrameGraphError::UnsupportedDestinationLayout(other)),
    };
    Ok(state)
}

/// Check if a format carries a stencil component.
pub(crate) fn has_stencil_component(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D16_UNORM_S8_UINT
            | vk::Format::D24_UNORM_S8_UINT
            | vk::Format::D32_SFLOAT_S8_UINT
            | vk::Format::S8_UINT
    )
}

/// A precomputed image layout-transition barrier.
///
/// Covers all mip levels and array layers of the image, starting at the
/// base subresource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBarrier {
    pub image: vk::Image,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub src_stage: vk::PipelineStageFlags2,
    pub src_access: vk::AccessFlags2,
    pub dst_stage: vk::PipelineStageFlags2,
    pub dst_access: vk::AccessFlags2,
    pub aspect_mask: vk::ImageAspectFlags,
    pub mip_count: u32,
    pub layer_count: u32,
}

impl ImageBarrier {
    /// Build a layout-transition barrier for an image.
    ///
    /// Stage and access masks are taken from the transition lookup tables;
    /// an unsupported layout on either side is an error. Transitions into a
    /// depth/stencil attachment layout force the depth aspect (plus stencil
    /// when the format has one), regardless of the aspect passed in.
    pub fn layout_transition(
        image: &ImageDesc,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
        aspect_mask: vk::ImageAspectFlags,
    ) -> Result<Self, FrameGraphError> {
        let mut aspect_mask = aspect_mask;
        if new_layout == vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL {
            aspect_mask = vk::ImageAspectFlags::DEPTH;
            if has_stencil_component(image.format) {
                aspect_mask |= vk::ImageAspectFlags::STENCIL;
            }
        }

        let src = source_state(old_layout)?;
        let dst = destination_state(new_layout)?;

        Ok(Self {
            image: image.image,
            old_layout,
            new_layout,
            src_stage: src.stage,
            src_access: src.access,
            dst_stage: dst.stage,
            dst_access: dst.access,
            aspect_mask,
            mip_count: image.mip_count,
            layer_count: image.layer_count,
        })
    }

    /// Convert to the Vulkan synchronization2 barrier struct.
    pub fn to_vk(&self) -> vk::ImageMemoryBarrier2<'static> {
        vk::ImageMemoryBarrier2::default()
            .src_stage_mask(self.src_stage)
            .src_access_mask(self.src_access)
            .dst_stage_mask(self.dst_stage)
            .dst_access_mask(self.dst_access)
            .old_layout(self.old_layout)
            .new_layout(self.new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: self.aspect_mask,
                base_mip_level: 0,
                level_count: self.mip_count,
                base_array_layer: 0,
                layer_count: self.layer_count,
            })
    }
}

/// A precomputed buffer memory barrier covering the whole buffer range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferBarrier {
    pub buffer: vk::Buffer,
    pub src_stage: vk::PipelineStageFlags2,
    pub src_access: vk::AccessFlags2,
    pub dst_stage: vk::PipelineStageFlags2,
    pub dst_access: vk::AccessFlags2,
    pub offset: vk::DeviceSize,
    pub size: vk::DeviceSize,
}

impl BufferBarrier {
    /// Convert to the Vulkan synchronization2 barrier struct.
    pub fn to_vk(&self) -> vk::BufferMemoryBarrier2<'static> {
        vk::BufferMemoryBarrier2::default()
            .src_stage_mask(self.src_stage)
            .src_access_mask(self.src_access)
            .dst_stage_mask(self.dst_stage)
            .dst_access_mask(self.dst_access)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .buffer(self.buffer)
            .offset(self.offset)
            .size(self.size)
    }
}

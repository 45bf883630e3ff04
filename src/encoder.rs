//! Command encoding boundary between the graph and the GPU backend.
//!
//! The executor talks to a [`CommandEncoder`] rather than a command buffer
//! directly, so the replay loop can be exercised without a device and pass
//! implementations stay portable across backends. [`VulkanEncoder`] records
//! into a real `vk::CommandBuffer`; [`DummyEncoder`] collects an inspectable
//! command list for tests and diagnostics.

use std::any::Any;
use std::ffi::CString;

use ash::vk;

use crate::graph::barrier::{BufferBarrier, ImageBarrier};

/// Sink for the commands the frame graph emits during replay.
///
/// Barriers, viewport state, and debug labels are emitted by the graph
/// itself; pass callbacks receive the encoder to issue their own draw and
/// dispatch commands, downcasting via [`as_any_mut`](Self::as_any_mut) when
/// they need the concrete backend encoder.
pub trait CommandEncoder {
    /// Open a labeled region for one pass.
    fn begin_debug_label(&mut self, name: &str, color: [f32; 4]);

    /// Close the current labeled region.
    fn end_debug_label(&mut self);

    /// Emit a batch of barriers, image barriers first.
    fn pipeline_barrier(
        &mut self,
        image_barriers: &[ImageBarrier],
        buffer_barriers: &[BufferBarrier],
    );

    /// Set the viewport for the upcoming draws.
    fn set_viewport(&mut self, viewport: vk::Viewport);

    /// Set the scissor rectangle for the upcoming draws.
    fn set_scissor(&mut self, scissor: vk::Rect2D);

    /// Downcast support for backend-specific recording.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Encoder recording into a Vulkan command buffer.
///
/// Barriers are submitted through `vkCmdPipelineBarrier2`; debug labels are
/// emitted only when a debug-utils device is attached.
///
/// The command buffer must be in the recording state for the encoder's
/// lifetime, and nothing else may record into it concurrently.
pub struct VulkanEncoder {
    device: ash::Device,
    debug_utils: Option<ash::ext::debug_utils::Device>,
    command_buffer: vk::CommandBuffer,
}

impl VulkanEncoder {
    /// Create an encoder for a command buffer that is being recorded.
    pub fn new(device: ash::Device, command_buffer: vk::CommandBuffer) -> Self {
        Self {
            device,
            debug_utils: None,
            command_buffer,
        }
    }

    /// Attach a debug-utils device so pass labels show up in captures.
    pub fn with_debug_utils(mut self, debug_utils: ash::ext::debug_utils::Device) -> Self {
        self.debug_utils = Some(debug_utils);
        self
    }

    /// Get the underlying command buffer.
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Get the underlying device.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }
}

impl CommandEncoder for VulkanEncoder {
    fn begin_debug_label(&mut self, name: &str, color: [f32; 4]) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        let Ok(name) = CString::new(name) else {
            return;
        };
        let label = vk::DebugUtilsLabelEXT::default()
            .label_name(&name)
            .color(color);
        unsafe {
            debug_utils.cmd_begin_debug_utils_label(self.command_buffer, &label);
        }
    }

    fn end_debug_label(&mut self) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        unsafe {
            debug_utils.cmd_end_debug_utils_label(self.command_buffer);
        }
    }

    fn pipeline_barrier(
        &mut self,
        image_barriers: &[ImageBarrier],
        buffer_barriers: &[BufferBarrier],
    ) {
        let image_barriers: Vec<vk::ImageMemoryBarrier2> =
            image_barriers.iter().map(ImageBarrier::to_vk).collect();
        let buffer_barriers: Vec<vk::BufferMemoryBarrier2> =
            buffer_barriers.iter().map(BufferBarrier::to_vk).collect();

        let dependency_info = vk::DependencyInfo::default()
            .image_memory_barriers(&image_barriers)
            .buffer_memory_barriers(&buffer_barriers);

        unsafe {
            self.device
                .cmd_pipeline_barrier2(self.command_buffer, &dependency_info);
        }
    }

    fn set_viewport(&mut self, viewport: vk::Viewport) {
        unsafe {
            self.device
                .cmd_set_viewport(self.command_buffer, 0, &[viewport]);
        }
    }

    fn set_scissor(&mut self, scissor: vk::Rect2D) {
        unsafe {
            self.device
                .cmd_set_scissor(self.command_buffer, 0, &[scissor]);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One command captured by a [`DummyEncoder`].
#[derive(Debug, Clone)]
pub enum EncodedCommand {
    BeginDebugLabel { name: String, color: [f32; 4] },
    EndDebugLabel,
    PipelineBarrier {
        image_barriers: Vec<ImageBarrier>,
        buffer_barriers: Vec<BufferBarrier>,
    },
    SetViewport(vk::Viewport),
    SetScissor(vk::Rect2D),
}

/// Encoder that records commands into memory instead of a GPU.
///
/// Used by tests to assert on the exact command stream the graph replays,
/// and handy for dumping a frame's schedule when debugging pass wiring.
#[derive(Debug, Default)]
pub struct DummyEncoder {
    commands: Vec<EncodedCommand>,
}

impl DummyEncoder {
    /// Create a new empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all commands recorded so far.
    pub fn commands(&self) -> &[EncodedCommand] {
        &self.commands
    }

    /// Get the number of recorded commands.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Forget all recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl CommandEncoder for DummyEncoder {
    fn begin_debug_label(&mut self, name: &str, color: [f32; 4]) {
        self.commands.push(EncodedCommand::BeginDebugLabel {
            name: name.to_owned(),
            color,
        });
    }

    fn end_debug_label(&mut self) {
        self.commands.push(EncodedCommand::EndDebugLabel);
    }

    fn pipeline_barrier(
        &mut self,
        image_barriers: &[ImageBarrier],
        buffer_barriers: &[BufferBarrier],
    ) {
        self.commands.push(EncodedCommand::PipelineBarrier {
            image_barriers: image_barriers.to_vec(),
            buffer_barriers: buffer_barriers.to_vec(),
        });
    }

    fn set_viewport(&mut self, viewport: vk::Viewport) {
        self.commands.push(EncodedCommand::SetViewport(viewport));
    }

    fn set_scissor(&mut self, scissor: vk::Rect2D) {
        self.commands.push(EncodedCommand::SetScissor(scissor));
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

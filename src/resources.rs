//! Externally owned GPU resources referenced by the frame graph.
//!
//! The frame graph never creates or destroys GPU objects. The surrounding
//! renderer registers its images and buffers in a [`ResourcePool`] and hands
//! the resulting handles to the graph, which uses them to look up dimensions,
//! formats, and usage flags during barrier computation.
//!
//! Records are stored arena-style and addressed by index handles, so the
//! whole pool can be cleared and repopulated on resize without invalidating
//! anything that does not hold a stale handle. The graph must be rebuilt
//! whenever the pool contents change.

use ash::vk;

/// Handle to an image record in a [`ResourcePool`].
///
/// `ImageHandle` is `Copy` and cheap to pass around. It is only valid within
/// the pool that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(u32);

impl ImageHandle {
    fn new(index: u32) -> Self {
        Self(index)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a buffer record in a [`ResourcePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u32);

impl BufferHandle {
    fn new(index: u32) -> Self {
        Self(index)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// An image registered with the frame graph.
///
/// The `name` doubles as the resource identity used to match pass outputs to
/// pass inputs, so it must be unique among images the graph touches.
#[derive(Debug, Clone)]
pub struct ImageDesc {
    /// Debug name, also the dependency-matching identity.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: vk::Format,
    /// Usage flags; `DEPTH_STENCIL_ATTACHMENT` selects depth barrier layouts.
    pub usage: vk::ImageUsageFlags,
    /// Number of mip levels covered by barriers.
    pub mip_count: u32,
    /// Number of array layers covered by barriers.
    pub layer_count: u32,
    /// Underlying Vulkan image.
    pub image: vk::Image,
}

impl ImageDesc {
    /// Create a 2D image record with a single mip level and array layer.
    pub fn new_2d(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
            usage,
            mip_count: 1,
            layer_count: 1,
            image: vk::Image::null(),
        }
    }

    /// Set the number of mip levels.
    pub fn with_mip_count(mut self, mip_count: u32) -> Self {
        self.mip_count = mip_count;
        self
    }

    /// Set the number of array layers.
    pub fn with_layer_count(mut self, layer_count: u32) -> Self {
        self.layer_count = layer_count;
        self
    }

    /// Attach the underlying Vulkan image handle.
    pub fn with_raw_image(mut self, image: vk::Image) -> Self {
        self.image = image;
        self
    }

    /// Check whether this image is used as a depth/stencil attachment.
    pub fn is_depth_stencil(&self) -> bool {
        self.usage
            .contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
    }
}

/// A buffer registered with the frame graph.
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Debug name, also the dependency-matching identity.
    pub name: String,
    /// Size in bytes.
    pub size: vk::DeviceSize,
    /// Underlying Vulkan buffer.
    pub buffer: vk::Buffer,
}

impl BufferDesc {
    /// Create a buffer record.
    pub fn new(name: impl Into<String>, size: vk::DeviceSize) -> Self {
        Self {
            name: name.into(),
            size,
            buffer: vk::Buffer::null(),
        }
    }

    /// Attach the underlying Vulkan buffer handle.
    pub fn with_raw_buffer(mut self, buffer: vk::Buffer) -> Self {
        self.buffer = buffer;
        self
    }
}

/// Arena of image and buffer records the frame graph resolves handles against.
///
/// The pool owns only descriptions; the actual GPU objects belong to the
/// renderer. On resize the renderer clears the pool, registers the recreated
/// resources, and rebuilds the graph.
#[derive(Debug, Default)]
pub struct ResourcePool {
    images: Vec<ImageDesc>,
    buffers: Vec<BufferDesc>,
}

impl ResourcePool {
    /// Create a new empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image and return its handle.
    pub fn add_image(&mut self, image: ImageDesc) -> ImageHandle {
        let handle = ImageHandle::new(self.images.len() as u32);
        self.images.push(image);
        handle
    }

    /// Register a buffer and return its handle.
    pub fn add_buffer(&mut self, buffer: BufferDesc) -> BufferHandle {
        let handle = BufferHandle::new(self.buffers.len() as u32);
        self.buffers.push(buffer);
        handle
    }

    /// Look up an image record.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not belong to this pool. A stale handle
    /// after [`clear`](Self::clear) means the graph was not rebuilt against
    /// the recreated resources.
    pub fn image(&self, handle: ImageHandle) -> &ImageDesc {
        &self.images[handle.index()]
    }

    /// Look up a buffer record.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not belong to this pool.
    pub fn buffer(&self, handle: BufferHandle) -> &BufferDesc {
        &self.buffers[handle.index()]
    }

    /// Look up an image record without panicking.
    pub fn get_image(&self, handle: ImageHandle) -> Option<&ImageDesc> {
        self.images.get(handle.index())
    }

    /// Look up a buffer record without panicking.
    pub fn get_buffer(&self, handle: BufferHandle) -> Option<&BufferDesc> {
        self.buffers.get(handle.index())
    }

    /// Get the number of registered images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Get the number of registered buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Drop all records, invalidating every outstanding handle.
    pub fn clear(&mut self) {
        self.images.clear();
        self.buffers.clear();
    }
}

static_assertions::assert_impl_all!(ResourcePool: Send, Sync);
static_assertions::assert_impl_all!(ImageHandle: Send, Sync);
static_assertions::assert_impl_all!(BufferHandle: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup_image() {
        let mut pool = ResourcePool::new();
        let handle = pool.add_image(ImageDesc::new_2d(
            "gbuffer_albedo",
            1920,
            1080,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
        ));

        let image = pool.image(handle);
        assert_eq!(image.name, "gbuffer_albedo");
        assert_eq!(image.width, 1920);
        assert_eq!(image.height, 1080);
        assert!(!image.is_depth_stencil());
    }

    #[test]
    fn test_depth_stencil_detection() {
        let image = ImageDesc::new_2d(
            "depth",
            1280,
            720,
            vk::Format::D32_SFLOAT,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
        );
        assert!(image.is_depth_stencil());
    }

    #[test]
    fn test_add_and_lookup_buffer() {
        let mut pool = ResourcePool::new();
        let handle = pool.add_buffer(BufferDesc::new("draw_commands", 4096));

        assert_eq!(pool.buffer(handle).name, "draw_commands");
        assert_eq!(pool.buffer(handle).size, 4096);
    }

    #[test]
    fn test_image_builder_defaults() {
        let image = ImageDesc::new_2d(
            "bloom",
            640,
            360,
            vk::Format::B10G11R11_UFLOAT_PACK32,
            vk::ImageUsageFlags::COLOR_ATTACHMENT,
        );
        assert_eq!(image.mip_count, 1);
        assert_eq!(image.layer_count, 1);
        assert_eq!(image.image, vk::Image::null());

        let image = image.with_mip_count(5).with_layer_count(6);
        assert_eq!(image.mip_count, 5);
        assert_eq!(image.layer_count, 6);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut pool = ResourcePool::new();
        let handle = pool.add_image(ImageDesc::new_2d(
            "scratch",
            4,
            4,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageUsageFlags::COLOR_ATTACHMENT,
        ));

        pool.clear();

        assert_eq!(pool.image_count(), 0);
        assert!(pool.get_image(handle).is_none());
    }
}

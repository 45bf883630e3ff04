//! Frame graph error types.

use ash::vk;
use thiserror::Error;

/// Errors produced while wiring or building the frame graph.
///
/// Every variant is a configuration mistake in pass declarations. There is
/// no recovery path: the caller must fix the declarations, [`clear`] the
/// graph, and rebuild. After an error the graph is left in an unspecified
/// state and must not be replayed.
///
/// [`clear`]: crate::FrameGraph::clear
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameGraphError {
    /// Two passes declared the same non-reference output resource.
    ///
    /// Use [`ResourceType::REFERENCE`](crate::ResourceType::REFERENCE) when
    /// several passes need to alias an externally owned resource for
    /// ordering purposes.
    #[error("resource '{resource}' is already produced by node '{producer}'")]
    DuplicateProducer { resource: String, producer: String },

    /// A pass consumes a resource that no pass produces.
    #[error("resource '{resource}' consumed by node '{consumer}' is not produced by any node")]
    UnresolvedInput { resource: String, consumer: String },

    /// A resource was declared with an empty type set.
    #[error("node '{node}' declares a resource without a type")]
    UntypedResource { node: String },

    /// No stage/access mapping exists for transitioning out of this layout.
    #[error("unsupported source layout for image transition: {0:?}")]
    UnsupportedSourceLayout(vk::ImageLayout),

    /// No stage/access mapping exists for transitioning into this layout.
    #[error("unsupported destination layout for image transition: {0:?}")]
    UnsupportedDestinationLayout(vk::ImageLayout),

    /// A graphics node has no attachment to derive its viewport from.
    #[error("graphics node '{node}' has no attachment to derive a viewport from")]
    MissingAttachment { node: String },

    /// The pass graph is not acyclic.
    #[error("dependency cycle between node '{from}' and node '{to}'")]
    DependencyCycle { from: String, to: String },
}

static_assertions::assert_impl_all!(FrameGraphError: Send, Sync);

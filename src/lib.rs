pub mod node_allocator;
pub mod rgb_tree;

pub use node_allocator::FromSlice;
pub use node_allocator::NodeAllocatorMap;
pub use node_allocator::OrderedNodeAllocatorMap;
pub use node_allocator::ZeroCopy;
pub use node_allocator::SENTINEL;

pub use node_allocator::NodeAllocator;
pub use rgb_tree::RgbTree;

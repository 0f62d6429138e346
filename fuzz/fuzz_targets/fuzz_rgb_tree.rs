#![no_main]
use libfuzzer_sys::fuzz_target;
use rgb_tree::RgbTree;
use rgb_tree_fuzz::{perform_action, NodeAllocatorMapAction};

fuzz_target!(|actions: Vec<NodeAllocatorMapAction::<u64, u64>>| {
    let mut tree = RgbTree::<u64, u64, 8192, 2>::default();
    let mut keys = Vec::new();
    for action in actions {
        perform_action(&mut tree, &mut keys, action);
        assert!(tree.validate().is_ok());
    }
});

use bytemuck::Pod;
use bytemuck::Zeroable;
use node_allocator::*;
use rand::rngs::ThreadRng;
use rand::thread_rng;
use rand::{self, Rng};
use rgb_tree::*;
use std::collections::BTreeMap;

const MAX_SIZE: usize = 500;

#[tokio::test(flavor = "multi_thread")]
async fn test_initialize() {
    let rbt = RgbTree::<MAX_SIZE, 2, u64, u64>::new();

    assert_eq!(
        rbt.sequence_number, 0,
        "Init failed to set sequence properly"
    );

    assert_eq!(rbt.root, SENTINEL, "Init failed to set head properly");
}

#[repr(C)]
#[derive(Default, Copy, Clone, PartialEq)]
struct Order {
    a: u128,
    b: u128,
    size: u64,
}

unsafe impl Zeroable for Order {}
unsafe impl Pod for Order {}

impl Order {
    pub fn new_random(r: &mut ThreadRng) -> Self {
        Self {
            a: r.gen::<u128>(),
            b: r.gen::<u128>(),
            size: r.gen::<u64>(),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_simulate() {
    type Rbt = RgbTree<MAX_SIZE, 2, u128, Order>;
    let mut rbt = Rbt::new();
    println!("Size: {}", std::mem::size_of::<Rbt>());
    let mut rng = thread_rng();
    let mut keys = vec![];
    let mut map = BTreeMap::new();
    let mut s = 0;
    for _ in 0..(MAX_SIZE - 1) {
        let k = rng.gen::<u128>();
        let v = Order::new_random(&mut rng);
        assert!(rbt.insert(k, v).is_some());
        s += 1;
        assert!(s == rbt.size());
        assert!(rbt.validate().is_ok());
        map.insert(k, v);
        keys.push(k);
    }

    let k = rng.gen::<u128>();
    let v = Order::new_random(&mut rng);
    assert!(rbt.insert(k, v).is_none(), "should refuse when full");

    for k in keys.iter() {
        assert!(rbt.remove(k).is_some());
        s -= 1;
        map.remove(k);
    }
    assert!(rbt.validate().is_ok());
    keys = vec![];

    for _i in 0..(MAX_SIZE >> 1) {
        let k = rng.gen::<u128>();
        let v = Order::new_random(&mut rng);
        assert!(rbt.insert(k, v).is_some());
        s += 1;
        map.insert(k, v);
        keys.push(k);
    }

    for _ in 0..10000 {
        assert!(s == rbt.size());
        let sample = rng.gen::<f64>();
        if sample < 0.33 {
            if rbt.size() >= MAX_SIZE - 1 {
                continue;
            }
            let k = rng.gen::<u128>();
            let v = Order::new_random(&mut rng);
            assert!(rbt.insert(k, v).is_some());
            s += 1;
            map.insert(k, v);
            keys.push(k);
        } else if sample < 0.66 {
            if keys.is_empty() {
                continue;
            }
            let j = rng.gen_range(0, keys.len());
            let key = keys[j];
            keys.swap_remove(j);
            assert!(rbt[&key] == map[&key]);
            rbt.remove(&key);
            map.remove(&key);
            s -= 1;
        } else {
            if keys.is_empty() {
                continue;
            }
            let j = rng.gen_range(0, keys.len());
            let key = keys[j];
            let v = Order::new_random(&mut rng);
            *rbt.get_mut(&key).unwrap() = v;
            map.insert(key, v);
        }
    }

    assert!(rbt.validate().is_ok());
    let nodes = rbt.inorder_traversal();
    for ((k1, v1), (k2, v2)) in map.iter().zip(nodes.iter()) {
        assert!(*k1 == *k2);
        assert!(*v1 == *v2);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicate_keys_accrete_left_and_stay_balanced() {
    type Rbt = RgbTree<64, 3, u64, u64>;
    let mut rbt = Rbt::new();
    let mut addrs = vec![];
    for k in [5u64, 5, 5, 2, 2, 8] {
        addrs.push(rbt.insert(k, k).unwrap());
        assert!(rbt.validate().is_ok());
    }
    let nodes = rbt.inorder_traversal();
    let keys: Vec<u64> = nodes.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![2, 2, 5, 5, 5, 8]);

    for addr in addrs {
        rbt.remove_link(addr);
        assert!(rbt.validate().is_ok());
    }
    assert_eq!(rbt.root, SENTINEL);
}

use na::{Point3, Vector3};
use sahbvh3d::bounding_volume::{Aabb, BoundingVolume};
use sahbvh3d::partitioning::{Bvh2BuildOptions, Bvh2Builder, Bvh2Level};
use sahbvh3d::utils::sort_by_axis;

fn random_boxes(rng: &mut oorandom::Rand32, len: usize) -> Vec<Aabb> {
    (0..len)
        .map(|_| {
            let center = Point3::new(
                rng.rand_float() * 100.0 - 50.0,
                rng.rand_float() * 100.0 - 50.0,
                rng.rand_float() * 20.0,
            );
            let half_extents = Vector3::new(rng.rand_float(), rng.rand_float(), rng.rand_float());
            Aabb::from_half_extents(center, half_extents)
        })
        .collect()
}

#[test]
fn random_trees_are_well_formed() {
    let mut rng = oorandom::Rand32::new(0xdead_beef);

    for len in [1, 2, 3, 7, 8, 33, 100, 1000] {
        let boxes = random_boxes(&mut rng, len);
        let bvh = Bvh2Builder::build_bottom_level(&boxes).unwrap();

        bvh.assert_well_formed();
        bvh.assert_is_depth_first();
        bvh.assert_encloses(&boxes);

        let expected_nodes = if len == 1 { 1 } else { 2 * len as u32 - 1 };
        assert_eq!(bvh.node_count(), expected_nodes);
        assert!(bvh.nodes().len() <= 2 * len);

        // Every primitive appears in exactly one leaf.
        let mut leaf_primitives: Vec<_> = (0..bvh.slot_count())
            .filter_map(|slot| {
                if slot == 1 && len > 1 {
                    None
                } else {
                    bvh.leaf_primitive(slot)
                }
            })
            .collect();
        leaf_primitives.sort_unstable();
        assert_eq!(leaf_primitives, (0..len as u32).collect::<Vec<_>>());

        let root_aabb = boxes
            .iter()
            .fold(Aabb::new_invalid(), |acc, aabb| acc.merged(aabb));
        assert_eq!(bvh.root_aabb(), root_aabb);
    }
}

#[test]
fn internal_nodes_are_the_union_of_their_children() {
    let mut rng = oorandom::Rand32::new(3);
    let boxes = random_boxes(&mut rng, 500);
    let bvh = Bvh2Builder::build_top_level(&boxes).unwrap();

    let mut internal_count = 0;
    let mut leaf_count = 0;

    // Scanning the whole slot array must skip the padding slot 1.
    for (slot, node) in bvh.nodes().iter().enumerate() {
        if let Some([left, right]) = node.children() {
            assert!(left as usize > slot);
            let left = bvh.nodes()[left as usize].aabb();
            let right = bvh.nodes()[right as usize].aabb();
            assert_eq!(node.aabb(), left.merged(&right));
            internal_count += 1;
        } else if node.is_leaf() {
            leaf_count += 1;
        } else {
            assert_eq!(slot, 1);
            assert!(node.is_unused());
            assert!(node.leaf_range().is_none());
        }
    }

    assert_eq!(internal_count, 499);
    assert_eq!(leaf_count, 500);
    assert_eq!(bvh.leaf_primitive(1), None);
}

#[test]
fn rebuild_matches_one_shot_build() {
    let mut rng = oorandom::Rand32::new(11);
    let initial = random_boxes(&mut rng, 256);
    let mut rebuilt = Bvh2Builder::build_top_level(&initial).unwrap();
    assert_eq!(rebuilt.level(), Bvh2Level::TopLevel);
    assert!(rebuilt.is_rebuildable());

    for _ in 0..4 {
        let moved = random_boxes(&mut rng, 256);
        rebuilt.rebuild(&moved).unwrap();

        let one_shot = Bvh2Builder::build_top_level(&moved).unwrap();
        assert_eq!(rebuilt.nodes(), one_shot.nodes());
        assert_eq!(rebuilt.primitive_indices(), one_shot.primitive_indices());
        assert_eq!(rebuilt.primitives(), &moved[..]);

        let bottom = Bvh2Builder::build_bottom_level(&moved).unwrap();
        assert_eq!(rebuilt.nodes(), bottom.nodes());
        assert_eq!(rebuilt.primitive_indices(), bottom.primitive_indices());
    }

    // Rebuilding twice from the same input is deterministic.
    let snapshot = (rebuilt.nodes().to_vec(), rebuilt.primitive_indices().to_vec());
    let last = rebuilt.primitives().to_vec();
    rebuilt.rebuild(&last).unwrap();
    assert_eq!(snapshot.0, rebuilt.nodes());
    assert_eq!(snapshot.1, rebuilt.primitive_indices());
}

#[test]
fn build_options_do_not_change_the_tree() {
    let mut rng = oorandom::Rand32::new(17);
    let boxes = random_boxes(&mut rng, 400);
    let unpruned = Bvh2BuildOptions {
        early_termination: false,
    };

    let a = Bvh2Builder::build_bottom_level(&boxes).unwrap();
    let b = Bvh2Builder::build_bottom_level_with_options(&boxes, unpruned).unwrap();
    assert!(a.options().early_termination);
    assert!(!b.options().early_termination);
    assert_eq!(a.nodes(), b.nodes());
    assert_eq!(a.primitive_indices(), b.primitive_indices());
}

#[test]
fn bottom_level_releases_its_scratch_buffers() {
    let mut rng = oorandom::Rand32::new(23);
    let boxes = random_boxes(&mut rng, 1000);
    let bottom = Bvh2Builder::build_bottom_level(&boxes).unwrap();
    let top = Bvh2Builder::build_top_level(&boxes).unwrap();

    assert_eq!(bottom.level(), Bvh2Level::BottomLevel);
    assert!(!bottom.is_rebuildable());
    assert!(bottom.primitives().is_empty());
    assert!(bottom.heap_memory_size() < top.heap_memory_size());
    assert!(bottom.total_memory_size() > bottom.heap_memory_size());
    assert_eq!(bottom.primitive_indices().len(), 1000);
}

#[test]
fn axis_sort_is_ordered_and_stable() {
    let mut rng = oorandom::Rand32::new(29);
    let boxes: Vec<_> = (0..300)
        .map(|_| {
            // Few distinct centroids to get many ties.
            let x = rng.rand_range(0..5) as f32 - 2.0;
            let y = rng.rand_range(0..3) as f32;
            Aabb::from_half_extents(Point3::new(x, y, -x), Vector3::new(0.5, 0.25, 1.0))
        })
        .collect();

    for axis in 0..3 {
        let perm = sort_by_axis(&boxes, axis);
        assert_eq!(perm.len(), boxes.len());

        for pair in perm.windows(2) {
            let (a, b) = (pair[0] as usize, pair[1] as usize);
            let (ka, kb) = (boxes[a].centroid(axis), boxes[b].centroid(axis));
            assert!(ka < kb || (ka == kb && a < b));
        }
    }
}

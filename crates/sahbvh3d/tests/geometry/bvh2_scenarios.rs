use na::{Point3, Vector3};
use sahbvh3d::bounding_volume::Aabb;
use sahbvh3d::partitioning::{Bvh2Builder, Bvh2Node};

fn unit_box(x: f32) -> Aabb {
    Aabb::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
}

#[test]
fn four_unit_boxes_along_x() {
    let boxes: Vec<_> = (0..4).map(|i| unit_box(i as f32)).collect();
    let bvh = Bvh2Builder::build_bottom_level(&boxes).unwrap();
    bvh.assert_well_formed();
    bvh.assert_encloses(&boxes);

    assert_eq!(bvh.node_count(), 7);
    assert_eq!(
        bvh.root_aabb(),
        Aabb::new(Point3::origin(), Point3::new(4.0, 1.0, 1.0))
    );

    // The root splits the boxes two by two along x.
    let nodes = bvh.nodes();
    let [left, right] = nodes[0].children().unwrap();
    assert_eq!((left, right), (2, 3));
    assert_eq!(
        nodes[2].aabb(),
        Aabb::new(Point3::origin(), Point3::new(2.0, 1.0, 1.0))
    );
    assert_eq!(
        nodes[3].aabb(),
        Aabb::new(Point3::new(2.0, 0.0, 0.0), Point3::new(4.0, 1.0, 1.0))
    );
    assert_eq!(bvh.reachable_leaf_count(2), 2);
    assert_eq!(bvh.reachable_leaf_count(3), 2);
    assert_eq!(bvh.subtree_depth(0), 3);

    // Preorder allocation: the children of the left child come before the ones of the
    // right child.
    assert_eq!(nodes[2].children(), Some([4, 5]));
    assert_eq!(nodes[3].children(), Some([6, 7]));
    assert_eq!(bvh.primitive_indices(), &[0, 1, 2, 3]);

    for (slot, expected) in [(4, 0), (5, 1), (6, 2), (7, 3)] {
        assert_eq!(bvh.leaf_primitive(slot), Some(expected));
        assert_eq!(nodes[slot as usize].aabb(), boxes[expected as usize]);
    }
}

#[test]
fn single_box() {
    let aabb = Aabb::from_half_extents(Point3::new(1.0, -2.0, 3.0), Vector3::new(0.5, 1.0, 2.0));

    for bvh in [
        Bvh2Builder::build_bottom_level(&[aabb]).unwrap(),
        Bvh2Builder::build_top_level(&[aabb]).unwrap(),
    ] {
        assert_eq!(bvh.node_count(), 1);
        assert_eq!(bvh.nodes(), &[Bvh2Node::leaf(aabb, 0, 1)]);

        let root = bvh.root().unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.count(), 1);
        assert_eq!(root.left(), 0);
        assert_eq!(root.aabb(), aabb);
        assert_eq!(bvh.primitive_indices(), &[0]);
        assert_eq!(bvh.subtree_depth(0), 1);
        bvh.assert_well_formed();
        bvh.assert_is_depth_first();
    }
}

#[test]
fn identical_boxes_terminate() {
    for len in [2, 3, 16, 500] {
        let boxes = vec![Aabb::new(Point3::new(5.0, 5.0, 5.0), Point3::new(5.0, 5.0, 5.0)); len];
        let bvh = Bvh2Builder::build_top_level(&boxes).unwrap();

        assert_eq!(bvh.node_count(), 2 * len as u32 - 1);
        bvh.assert_well_formed();
        bvh.assert_encloses(&boxes);

        for node in bvh.nodes().iter().filter(|node| node.is_leaf()) {
            assert_eq!(node.count(), 1);
        }
    }
}

#[test]
fn flat_triangles_in_a_plane() {
    // Zero-thickness boxes, as produced by axis-aligned triangles.
    let boxes: Vec<_> = (0..64)
        .map(|i| {
            let (x, y) = ((i % 8) as f32, (i / 8) as f32);
            Aabb::new(Point3::new(x, y, 0.0), Point3::new(x + 1.0, y + 1.0, 0.0))
        })
        .collect();
    let bvh = Bvh2Builder::build_bottom_level(&boxes).unwrap();
    bvh.assert_well_formed();
    bvh.assert_is_depth_first();
    bvh.assert_encloses(&boxes);
    assert_eq!(bvh.node_count(), 127);
    // A regular grid of 2^6 cells splits evenly.
    assert_eq!(bvh.subtree_depth(0), 7);
}

use glam::{Mat4, Vec3};

use clustered_shading::{
    Camera, ClusterConfig, ClusterGrid, FrameInput, GridDims, Light, LightClusterAssigner,
};

fn grid(x: u32, y: u32, z: u32, max: u32) -> ClusterGrid {
    ClusterGrid::new(&ClusterConfig::new(GridDims::new(x, y, z), max)).expect("valid config")
}

fn frame(camera: Camera, lights: Vec<Light>) -> FrameInput {
    FrameInput {
        camera,
        view: Mat4::IDENTITY,
        lights,
    }
}

fn test_camera() -> Camera {
    Camera::new(1.0, 100.0, 60.0, 1.0)
}

#[test]
fn single_light_on_forward_axis_fills_a_centered_band() {
    let mut grid = grid(4, 4, 4, 8);
    let frame = frame(
        test_camera(),
        vec![Light::white(Vec3::new(0.0, 0.0, -10.0), 5.0)],
    );
    LightClusterAssigner::update(&mut grid, &frame);

    let layout = *grid.layout();
    for y in 1..3 {
        for x in 1..3 {
            let cluster = layout.flatten(x, y, 0);
            assert_eq!(grid.count(cluster), 1, "center cluster ({x}, {y}, 0)");
            assert_eq!(grid.light_indices(cluster).collect::<Vec<_>>(), vec![0]);
        }
    }
    for cluster in 0..layout.element_count() {
        let (_, _, z) = layout.unflatten(cluster);
        assert!(grid.count(cluster) <= 1);
        if z > 0 {
            assert_eq!(grid.count(cluster), 0, "cluster {cluster} beyond the light");
        }
    }
    assert_eq!(grid.occupied_clusters(), 16);
}

#[test]
fn capacity_keeps_the_first_lights_in_list_order() {
    let mut grid = grid(1, 1, 1, 2);
    let frame = frame(
        test_camera(),
        vec![
            Light::white(Vec3::new(0.0, 0.0, -10.0), 1.0),
            Light::white(Vec3::new(0.5, 0.0, -20.0), 1.0),
            Light::white(Vec3::new(-0.5, 0.5, -30.0), 1.0),
        ],
    );
    LightClusterAssigner::update(&mut grid, &frame);

    assert_eq!(grid.count(0), 2);
    assert_eq!(grid.light_indices(0).collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn no_cluster_exceeds_capacity() {
    let max = 3;
    let mut grid = grid(4, 4, 4, max);
    let lights = (0..50)
        .map(|i| {
            let t = i as f32;
            Light::white(Vec3::new((t * 0.37).sin(), (t * 0.53).cos(), -5.0 - t), 4.0)
        })
        .collect();
    LightClusterAssigner::update(&mut grid, &frame(test_camera(), lights));

    let layout = *grid.layout();
    let counts: Vec<u32> = (0..layout.element_count()).map(|c| grid.count(c)).collect();
    assert!(counts.iter().all(|count| *count <= max));
    assert!(counts.contains(&max), "some cluster should be saturated");
}

#[test]
fn dropping_is_per_cluster_not_global() {
    // Two clusters side by side; the left one saturates, the right one does not.
    let mut grid = grid(2, 1, 1, 1);
    let frame = frame(
        test_camera(),
        vec![
            Light::white(Vec3::new(-10.0, 0.0, -50.0), 1.0),
            Light::white(Vec3::new(-12.0, 0.0, -50.0), 1.0),
            Light::white(Vec3::new(10.0, 0.0, -50.0), 1.0),
        ],
    );
    LightClusterAssigner::update(&mut grid, &frame);

    assert_eq!(grid.light_indices(0).collect::<Vec<_>>(), vec![0]);
    assert_eq!(grid.light_indices(1).collect::<Vec<_>>(), vec![2]);
}

#[test]
fn growing_radius_never_shrinks_the_range() {
    let layout = *grid(8, 8, 8, 4).layout();
    for fov in [60.0_f32, 90.0, 120.0] {
        let camera = Camera::new(1.0, 100.0, fov, 1.0);
        let assigner = LightClusterAssigner::new(camera, Mat4::IDENTITY);
        for depth in [10.0_f32, 30.0, 60.0] {
            let half = camera.half_extents(depth);
            for fx in [-0.9_f32, -0.5, 0.0, 0.5, 0.9] {
                for fy in [-0.9_f32, 0.5] {
                    let center = Vec3::new(fx * half.x, fy * half.y, -depth);
                    let mut previous = assigner.cluster_range(&layout, &Light::white(center, 0.0));
                    // Stay in front of the eye: the sphere never reaches depth 0.
                    for step in 1..=90 {
                        let radius = depth * 0.01 * step as f32;
                        let range = assigner.cluster_range(&layout, &Light::white(center, radius));
                        for (axis, old, new) in [
                            ('x', &previous.x, &range.x),
                            ('y', &previous.y, &range.y),
                            ('z', &previous.z, &range.z),
                        ] {
                            assert!(
                                new.start <= old.start && new.end >= old.end,
                                "fov {fov}: {axis} range shrank from {old:?} to {new:?} \
                                 at radius {radius} for {center}"
                            );
                        }
                        previous = range;
                    }
                }
            }
        }
    }
}

#[test]
fn zero_radius_lights_outside_the_frustum_touch_nothing() {
    let mut grid = grid(4, 4, 4, 8);
    let frame = frame(
        test_camera(),
        vec![
            Light::white(Vec3::new(0.0, 0.0, 10.0), 0.0),
            Light::white(Vec3::new(0.0, 0.0, -500.0), 0.0),
            Light::white(Vec3::new(1000.0, 0.0, -10.0), 0.0),
            Light::white(Vec3::new(0.0, -1000.0, -10.0), 0.0),
        ],
    );
    LightClusterAssigner::update(&mut grid, &frame);
    assert_eq!(grid.total_assignments(), 0);
}

#[test]
fn update_discards_the_previous_frame() {
    let mut grid = grid(4, 4, 4, 8);
    let lit = frame(
        test_camera(),
        vec![Light::white(Vec3::new(0.0, 0.0, -40.0), 10.0)],
    );
    LightClusterAssigner::update(&mut grid, &lit);
    assert!(grid.occupied_clusters() > 0);

    LightClusterAssigner::update(&mut grid, &frame(test_camera(), Vec::new()));
    assert_eq!(grid.occupied_clusters(), 0);
}

#[test]
fn fragment_lookup_lands_inside_the_assigned_range() {
    let camera = Camera::new(0.5, 60.0, 70.0, 1.6);
    let layout = *grid(8, 6, 10, 4).layout();
    let assigner = LightClusterAssigner::new(camera, Mat4::IDENTITY);

    for depth in [2.0_f32, 7.5, 13.0, 29.0, 41.0, 55.0] {
        let half = camera.half_extents(depth);
        for fx in [-0.8_f32, -0.3, 0.1, 0.45, 0.8] {
            for fy in [-0.75_f32, -0.2, 0.35, 0.7] {
                let position = Vec3::new(fx * half.x, fy * half.y, -depth);
                let cluster = assigner
                    .cluster_at(&layout, position)
                    .unwrap_or_else(|| panic!("{position} should be inside the grid"));
                let (x, y, z) = layout.unflatten(cluster);
                let range = assigner.cluster_range(&layout, &Light::white(position, 0.05));
                assert!(
                    range.contains(x, y, z),
                    "fragment cluster ({x}, {y}, {z}) outside {range:?} at {position}"
                );
            }
        }
    }
}

#[test]
fn sphere_around_the_eye_spans_the_full_cross_section() {
    // The near corner lies behind the eye, so both x/y bounds project through
    // a negative half extent and land on opposite grid edges. The light ends
    // up in every column from the camera out to its far depth.
    let mut grid = grid(4, 4, 4, 8);
    let light = Light::white(Vec3::new(0.0, 0.0, -10.0), 20.0);
    let range = LightClusterAssigner::new(test_camera(), Mat4::IDENTITY)
        .cluster_range(grid.layout(), &light);
    assert_eq!((range.x.clone(), range.y.clone(), range.z.clone()), (0..4, 0..4, 0..2));

    LightClusterAssigner::update(&mut grid, &frame(test_camera(), vec![light]));
    assert_eq!(grid.total_assignments(), 32);
}

#[test]
fn pitched_camera_sees_lights_along_its_forward_axis() {
    let mut grid = grid(4, 4, 4, 8);
    let view = clustered_shading::view_from_pose(Vec3::ZERO, Vec3::new(90.0, 0.0, 0.0));
    let frame = FrameInput {
        camera: test_camera(),
        view,
        lights: vec![
            Light::white(Vec3::new(0.0, 20.0, 0.0), 2.0),
            Light::white(Vec3::new(0.0, -20.0, 0.0), 2.0),
        ],
    };
    LightClusterAssigner::update(&mut grid, &frame);

    let layout = *grid.layout();
    let seen: Vec<u32> = (0..layout.element_count())
        .flat_map(|cluster| grid.light_indices(cluster).collect::<Vec<_>>())
        .collect();
    assert!(seen.contains(&0));
    assert!(!seen.contains(&1));
}

#[test]
fn mirrored_view_axes_collapse_the_corner_projection() {
    // Only the world-space corners are transformed. When the view flips the
    // x axis relative to world x, the near corner carries the larger view x
    // and the projected range collapses even though the light sits in front
    // of the camera.
    let layout = *grid(4, 4, 4, 8).layout();
    let view = clustered_shading::view_from_pose(Vec3::ZERO, Vec3::new(0.0, 180.0, 0.0));
    let assigner = LightClusterAssigner::new(test_camera(), view);
    let light = Light::white(Vec3::new(0.0, 0.0, 20.0), 2.0);

    let range = assigner.cluster_range(&layout, &light);
    assert!(range.x.is_empty(), "got {range:?}");
    assert!(!range.z.is_empty());
}

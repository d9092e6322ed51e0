//! Integration tests for the data contract between the compute stage's
//! output encoding and the render stage's input decoding.
//!
//! These run GPU-free: the layout, viewport and size-attenuation math are
//! plain functions, and the generated WGSL is checked structurally with
//! naga, the same frontend wgpu compiles it with.

use texflow::gpu::{point_size_px, PingPong};
use texflow::prelude::*;
use texflow::shaders;

fn validate_wgsl(code: &str) -> Result<(), String> {
    let module =
        naga::front::wgsl::parse_str(code).map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(())
}

#[test]
fn initial_state_round_trips_through_the_mapping() {
    // Write source point p at index i, read back through the same mapping:
    // identity before any step has run.
    let points = PointSet::fibonacci_sphere(777, 3.0);
    let layout = FieldLayout::for_point_count(points.len() as u32).unwrap();
    let data = layout.pack_points(points.positions());

    for (i, p) in points.positions().iter().enumerate() {
        let (x, y) = layout.texel(i as u32);
        let texel_index = (y * layout.grid_size() + x) as usize;
        let base = texel_index * 4;
        assert_eq!(Vec3::new(data[base], data[base + 1], data[base + 2]), *p);
    }
}

#[test]
fn display_resolution_never_touches_the_grid() {
    let layout = FieldLayout::for_point_count(40_000).unwrap();
    assert_eq!(layout.grid_size(), 200);

    let mut viewport = Viewport::new(800, 600, 1.0);
    viewport.apply(ResizeEvent {
        width: 1920,
        height: 1080,
        pixel_ratio: 2.0,
    });
    assert_eq!(viewport.resolution(), Vec2::new(3840.0, 2160.0));

    // The grid is a function of particle count alone; recomputing it after
    // the resize yields the same surface dimensions.
    let after = FieldLayout::for_point_count(40_000).unwrap();
    assert_eq!(after, layout);
    assert_eq!(after.grid_size(), 200);
}

#[test]
fn grid_sizing_concrete_scenarios() {
    let snug = FieldLayout::for_point_count(40_000).unwrap();
    assert_eq!((snug.grid_size(), snug.padding_texels()), (200, 0));

    let loose = FieldLayout::for_point_count(40_001).unwrap();
    assert_eq!((loose.grid_size(), loose.padding_texels()), (201, 40_600));
}

#[test]
fn point_size_attenuation_reference_values() {
    assert_eq!(point_size_px(0.4, 900.0, -5.0), 72.0);
    assert_eq!(point_size_px(0.4, 900.0, 1.0), 0.0);
}

#[test]
fn current_and_target_surfaces_never_coincide() {
    let mut pp = PingPong::new();
    for _ in 0..257 {
        assert_ne!(pp.current(), pp.target());
        pp.swap();
    }
}

#[test]
fn generated_shader_pair_validates() {
    validate_wgsl(&shaders::compute_shader(FLOW_FIELD_UPDATE)).expect("compute shader");
    validate_wgsl(&shaders::compute_shader(IDENTITY_UPDATE)).expect("identity compute shader");
    validate_wgsl(&shaders::render_shader()).expect("render shader");
    validate_wgsl(&shaders::preview_shader()).expect("preview shader");
}

#[test]
fn sphere_seeded_simulation_reports_empty_sets() {
    let result = Simulation::new(PointSet::from_points(Vec::new())).run();
    assert!(matches!(
        result,
        Err(SimulationError::Setup(texflow::SetupError::EmptyPointSet))
    ));
}

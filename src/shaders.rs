//! WGSL generation for the compute and render stages.
//!
//! The compute harness fixes the state encoding and the grid traversal; the
//! caller supplies only the per-texel update body. The render shader decodes
//! texels with the same `index -> (i % n, i / n)` mapping the layout module
//! uses to write them, so the two sides of the contract are generated from
//! one place. Changing the encoding means changing this module, nowhere else.
//!
//! Inside an update body the following are in scope:
//!
//! - `state: vec4<f32>` (var) - this particle's previous state, written back
//!   to the target texture after the body runs. `xyz` is position, `w` is a
//!   free scalar channel seeded with a per-index phase.
//! - `base: vec4<f32>` - the particle's initial state, bound read-only.
//! - `index: u32`, `texel: vec2<i32>` - the particle's index and grid cell.
//! - `sim: SimUniforms` - `time`, `delta_time`, `grid_size`, `point_count`.
//! - The noise helpers from [`NOISE_WGSL`].
//!
//! An empty body leaves `state` untouched and the step degenerates to a
//! copy; [`IDENTITY_UPDATE`] names that explicitly for tests and warm-up
//! frames.

/// Simplex noise helpers available to every update body.
pub const NOISE_WGSL: &str = r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

// 3D simplex noise, output roughly in [-1, 1]
fn noise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0/6.0, 1.0/3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    var i = floor(v + dot(v, vec3(C.y)));
    let x0 = v - i + dot(i, vec3(C.x));

    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.x;
    let x2 = x0 - i2 + C.y;
    let x3 = x0 - D.yyy;

    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
      + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
      + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    let n_ = 0.142857142857;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);

    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);

    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0,p0), dot(p1,p1), dot(p2,p2), dot(p3,p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    var m = max(0.6 - vec4<f32>(dot(x0,x0), dot(x1,x1), dot(x2,x2), dot(x3,x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m*m, vec4<f32>(dot(p0,x0), dot(p1,x1), dot(p2,x2), dot(p3,x3)));
}

// Fractal Brownian motion over noise3
fn fbm3(p: vec3<f32>, octaves: i32) -> f32 {
    var value = 0.0;
    var amplitude = 0.5;
    var pos = p;
    for (var i = 0; i < octaves; i++) {
        value += amplitude * noise3(pos);
        pos *= 2.0;
        amplitude *= 0.5;
    }
    return value;
}
"#;

/// Update body that copies state through unchanged.
pub const IDENTITY_UPDATE: &str = "";

/// Default update body: particles drift through a time-varying noise flow
/// field, with the `w` channel cycling each particle back to its base
/// position. The per-index phase seeded at pack time desynchronizes the
/// respawns.
pub const FLOW_FIELD_UPDATE: &str = r#"
    let life = state.w + sim.delta_time * 0.3;
    if life >= 1.0 {
        state = vec4<f32>(base.xyz, fract(life));
    } else {
        let t = sim.time * 0.2;
        let influence = smoothstep(0.0, 1.0, noise3(base.xyz * 0.2 + vec3<f32>(t + 1.0)) * 0.5 + 0.5);
        var flow = vec3<f32>(
            noise3(state.xyz * 0.8 + vec3<f32>(0.0, 0.0, t)),
            noise3(state.xyz * 0.8 + vec3<f32>(13.7, 0.0, t)),
            noise3(state.xyz * 0.8 + vec3<f32>(0.0, 27.3, t)),
        );
        let len = length(flow);
        if len > 0.0001 {
            flow = flow / len;
        }
        state = vec4<f32>(state.xyz + flow * influence * sim.delta_time * 2.0, life);
    }
"#;

/// Assemble the full compute shader around an update body.
///
/// Bindings: previous state (0, read), next state (1, write-only storage),
/// base state (2, read), sim uniforms (3). Padding texels beyond
/// `point_count` are copied through untouched so the body never sees them.
pub fn compute_shader(update_body: &str) -> String {
    format!(
        r#"struct SimUniforms {{
    time: f32,
    delta_time: f32,
    grid_size: u32,
    point_count: u32,
}};

@group(0) @binding(0) var state_in: texture_2d<f32>;
@group(0) @binding(1) var state_out: texture_storage_2d<rgba32float, write>;
@group(0) @binding(2) var base_state: texture_2d<f32>;
@group(0) @binding(3) var<uniform> sim: SimUniforms;
{noise}
@compute @workgroup_size(8, 8)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {{
    if gid.x >= sim.grid_size || gid.y >= sim.grid_size {{
        return;
    }}
    let texel = vec2<i32>(gid.xy);
    let index = gid.y * sim.grid_size + gid.x;
    var state = textureLoad(state_in, texel, 0);
    let base = textureLoad(base_state, texel, 0);
    if index < sim.point_count {{
{update_body}
    }}
    textureStore(state_out, texel, state);
}}
"#,
        noise = NOISE_WGSL,
        update_body = update_body,
    )
}

/// The point-sprite render shader.
///
/// Each instance is one particle: the vertex stage fetches its state texel
/// with `textureLoad` (exact fetch; a filtering sampler would blend
/// neighboring particles' texels) and expands a six-vertex quad sized by
/// perspective attenuation: `base_size * resolution.y / -view_z`, clamped to
/// zero for points at or behind the camera plane.
pub fn render_shader() -> String {
    r#"struct RenderUniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    resolution: vec2<f32>,
    base_size: f32,
    grid_size: u32,
};

@group(0) @binding(0) var<uniform> u: RenderUniforms;
@group(0) @binding(1) var state_tex: texture_2d<f32>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) corner: vec2<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );

    let texel = vec2<i32>(
        i32(instance_index % u.grid_size),
        i32(instance_index / u.grid_size),
    );
    let state = textureLoad(state_tex, texel, 0);

    let view_pos = u.view * vec4<f32>(state.xyz, 1.0);
    var clip_pos = u.proj * view_pos;

    // Perspective size attenuation; zero at or behind the camera plane.
    let size_px = max(u.base_size * u.resolution.y / -view_pos.z, 0.0);

    let corner = quad_vertices[vertex_index];
    clip_pos += vec4<f32>(corner * size_px / u.resolution * clip_pos.w, 0.0, 0.0);

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.corner = corner;
    out.color = normalize(state.xyz) * 0.5 + 0.5;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.corner);
    if dist > 1.0 {
        discard;
    }
    let alpha = 1.0 - smoothstep(0.5, 1.0, dist);
    return vec4<f32>(in.color, alpha);
}
"#
    .to_string()
}

/// Debug blit of the raw state texture into the lower-right screen corner.
pub fn preview_shader() -> String {
    r#"@group(0) @binding(0) var state_tex: texture_2d<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let c = corners[vertex_index];

    var out: VertexOutput;
    out.position = vec4<f32>(0.5 + c.x * 0.45, -0.95 + c.y * 0.45, 0.0, 1.0);
    out.uv = vec2<f32>(c.x, 1.0 - c.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dims = vec2<f32>(textureDimensions(state_tex));
    let texel = min(vec2<i32>(in.uv * dims), vec2<i32>(dims) - 1);
    let state = textureLoad(state_tex, texel, 0);
    return vec4<f32>(state.xyz * 0.5 + 0.5, 1.0);
}
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse and validate WGSL with naga, the same frontend wgpu uses.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

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
    fn compute_shader_with_default_body_is_valid() {
        let shader = compute_shader(FLOW_FIELD_UPDATE);
        validate_wgsl(&shader).expect("flow-field compute shader should be valid");
    }

    #[test]
    fn compute_shader_with_identity_body_is_valid() {
        let shader = compute_shader(IDENTITY_UPDATE);
        validate_wgsl(&shader).expect("identity compute shader should be valid");
    }

    #[test]
    fn compute_shader_with_custom_body_is_valid() {
        let shader = compute_shader(
            r#"
            state = vec4<f32>(state.xyz + vec3<f32>(0.0, sim.delta_time, 0.0), state.w);
        "#,
        );
        validate_wgsl(&shader).expect("custom compute shader should be valid");
    }

    #[test]
    fn broken_update_body_is_rejected() {
        let shader = compute_shader("this is not wgsl;");
        assert!(validate_wgsl(&shader).is_err());
    }

    #[test]
    fn render_shader_is_valid() {
        validate_wgsl(&render_shader()).expect("render shader should be valid");
    }

    #[test]
    fn preview_shader_is_valid() {
        validate_wgsl(&preview_shader()).expect("preview shader should be valid");
    }

    #[test]
    fn both_stages_share_the_index_mapping() {
        // The compute harness linearizes as y * n + x; the render stage
        // inverts it as (i % n, i / n). Both expressions must be present.
        let compute = compute_shader(IDENTITY_UPDATE);
        assert!(compute.contains("gid.y * sim.grid_size + gid.x"));

        let render = render_shader();
        assert!(render.contains("instance_index % u.grid_size"));
        assert!(render.contains("instance_index / u.grid_size"));
        // Exact texel fetch, never a filtering sampler.
        assert!(render.contains("textureLoad"));
        assert!(!render.contains("textureSample"));
    }
}

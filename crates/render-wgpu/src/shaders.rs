/// Uniform block shared by every pipeline.
const UNIFORMS: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    // xyz: unit vector toward the light, w: directional intensity
    light: vec4<f32>,
    // x: ambient intensity, y: floor height, z: floor shadow opacity, w: shadow bias
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;
"#;

/// Shadow-map lookup for passes that receive shadows. 1.0 is fully lit.
const SHADOW_LOOKUP: &str = r#"
@group(0) @binding(1)
var shadow_map: texture_depth_2d;
@group(0) @binding(2)
var shadow_sampler: sampler_comparison;

fn shadow_factor(world_pos: vec3<f32>) -> f32 {
    let p = uniforms.light_view_proj * vec4<f32>(world_pos, 1.0);
    let ndc = p.xyz / p.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, ndc.y * -0.5 + 0.5);
    let depth = ndc.z - uniforms.params.w;
    let lit = textureSampleCompareLevel(shadow_map, shadow_sampler, uv, depth);
    let outside = uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 || ndc.z > 1.0;
    return select(lit, 1.0, outside);
}
"#;

/// Depth-only pass from the light. Reads the same instance layout as the
/// mesh pipelines and ignores everything but the model matrix.
const SHADOW_BODY: &str = r#"
struct ShadowVertex {
    @location(0) position: vec3<f32>,
};

struct ShadowInstance {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

@vertex
fn vs_shadow(vertex: ShadowVertex, instance: ShadowInstance) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    return uniforms.light_view_proj * model * vec4<f32>(vertex.position, 1.0);
}
"#;

/// Invisible floor at the floor height that only shows the shadows falling on it.
const FLOOR_BODY: &str = r#"
struct FloorOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
};

@vertex
fn vs_floor(@builtin(vertex_index) index: u32) -> FloorOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
    );
    let c = corners[index] * 50.0;
    let world = vec3<f32>(c.x, uniforms.params.y, c.y);

    var out: FloorOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(world, 1.0);
    out.world_pos = world;
    return out;
}

@fragment
fn fs_floor(in: FloorOutput) -> @location(0) vec4<f32> {
    let shade = 1.0 - shadow_factor(in.world_pos);
    return vec4<f32>(0.0, 0.0, 0.0, shade * uniforms.params.z);
}
"#;

/// WGSL for lit mesh instances. `pattern` 1 is brick courses.
const MESH_BODY: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
    // x: roughness, y: metalness, z: pattern, w: receives shadows
    @location(8) surface: vec4<f32>,
    @location(9) uv_repeat: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
    // x: roughness, y: metalness, z: pattern, w: receives shadows
    @location(4) surface: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize(world_normal);
    out.uv = vertex.uv * instance.uv_repeat;
    out.color = instance.color;
    out.surface = instance.surface;
    return out;
}

fn brick(uv: vec2<f32>) -> f32 {
    let courses = 8.0;
    let row = floor(uv.y * courses);
    let shift = select(0.0, 0.5, (i32(row) & 1) == 1);
    let u = fract(uv.x * 4.0 + shift);
    let v = fract(uv.y * courses);
    let mortar = step(u, 0.04) + step(v, 0.08);
    return select(0.85, 1.0, mortar < 0.5);
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = normalize(in.world_normal);
    if (!front) {
        n = -n;
    }
    let l = uniforms.light.xyz;
    let v = normalize(uniforms.eye.xyz - in.world_pos);
    let h = normalize(l + v);

    let roughness = clamp(in.surface.x, 0.05, 1.0);
    let metalness = in.surface.y;
    var albedo = in.color.rgb;
    if (in.surface.z > 0.5 && in.surface.z < 1.5) {
        albedo = albedo * brick(in.uv) * vec3<f32>(0.78, 0.42, 0.32);
    }

    let shadow = select(1.0, shadow_factor(in.world_pos), in.surface.w > 0.5);
    let diffuse = max(dot(n, l), 0.0) * (1.0 - metalness * 0.6) * shadow;
    let shininess = 2.0 / (roughness * roughness * roughness * roughness) - 2.0;
    let spec_color = mix(vec3<f32>(0.04), albedo, metalness);
    let specular = pow(max(dot(n, h), 0.0), max(shininess, 1.0)) * spec_color;

    let lit = albedo * (uniforms.params.x + diffuse * uniforms.light.w)
        + specular * uniforms.light.w * shadow;
    return vec4<f32>(lit, in.color.a);
}
"#;

/// WGSL for the grid floor, raised to the floor height.
const GRID_BODY: &str = r#"
struct GridVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct GridOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_grid(vertex: GridVertex) -> GridOutput {
    var out: GridOutput;
    let p = vertex.position + vec3<f32>(0.0, uniforms.params.y, 0.0);
    out.clip_position = uniforms.view_proj * vec4<f32>(p, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_grid(in: GridOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

pub fn mesh_shader() -> String {
    format!("{UNIFORMS}{SHADOW_LOOKUP}{MESH_BODY}")
}

pub fn shadow_shader() -> String {
    format!("{UNIFORMS}{SHADOW_BODY}")
}

pub fn floor_shader() -> String {
    format!("{UNIFORMS}{SHADOW_LOOKUP}{FLOOR_BODY}")
}

pub fn grid_shader() -> String {
    format!("{UNIFORMS}{GRID_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_share_the_uniform_block() {
        assert!(mesh_shader().starts_with(UNIFORMS));
        assert!(grid_shader().starts_with(UNIFORMS));
        assert!(mesh_shader().contains("fn vs_main"));
        assert!(grid_shader().contains("fn fs_grid"));
        assert!(shadow_shader().starts_with(UNIFORMS));
        assert!(floor_shader().starts_with(UNIFORMS));
    }

    #[test]
    fn shadow_map_is_bound_only_where_it_is_sampled() {
        // The depth pass writes the map, so it must not declare it as a binding.
        assert!(!shadow_shader().contains("shadow_map"));
        assert!(!shadow_shader().contains("@fragment"));
        assert!(mesh_shader().contains("shadow_factor(in.world_pos)"));
        assert!(floor_shader().contains("shadow_factor(in.world_pos)"));
        assert!(!grid_shader().contains("shadow_map"));
    }
}

/// WGSL source for the single world pipeline. `{{MAX_LIGHTS}}` and
/// `{{LIGHT_VEC4S}}` are substituted by [`world_shader`].
///
/// Lights arrive as a flat float array packed into vec4s; `light_float`
/// reads element `i` of that flat array.
const WORLD_SHADER_TEMPLATE: &str = r#"
const MAX_LIGHTS: u32 = {{MAX_LIGHTS}}u;

struct Uniforms {
    cam: vec4<f32>,
    l: array<vec4<f32>, {{LIGHT_VEC4S}}>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var atlas: texture_2d<f32>;
@group(1) @binding(1)
var atlas_sampler: sampler;

struct VertexInput {
    @location(0) p: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) n: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) vl: vec3<f32>,
    @location(1) vuv: vec2<f32>,
    @location(2) depth: f32,
};

fn light_float(i: u32) -> f32 {
    return uniforms.l[i / 4u][i % 4u];
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let view_m = mat4x4<f32>(
        vec4<f32>(1.0, 0.0, 0.0, 0.0),
        vec4<f32>(0.0, 0.707, 0.707, 0.0),
        vec4<f32>(0.0, -0.707, 0.707, 0.0),
        vec4<f32>(0.0, -22.627, -22.627, 1.0),
    );
    let proj_m = mat4x4<f32>(
        vec4<f32>(0.977, 0.0, 0.0, 0.0),
        vec4<f32>(0.0, 1.303, 0.0, 0.0),
        vec4<f32>(0.0, 0.0, -1.0, -1.0),
        vec4<f32>(0.0, 0.0, -2.0, 0.0),
    );

    // ambient
    var vl = vec3<f32>(0.3, 0.3, 0.6);
    for (var i = 0u; i < MAX_LIGHTS; i++) {
        let base = i * 7u;
        let lp = vec3<f32>(light_float(base), light_float(base + 1u), light_float(base + 2u));
        let color = vec3<f32>(light_float(base + 3u), light_float(base + 4u), light_float(base + 5u));
        let falloff = light_float(base + 6u);
        let diffuse = max(dot(in.n, normalize(lp - in.p)), 0.0);
        vl += color * diffuse * (1.0 / (falloff * length(lp - in.p)));
    }

    var clip = proj_m * view_m * vec4<f32>(in.p + uniforms.cam.xyz, 1.0);
    // GL clip depth is [-w, w]; wgpu expects [0, w].
    clip.z = (clip.z + clip.w) * 0.5;
    // window depth over w, as the fog ramp is tuned for
    let depth = clip.z;

    var out: VertexOutput;
    out.clip_position = clip;
    out.vl = vl;
    out.vuv = in.uv;
    out.depth = depth;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let t = textureSample(atlas, atlas_sampler, in.vuv);
    if (t.a < 0.8) {
        discard;
    }

    var color: vec4<f32>;
    if (t.r > 0.95 && t.g > 0.25 && t.b == 0.0) {
        // glowing texels ignore light and fog
        color = t;
    } else {
        color = t * vec4<f32>(in.vl, 1.0);
        let fog = 1.0 - smoothstep(16.0, 112.0, in.depth);
        color = vec4<f32>(color.rgb * fog, color.a);
    }
    return vec4<f32>(floor(color.rgb * 6.35) / 6.35, color.a);
}
"#;

/// Number of vec4 slots holding `max_lights` lights of 7 floats each.
pub fn light_vec4s(max_lights: usize) -> usize {
    (max_lights * 7).div_ceil(4)
}

/// Assemble the world shader for a light budget.
pub fn world_shader(max_lights: usize) -> String {
    WORLD_SHADER_TEMPLATE
        .replace("{{MAX_LIGHTS}}", &max_lights.to_string())
        .replace("{{LIGHT_VEC4S}}", &light_vec4s(max_lights).to_string())
}

use std::borrow::Cow;

use wgpu::naga;
use wgpu::naga::front::glsl;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::{SetupError, Stage};

/// Full-surface quad as two triangles in clip space, `(x, y)` per vertex.
pub const QUAD_VERTICES: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

/// Shader location of the quad position attribute.
pub const POSITION_LOCATION: u32 = 0;

/// Pass-through vertex program for [`QUAD_VERTICES`].
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Lightning fragment program.
///
/// The uniform block layout must match [`crate::gpu::LightningUniforms`].
/// `crate::effect` mirrors every function below on the CPU.
pub const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec4 out_color;

layout(std140, set = 0, binding = 0) uniform LightningParams {
    vec2 resolution;
    float time;
    float hue;
    float x_offset;
    float speed;
    float intensity;
    float size;
} params;

#define OCTAVE_COUNT 10
#define OCTAVE_ROTATION 0.45
#define DIST_EPSILON 0.0001

vec3 hsv2rgb(vec3 c) {
    vec3 k = mod(vec3(c.x * 6.0) + vec3(0.0, 4.0, 2.0), vec3(6.0));
    vec3 rgb = clamp(abs(k - vec3(3.0)) - vec3(1.0), vec3(0.0), vec3(1.0));
    return c.z * mix(vec3(1.0), rgb, vec3(c.y));
}

float hash11(float p) {
    p = fract(p * 0.1031);
    p *= p + 33.33;
    p *= p + p;
    return fract(p);
}

float hash12(vec2 p) {
    vec3 p3 = fract(vec3(p.x, p.y, p.x) * 0.1031);
    p3 += vec3(dot(p3, p3.yzx + vec3(33.33)));
    return fract((p3.x + p3.y) * p3.z);
}

mat2 rotate2d(float theta) {
    float c = cos(theta);
    float s = sin(theta);
    return mat2(c, -s, s, c);
}

float noise(vec2 p) {
    vec2 ip = floor(p);
    vec2 fp = fract(p);
    float a = hash12(ip);
    float b = hash12(ip + vec2(1.0, 0.0));
    float c = hash12(ip + vec2(0.0, 1.0));
    float d = hash12(ip + vec2(1.0, 1.0));

    vec2 t = smoothstep(vec2(0.0), vec2(1.0), fp);
    return mix(mix(a, b, t.x), mix(c, d, t.x), t.y);
}

float fbm(vec2 p) {
    float value = 0.0;
    float amplitude = 0.5;
    for (int i = 0; i < OCTAVE_COUNT; ++i) {
        value += amplitude * noise(p);
        p = p * rotate2d(OCTAVE_ROTATION);
        p *= 2.0;
        amplitude *= 0.5;
    }
    return value;
}

void mainImage(out vec4 fragColor, in vec2 fragCoord) {
    vec2 uv = fragCoord / params.resolution;
    uv = 2.0 * uv - vec2(1.0);
    uv.x *= params.resolution.x / params.resolution.y;
    uv.x += params.x_offset;

    uv += vec2(2.0 * fbm(uv * params.size + vec2(0.8 * params.time * params.speed)) - 1.0);

    float dist = max(abs(uv.x), DIST_EPSILON);
    vec3 baseColor = hsv2rgb(vec3(params.hue / 360.0, 0.7, 0.8));
    float flicker = mix(0.0, 0.07, hash11(params.time * params.speed));
    vec3 col = baseColor * pow(flicker / dist, 1.0) * params.intensity;
    col = pow(col, vec3(1.0));
    fragColor = vec4(col, 1.0);
}

void main() {
    // Surface origin is top-left; the effect is authored for bottom-left.
    vec2 fragCoord = vec2(gl_FragCoord.x, params.resolution.y - gl_FragCoord.y);
    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    out_color = color;
}
";

/// A shader stage that parsed and validated cleanly.
#[derive(Debug)]
pub struct CompiledStage {
    stage: Stage,
    source: Cow<'static, str>,
    module: naga::Module,
}

impl CompiledStage {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn wgpu_source(&self) -> wgpu::ShaderSource<'_> {
        wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(self.source.as_ref()),
            stage: self.stage.naga(),
            defines: &[],
        }
    }
}

/// Vertex and fragment stages whose interfaces agree with each other and with
/// the quad vertex buffer.
#[derive(Debug)]
pub struct LinkedProgram {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
}

/// Parses and validates GLSL through naga, the frontend `wgpu` uses for
/// `ShaderSource::Glsl`.
///
/// Diagnostics are rendered against the source so they read like a driver's
/// info log.
pub fn compile_stage(
    stage: Stage,
    source: impl Into<Cow<'static, str>>,
) -> Result<CompiledStage, SetupError> {
    let source = source.into();
    let mut frontend = glsl::Frontend::default();
    let module = frontend
        .parse(&glsl::Options::from(stage.naga()), &source)
        .map_err(|errors| SetupError::ShaderCompile {
            stage,
            diagnostic: errors.emit_to_string(&source),
        })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|error| SetupError::ShaderCompile {
            stage,
            diagnostic: error.emit_to_string(&source),
        })?;

    Ok(CompiledStage {
        stage,
        source,
        module,
    })
}

/// Checks the interface between the stages.
///
/// The vertex stage must consume exactly one `vec2` attribute at
/// [`POSITION_LOCATION`], and every fragment input must be produced by the
/// vertex stage at the same location with the same type.
pub fn link_program(
    vertex: CompiledStage,
    fragment: CompiledStage,
) -> Result<LinkedProgram, SetupError> {
    if vertex.stage != Stage::Vertex || fragment.stage != Stage::Fragment {
        return Err(SetupError::ProgramLink(format!(
            "expected vertex + fragment stages, got {} + {}",
            vertex.stage, fragment.stage
        )));
    }

    let attributes = entry_inputs(&vertex.module, naga::ShaderStage::Vertex)?;
    let expected = naga::TypeInner::Vector {
        size: naga::VectorSize::Bi,
        scalar: naga::Scalar::F32,
    };
    match attributes.as_slice() {
        [(location, inner)] if *location == POSITION_LOCATION && *inner == expected => {}
        _ => {
            return Err(SetupError::ProgramLink(format!(
                "vertex attributes {} do not match the quad buffer (vec2<f32> at location {POSITION_LOCATION})",
                describe(&attributes)
            )))
        }
    }

    let varyings = entry_outputs(&vertex.module, naga::ShaderStage::Vertex)?;
    let inputs = entry_inputs(&fragment.module, naga::ShaderStage::Fragment)?;
    for (location, inner) in &inputs {
        match varyings.iter().find(|(candidate, _)| candidate == location) {
            Some((_, produced)) if produced == inner => {}
            Some((_, produced)) => {
                return Err(SetupError::ProgramLink(format!(
                    "fragment input at location {location} is {inner:?} but the vertex stage writes {produced:?}"
                )))
            }
            None => {
                return Err(SetupError::ProgramLink(format!(
                    "fragment input at location {location} is never written by the vertex stage"
                )))
            }
        }
    }

    Ok(LinkedProgram { vertex, fragment })
}

/// Compiles and links the built-in lightning program.
pub fn lightning_program() -> Result<LinkedProgram, SetupError> {
    let vertex = compile_stage(Stage::Vertex, VERTEX_SHADER_GLSL)?;
    let fragment = compile_stage(Stage::Fragment, FRAGMENT_SHADER_GLSL)?;
    link_program(vertex, fragment)
}

type Interface = Vec<(u32, naga::TypeInner)>;

fn entry_point(
    module: &naga::Module,
    stage: naga::ShaderStage,
) -> Result<&naga::EntryPoint, SetupError> {
    module
        .entry_points
        .iter()
        .find(|entry| entry.stage == stage)
        .ok_or_else(|| SetupError::ProgramLink(format!("no {stage:?} entry point")))
}

fn entry_inputs(module: &naga::Module, stage: naga::ShaderStage) -> Result<Interface, SetupError> {
    let entry = entry_point(module, stage)?;
    let mut interface = Vec::new();
    for argument in &entry.function.arguments {
        collect_locations(module, argument.ty, argument.binding.as_ref(), &mut interface);
    }
    interface.sort_by_key(|(location, _)| *location);
    Ok(interface)
}

fn entry_outputs(module: &naga::Module, stage: naga::ShaderStage) -> Result<Interface, SetupError> {
    let entry = entry_point(module, stage)?;
    let mut interface = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut interface);
    }
    interface.sort_by_key(|(location, _)| *location);
    Ok(interface)
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Interface,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn describe(interface: &Interface) -> String {
    if interface.is_empty() {
        return "(none)".to_string();
    }
    interface
        .iter()
        .map(|(location, inner)| format!("{inner:?} at location {location}"))
        .collect::<Vec<_>>()
        .join(", ")
}

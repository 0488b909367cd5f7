//! GPU globe rendering with shaders.
//!
//! Ray-traces the globe on a fullscreen quad: the fragment shader
//! intersects the view ray with the unit sphere, samples the day, night
//! and specular/clouds textures, and applies the same shading model as
//! `shading.rs`: smooth terminator blend, cloud lightening, ocean
//! specular, and the atmosphere rim plus limb halo.

use eframe::glow;
use glow::HasContext as _;
use nalgebra::Matrix3;

use crate::texture::EarthTexture;

pub struct GlobeRenderer {
    program: glow::Program,
    vertex_array: glow::VertexArray,
    day_texture: Option<glow::Texture>,
    night_texture: Option<glow::Texture>,
    specular_clouds_texture: Option<glow::Texture>,
}

impl GlobeRenderer {
    pub fn new(gl: &glow::Context) -> Self {
        let shader_version = if cfg!(target_arch = "wasm32") {
            "#version 300 es"
        } else {
            "#version 330"
        };

        unsafe {
            let program = gl.create_program().expect("Cannot create program");

            let vertex_shader_source = r#"
                const vec2 verts[4] = vec2[4](
                    vec2(-1.0, -1.0),
                    vec2( 1.0, -1.0),
                    vec2(-1.0,  1.0),
                    vec2( 1.0,  1.0)
                );
                out vec2 v_uv;
                void main() {
                    v_uv = verts[gl_VertexID] * 0.5 + 0.5;
                    gl_Position = vec4(verts[gl_VertexID], 0.0, 1.0);
                }
            "#;

            let fragment_shader_source = r#"
                precision highp float;
                in vec2 v_uv;
                out vec4 out_color;

                uniform sampler2D u_day;
                uniform sampler2D u_night;
                uniform sampler2D u_specular_clouds;
                uniform mat3 u_inv_rotation;
                uniform float u_aspect;
                uniform float u_scale;
                uniform vec3 u_sun_dir;
                uniform vec3 u_atmo_day;
                uniform vec3 u_atmo_twilight;
                uniform vec3 u_bg_color;
                uniform float u_show_clouds;
                uniform float u_show_day_night;
                uniform float u_atmosphere;
                uniform float u_has_night;
                uniform float u_has_specular;

                const float PI = 3.14159265359;
                const float TERMINATOR_BAND = 0.1;
                const float ATMO_SHELL = 1.04;
                const float CLOUD_FLOOR = 0.2;
                const float SPECULAR_EXPONENT = 32.0;
                const float NIGHT_FALLBACK_DIM = 0.08;

                vec3 atmosphere_color(float sun_facing) {
                    return mix(u_atmo_twilight, u_atmo_day, smoothstep(-0.25, 0.75, sun_facing));
                }

                void main() {
                    vec2 centered = (v_uv - 0.5) * 2.0;
                    centered.x *= max(u_aspect, 1.0);
                    centered.y *= max(1.0 / u_aspect, 1.0);
                    centered /= u_scale;

                    vec3 O = u_inv_rotation * vec3(centered.x, centered.y, 0.0);
                    vec3 D = u_inv_rotation * vec3(0.0, 0.0, -1.0);
                    vec3 view_dir = -D;

                    float B = 2.0 * dot(O, D);
                    float C = dot(O, O) - 1.0;
                    float discriminant = B * B - 4.0 * C;

                    float screen_dist = length(centered);

                    if (discriminant < 0.0) {
                        // Off the globe: halo between the limb and the shell edge.
                        if (u_atmosphere > 0.5 && screen_dist < ATMO_SHELL) {
                            float t_ca = -B * 0.5;
                            vec3 limb = normalize(O + t_ca * D);
                            float sun_facing = dot(limb, u_sun_dir);
                            float edge = clamp((screen_dist - 1.0) / (ATMO_SHELL - 1.0), 0.0, 1.0);
                            float falloff = (1.0 - edge) * (1.0 - edge);
                            vec3 atmo = atmosphere_color(sun_facing);
                            out_color = vec4(mix(u_bg_color, atmo, falloff), 1.0);
                        } else {
                            out_color = vec4(u_bg_color, 1.0);
                        }
                        return;
                    }

                    float t = (-B - sqrt(discriminant)) * 0.5;
                    vec3 p = O + t * D;
                    vec3 normal = normalize(p);
                    float lat = asin(clamp(p.y, -1.0, 1.0));
                    float lon = atan(-p.z, p.x);
                    vec2 uv = vec2((lon + PI) / (2.0 * PI), (PI / 2.0 - lat) / PI);

                    vec3 day_color = texture(u_day, uv).rgb;
                    vec3 night_color = u_has_night > 0.5
                        ? texture(u_night, uv).rgb
                        : day_color * NIGHT_FALLBACK_DIM;
                    vec2 mask = u_has_specular > 0.5
                        ? texture(u_specular_clouds, uv).rg
                        : vec2(0.0);

                    float sun_facing = dot(normal, u_sun_dir);
                    float day_mix = u_show_day_night > 0.5
                        ? smoothstep(-TERMINATOR_BAND, TERMINATOR_BAND, sun_facing)
                        : 1.0;
                    vec3 color = mix(night_color, day_color, day_mix);

                    if (u_show_clouds > 0.5) {
                        float clouds = smoothstep(CLOUD_FLOOR, 1.0, mask.g) * day_mix;
                        color = mix(color, vec3(1.0), clouds);
                    }

                    vec3 reflected = reflect(-u_sun_dir, normal);
                    float specular = pow(max(dot(reflected, view_dir), 0.0), SPECULAR_EXPONENT) * mask.r;
                    color += vec3(specular);

                    if (u_atmosphere > 0.5) {
                        float fresnel = pow(1.0 - max(dot(normal, view_dir), 0.0), 3.0);
                        vec3 atmo = atmosphere_color(sun_facing);
                        float lit = clamp(sun_facing + 0.3, 0.0, 1.0);
                        color = mix(color, atmo * lit, fresnel * 0.6);
                    }

                    out_color = vec4(clamp(color, 0.0, 1.0), 1.0);
                }
            "#;

            let shader_sources = [
                (glow::VERTEX_SHADER, vertex_shader_source),
                (glow::FRAGMENT_SHADER, fragment_shader_source),
            ];

            let shaders: Vec<_> = shader_sources
                .iter()
                .map(|(shader_type, shader_source)| {
                    let shader = gl.create_shader(*shader_type).expect("Cannot create shader");
                    gl.shader_source(shader, &format!("{shader_version}\n{shader_source}"));
                    gl.compile_shader(shader);
                    assert!(
                        gl.get_shader_compile_status(shader),
                        "Failed to compile shader: {}",
                        gl.get_shader_info_log(shader)
                    );
                    gl.attach_shader(program, shader);
                    shader
                })
                .collect();

            gl.link_program(program);
            assert!(
                gl.get_program_link_status(program),
                "Failed to link program: {}",
                gl.get_program_info_log(program)
            );

            for shader in shaders {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }

            let vertex_array = gl.create_vertex_array().expect("Cannot create vertex array");

            Self {
                program,
                vertex_array,
                day_texture: None,
                night_texture: None,
                specular_clouds_texture: None,
            }
        }
    }

    pub fn upload_day_texture(&mut self, gl: &glow::Context, tex: &EarthTexture) {
        if self.day_texture.is_none() {
            self.day_texture = Some(upload_rgb_texture(gl, tex));
        }
    }

    pub fn upload_night_texture(&mut self, gl: &glow::Context, tex: &EarthTexture) {
        if self.night_texture.is_none() {
            self.night_texture = Some(upload_rgb_texture(gl, tex));
        }
    }

    pub fn upload_specular_clouds_texture(&mut self, gl: &glow::Context, tex: &EarthTexture) {
        if self.specular_clouds_texture.is_none() {
            self.specular_clouds_texture = Some(upload_rgb_texture(gl, tex));
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn paint(
        &self,
        gl: &glow::Context,
        inv_rotation: &Matrix3<f64>,
        aspect: f32,
        scale: f32,
        sun_dir: [f32; 3],
        show_clouds: bool,
        show_day_night: bool,
        show_atmosphere: bool,
        bg_color: [f32; 3],
    ) {
        let Some(day_texture) = self.day_texture else { return };

        unsafe {
            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vertex_array));

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(day_texture));
            gl.uniform_1_i32(gl.get_uniform_location(self.program, "u_day").as_ref(), 0);

            gl.active_texture(glow::TEXTURE1);
            if let Some(nt) = self.night_texture {
                gl.bind_texture(glow::TEXTURE_2D, Some(nt));
            } else {
                gl.bind_texture(glow::TEXTURE_2D, Some(day_texture));
            }
            gl.uniform_1_i32(gl.get_uniform_location(self.program, "u_night").as_ref(), 1);
            gl.uniform_1_f32(
                gl.get_uniform_location(self.program, "u_has_night").as_ref(),
                if self.night_texture.is_some() { 1.0 } else { 0.0 },
            );

            gl.active_texture(glow::TEXTURE2);
            if let Some(st) = self.specular_clouds_texture {
                gl.bind_texture(glow::TEXTURE_2D, Some(st));
            } else {
                gl.bind_texture(glow::TEXTURE_2D, Some(day_texture));
            }
            gl.uniform_1_i32(
                gl.get_uniform_location(self.program, "u_specular_clouds").as_ref(),
                2,
            );
            gl.uniform_1_f32(
                gl.get_uniform_location(self.program, "u_has_specular").as_ref(),
                if self.specular_clouds_texture.is_some() { 1.0 } else { 0.0 },
            );

            let rot_data: [f32; 9] = [
                inv_rotation[(0, 0)] as f32, inv_rotation[(1, 0)] as f32, inv_rotation[(2, 0)] as f32,
                inv_rotation[(0, 1)] as f32, inv_rotation[(1, 1)] as f32, inv_rotation[(2, 1)] as f32,
                inv_rotation[(0, 2)] as f32, inv_rotation[(1, 2)] as f32, inv_rotation[(2, 2)] as f32,
            ];
            gl.uniform_matrix_3_f32_slice(
                gl.get_uniform_location(self.program, "u_inv_rotation").as_ref(),
                false,
                &rot_data,
            );

            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_aspect").as_ref(), aspect);
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_scale").as_ref(), scale);
            gl.uniform_3_f32(
                gl.get_uniform_location(self.program, "u_sun_dir").as_ref(),
                sun_dir[0], sun_dir[1], sun_dir[2],
            );
            gl.uniform_3_f32(
                gl.get_uniform_location(self.program, "u_atmo_day").as_ref(),
                0.0, 0.667, 1.0,
            );
            gl.uniform_3_f32(
                gl.get_uniform_location(self.program, "u_atmo_twilight").as_ref(),
                1.0, 0.4, 0.0,
            );
            gl.uniform_3_f32(
                gl.get_uniform_location(self.program, "u_bg_color").as_ref(),
                bg_color[0], bg_color[1], bg_color[2],
            );
            gl.uniform_1_f32(
                gl.get_uniform_location(self.program, "u_show_clouds").as_ref(),
                if show_clouds { 1.0 } else { 0.0 },
            );
            gl.uniform_1_f32(
                gl.get_uniform_location(self.program, "u_show_day_night").as_ref(),
                if show_day_night { 1.0 } else { 0.0 },
            );
            gl.uniform_1_f32(
                gl.get_uniform_location(self.program, "u_atmosphere").as_ref(),
                if show_atmosphere { 1.0 } else { 0.0 },
            );

            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);

            gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.vertex_array);
            for texture in [self.day_texture, self.night_texture, self.specular_clouds_texture]
                .into_iter()
                .flatten()
            {
                gl.delete_texture(texture);
            }
        }
    }
}

fn upload_rgb_texture(gl: &glow::Context, tex: &EarthTexture) -> glow::Texture {
    unsafe {
        let texture = gl.create_texture().expect("Cannot create texture");
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));

        let pixels: Vec<u8> = tex.pixels.iter().flat_map(|&[r, g, b]| [r, g, b]).collect();

        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGB as i32,
            tex.width as i32,
            tex.height as i32,
            0,
            glow::RGB,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(&pixels)),
        );
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        texture
    }
}

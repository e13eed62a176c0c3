//! The viewer application driven by the runtime.

use anyhow::{Context, Result};

use lumen_engine::assets::{load_mesh, load_texture, EmbeddedShaders, ShaderDir, ShaderSource};
use lumen_engine::config::LumenConfig;
use lumen_engine::core::{App, AppControl, FrameCtx};
use lumen_engine::input::Key;
use lumen_engine::render::{BloomPipeline, FrameUniforms};
use lumen_engine::scene::{model_matrix, scene_lights, Camera, MaterialImages, MeshData, ResolvedMaterial};

pub struct Viewer {
    config: LumenConfig,
    shaders: Box<dyn ShaderSource>,
    mesh: MeshData,
    material: ResolvedMaterial,
    camera: Camera,
    // Built on the first frame, once a device exists.
    pipeline: Option<BloomPipeline>,
}

impl Viewer {
    /// Reads the mesh, material maps and shader sources named by `config`.
    /// Missing assets degrade; nothing here fails.
    pub fn load(config: LumenConfig) -> Self {
        let assets = &config.assets;

        let mesh = load_mesh(&assets.model);
        let material = MaterialImages {
            albedo: load_texture(&assets.albedo),
            normal: load_texture(&assets.normal),
            metallic: load_texture(&assets.metallic),
            roughness: load_texture(&assets.roughness),
            ao: load_texture(&assets.ao),
        }
        .resolve();

        let shaders: Box<dyn ShaderSource> = match &assets.shader_dir {
            Some(dir) => {
                log::info!("reading shaders from {}", dir.display());
                Box::new(ShaderDir::new(dir))
            }
            None => Box::new(EmbeddedShaders),
        };

        Self {
            config,
            shaders,
            mesh,
            material,
            camera: Camera::default(),
            pipeline: None,
        }
    }

    fn ensure_pipeline(&mut self, ctx: &FrameCtx<'_, '_>) -> Result<()> {
        if self.pipeline.is_some() {
            return Ok(());
        }
        let rctx = ctx.render_ctx();
        let pipeline = BloomPipeline::new(
            &rctx,
            self.shaders.as_ref(),
            &self.config.bloom,
            &self.mesh,
            &self.material,
        )
        .context("failed to build bloom pipeline")?;
        self.pipeline = Some(pipeline);
        Ok(())
    }
}

impl App for Viewer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl> {
        if ctx.input_frame.keys_pressed.contains(&Key::Escape) {
            log::info!("escape pressed; exiting");
            return Ok(AppControl::Exit);
        }

        self.ensure_pipeline(ctx)?;
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Ok(AppControl::Continue);
        };

        let t = ctx.time.elapsed;
        self.camera.update(ctx.input, ctx.input_frame, ctx.time.dt);

        let uniforms = FrameUniforms::new(
            model_matrix(&self.config.animation, t),
            &self.camera,
            pipeline.aspect(),
            &scene_lights(t),
        );

        ctx.present(|rctx, target| {
            pipeline.render(rctx, target, &uniforms);
            Ok(())
        })
    }
}

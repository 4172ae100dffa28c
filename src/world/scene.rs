//! Scene loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable scene files.
//! A scene file names its meshes once; models refer to them by name and
//! share the loaded mesh.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use serde::{Serialize, Deserialize};
use crate::rasterizer::{
    Camera, Color, Framebuffer, FrameContext, Light, Mesh, Model, RasterSettings, RenderStats,
    Texture, Triangle, Vec3,
};
use super::meshes::{cube_mesh, triangle_mesh};
use super::obj::{load_obj, ObjError};

/// Error type for scene loading
#[derive(Debug)]
pub enum SceneError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    MeshError(ObjError),
    /// A model refers to a mesh name the scene doesn't define
    UnknownMesh(String),
}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        SceneError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::ParseError(e)
    }
}

impl From<ron::Error> for SceneError {
    fn from(e: ron::Error) -> Self {
        SceneError::SerializeError(e)
    }
}

impl From<ObjError> for SceneError {
    fn from(e: ObjError) -> Self {
        SceneError::MeshError(e)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::IoError(e) => write!(f, "IO error: {}", e),
            SceneError::ParseError(e) => write!(f, "Parse error: {}", e),
            SceneError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            SceneError::MeshError(e) => write!(f, "Mesh error: {}", e),
            SceneError::UnknownMesh(name) => write!(f, "Unknown mesh '{}'", name),
        }
    }
}

impl std::error::Error for SceneError {}

/// Where a mesh's triangles come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeshSource {
    /// OBJ file, relative to the scene file
    Obj(String),
    Cube { size: f32 },
    Triangle,
}

/// Texture applied to every triangle of a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextureSource {
    /// Image file, relative to the scene file
    File(String),
    Checkerboard { size: usize, light: Color, dark: Color },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDesc {
    pub name: String,
    pub source: MeshSource,
    #[serde(default)]
    pub texture: Option<TextureSource>,
    /// Vertex color for untextured meshes
    #[serde(default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDesc {
    pub mesh: String,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub translation: Vec3,
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_clear_color() -> Color {
    Color::SKY
}

/// Serialized form of a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDesc {
    #[serde(default)]
    pub settings: RasterSettings,
    #[serde(default)]
    pub camera: Camera,
    #[serde(default)]
    pub lights: Vec<Light>,
    #[serde(default)]
    pub meshes: Vec<MeshDesc>,
    #[serde(default)]
    pub models: Vec<ModelDesc>,
    #[serde(default = "default_clear_color")]
    pub clear_color: Color,
}

/// A loaded scene, ready to render
#[derive(Debug, Clone)]
pub struct Scene {
    pub settings: RasterSettings,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub models: Vec<Model>,
    pub clear_color: Color,
}

impl Scene {
    /// Clear `fb` and draw every model
    pub fn render(&self, fb: &mut Framebuffer) -> RenderStats {
        fb.clear(self.clear_color);
        let ctx = FrameContext::new(self.settings.clone());

        let mut total = RenderStats::default();
        for model in &self.models {
            total += ctx.render_model(fb, model, &self.camera, &self.lights);
        }

        log::debug!("frame: {}", total);
        total
    }
}

impl SceneDesc {
    /// Load meshes and textures (paths relative to `base_dir`) and place
    /// the models
    pub fn build(&self, base_dir: &Path) -> Result<Scene, SceneError> {
        let mut meshes: HashMap<&str, Rc<Mesh>> = HashMap::new();
        for desc in &self.meshes {
            let mesh = load_mesh(desc, base_dir)?;
            if meshes.insert(desc.name.as_str(), Rc::new(mesh)).is_some() {
                log::warn!("mesh '{}' defined twice, keeping the last one", desc.name);
            }
        }

        let models = self
            .models
            .iter()
            .map(|m| {
                let mesh = meshes
                    .get(m.mesh.as_str())
                    .ok_or_else(|| SceneError::UnknownMesh(m.mesh.clone()))?;
                Ok(Model::new(mesh.clone())
                    .with_scale(m.scale)
                    .with_rotation(m.rotation)
                    .with_translation(m.translation))
            })
            .collect::<Result<Vec<_>, SceneError>>()?;

        log::info!("scene: {} meshes, {} models, {} lights", meshes.len(), models.len(), self.lights.len());

        Ok(Scene {
            settings: self.settings.clone(),
            camera: self.camera,
            lights: self.lights.clone(),
            models,
            clear_color: self.clear_color,
        })
    }
}

fn load_mesh(desc: &MeshDesc, base_dir: &Path) -> Result<Mesh, SceneError> {
    let texture = desc.texture.as_ref().and_then(|t| load_texture(t, base_dir)).map(Rc::new);

    let mut mesh = match &desc.source {
        MeshSource::Obj(path) => load_obj(base_dir.join(path), texture.clone())?,
        MeshSource::Cube { size } => cube_mesh(*size),
        MeshSource::Triangle => triangle_mesh(),
    };
    mesh.name = desc.name.clone();

    let color = desc.color;
    if texture.is_some() || color.is_some() {
        mesh.triangles = mesh
            .triangles
            .iter()
            .map(|t| {
                let mut t: Triangle = t.map_vertices(|v| v.with_color(color.unwrap_or(v.color)));
                if texture.is_some() {
                    t.texture = texture.clone();
                }
                t
            })
            .collect();
    }

    Ok(mesh)
}

/// A texture that fails to load is logged and left out, so the mesh
/// falls back to its vertex colors
fn load_texture(source: &TextureSource, base_dir: &Path) -> Option<Texture> {
    match source {
        TextureSource::File(path) => {
            let full: PathBuf = base_dir.join(path);
            match Texture::from_file(&full) {
                Ok(tex) => {
                    log::info!("loaded texture {} ({}x{})", full.display(), tex.width, tex.height);
                    Some(tex)
                }
                Err(e) => {
                    log::warn!("{}", e);
                    None
                }
            }
        }
        TextureSource::Checkerboard { size, light, dark } => {
            Some(Texture::checkerboard(*size, *size, *light, *dark))
        }
    }
}

/// Load a scene from a RON file. Asset paths are relative to the file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let desc: SceneDesc = ron::from_str(&contents)?;
    log::info!("loading scene {}", path.display());
    desc.build(path.parent().unwrap_or(Path::new(".")))
}

/// Load a scene from a RON string (for embedded scenes or testing).
/// Asset paths are relative to the working directory.
pub fn load_scene_from_str(s: &str) -> Result<Scene, SceneError> {
    let desc: SceneDesc = ron::from_str(s)?;
    desc.build(Path::new("."))
}

/// Save a scene description to a RON file
pub fn save_scene_desc<P: AsRef<Path>>(desc: &SceneDesc, path: P) -> Result<(), SceneError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(desc, config)?;
    fs::write(path, contents)?;
    Ok(())
}

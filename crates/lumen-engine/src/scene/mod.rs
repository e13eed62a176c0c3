//! Scene content: the camera, the two animated lights, the model transform,
//! and CPU-side mesh and material data.

mod camera;
mod lights;
mod material;
mod mesh;
mod motion;

pub use camera::Camera;
pub use lights::{scene_lights, LIGHT_COUNT};
pub use material::{MaterialImages, ResolvedMaterial};
pub use mesh::{MeshData, Vertex};
pub use motion::model_matrix;

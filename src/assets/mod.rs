pub mod model;
pub mod obj;

pub use model::{Material, Model3D, Texture};
pub use obj::{ParsedMaterial, load_obj, parse_mtl, parse_obj};

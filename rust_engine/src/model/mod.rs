//! PMD 模型数据和角色

mod actor;
mod loader;
mod material;
mod submesh;

pub use actor::Actor;
pub use loader::{load_pmd, PmdModel, Vertex};
pub use material::{
    split_texture_path, toon_path, Material, MaterialTextureSet, MaterialTextures, TextureNames,
    NO_TOON,
};
pub use submesh::{build_submeshes, SubMesh};

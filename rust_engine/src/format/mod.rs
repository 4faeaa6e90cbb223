//! 二进制格式读取 - PMD 模型与 VMD 动作

mod pmd_file;
mod reader;
mod vmd_file;

pub use pmd_file::{
    PmdBone, PmdFile, PmdHeader, PmdIk, PmdMaterial, PmdVertex, BONE_SIZE, MATERIAL_SIZE, NO_BONE,
    VERTEX_SIZE,
};
pub use reader::{decode_shift_jis, truncate_shift_jis, ByteReader};
pub use vmd_file::{
    motion_bone_name, VmdBoneFrame, VmdFile, VmdIkFrame, BONE_FRAME_SIZE, BONE_NAME_SIZE,
};

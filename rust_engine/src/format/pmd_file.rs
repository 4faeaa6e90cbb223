//! PMD 文件解析
//!
//! 布局（小端，无对齐填充）：
//! 签名 "Pmd" → 头部 → 顶点 → 索引 → 材质 → 骨骼 → IK 链。
//! 骨骼之后的表情、显示框等段落不在运行时使用范围内，不读取。

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};

use crate::{MmdError, Result};

use super::reader::ByteReader;

/// PMD 签名
const PMD_SIGNATURE: &[u8; 3] = b"Pmd";

pub const VERTEX_SIZE: usize = 38;
pub const MATERIAL_SIZE: usize = 70;
pub const BONE_SIZE: usize = 39;
/// IK 记录固定部分（不含中间骨骼索引列表）
pub const IK_HEADER_SIZE: usize = 11;

/// 骨骼/IK 表中表示“无”的索引
pub const NO_BONE: u16 = 0xFFFF;

/// PMD 文件头
#[derive(Clone, Debug, PartialEq)]
pub struct PmdHeader {
    pub version: f32,
    pub model_name: String,
    pub comment: String,
}

/// 顶点（38 字节）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PmdVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub bone_indices: [u16; 2],
    /// 第一根骨骼的权重 [0, 100]
    pub bone_weight: u8,
    pub edge_flag: u8,
}

/// 材质（70 字节，紧凑排列）
#[derive(Clone, Debug, PartialEq)]
pub struct PmdMaterial {
    pub diffuse: Vec3,
    pub alpha: f32,
    pub specularity: f32,
    pub specular: Vec3,
    pub ambient: Vec3,
    pub toon_index: u8,
    pub edge_flag: u8,
    pub index_count: u32,
    /// 原始贴图路径，可能是 "base.bmp*sphere.sph" 形式
    pub texture_path: String,
}

/// 骨骼（39 字节）
#[derive(Clone, Debug, PartialEq)]
pub struct PmdBone {
    pub name: String,
    pub parent: u16,
    pub tail: u16,
    pub kind: u8,
    pub ik_bone: u16,
    pub position: Vec3,
}

/// IK 链
#[derive(Clone, Debug, PartialEq)]
pub struct PmdIk {
    /// IK 骨骼（目标位置）
    pub ik_bone: u16,
    /// 链末端需要到达目标的骨骼
    pub target_bone: u16,
    pub iterations: u16,
    /// 单次迭代的角度限制（弧度）
    pub limit_angle: f32,
    /// 中间骨骼，从末端一侧排向根部
    pub chain: Vec<u16>,
}

/// PMD 文件数据
#[derive(Clone, Debug, PartialEq)]
pub struct PmdFile {
    pub header: PmdHeader,
    pub vertices: Vec<PmdVertex>,
    pub indices: Vec<u16>,
    pub materials: Vec<PmdMaterial>,
    pub bones: Vec<PmdBone>,
    pub iks: Vec<PmdIk>,
}

impl PmdFile {
    /// 从文件加载 PMD
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref()).map_err(MmdError::Io)?;
        Self::parse(&bytes)
    }

    /// 解析 PMD 数据
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        let signature = reader.read_array::<3>("signature")?;
        if &signature != PMD_SIGNATURE {
            return Err(MmdError::Format(format!(
                "invalid PMD signature {:?}",
                String::from_utf8_lossy(&signature)
            )));
        }

        let header = PmdHeader {
            version: reader.read_f32("header version")?,
            model_name: reader.read_fixed_string(20, "model name")?,
            comment: reader.read_fixed_string(256, "model comment")?,
        };

        let vertex_count = reader.read_u32("vertex count")? as usize;
        reader.ensure_records(vertex_count, VERTEX_SIZE, "vertex")?;
        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            vertices.push(read_vertex(&mut reader)?);
        }

        let index_count = reader.read_u32("index count")? as usize;
        reader.ensure_records(index_count, 2, "index")?;
        let mut indices = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            indices.push(reader.read_u16("index")?);
        }

        let material_count = reader.read_u32("material count")? as usize;
        reader.ensure_records(material_count, MATERIAL_SIZE, "material")?;
        let mut materials = Vec::with_capacity(material_count);
        for _ in 0..material_count {
            materials.push(read_material(&mut reader)?);
        }

        let bone_count = reader.read_u16("bone count")? as usize;
        reader.ensure_records(bone_count, BONE_SIZE, "bone")?;
        let mut bones = Vec::with_capacity(bone_count);
        for _ in 0..bone_count {
            bones.push(read_bone(&mut reader)?);
        }

        let ik_count = reader.read_u16("IK count")? as usize;
        reader.ensure_records(ik_count, IK_HEADER_SIZE, "IK chain")?;
        let mut iks = Vec::with_capacity(ik_count);
        for _ in 0..ik_count {
            iks.push(read_ik(&mut reader)?);
        }

        log::debug!(
            "PMD 解析完成: {} 顶点, {} 索引, {} 材质, {} 骨骼, {} IK",
            vertices.len(),
            indices.len(),
            materials.len(),
            bones.len(),
            iks.len()
        );

        Ok(Self {
            header,
            vertices,
            indices,
            materials,
            bones,
            iks,
        })
    }
}

fn read_vertex(reader: &mut ByteReader) -> Result<PmdVertex> {
    Ok(PmdVertex {
        position: reader.read_vec3("vertex position")?,
        normal: reader.read_vec3("vertex normal")?,
        uv: reader.read_vec2("vertex uv")?,
        bone_indices: [
            reader.read_u16("vertex bone index")?,
            reader.read_u16("vertex bone index")?,
        ],
        bone_weight: reader.read_u8("vertex bone weight")?,
        edge_flag: reader.read_u8("vertex edge flag")?,
    })
}

fn read_material(reader: &mut ByteReader) -> Result<PmdMaterial> {
    Ok(PmdMaterial {
        diffuse: reader.read_vec3("material diffuse")?,
        alpha: reader.read_f32("material alpha")?,
        specularity: reader.read_f32("material specularity")?,
        specular: reader.read_vec3("material specular")?,
        ambient: reader.read_vec3("material ambient")?,
        toon_index: reader.read_u8("material toon index")?,
        edge_flag: reader.read_u8("material edge flag")?,
        index_count: reader.read_u32("material index count")?,
        texture_path: reader.read_fixed_string(20, "material texture path")?,
    })
}

fn read_bone(reader: &mut ByteReader) -> Result<PmdBone> {
    Ok(PmdBone {
        name: reader.read_fixed_string(20, "bone name")?,
        parent: reader.read_u16("bone parent")?,
        tail: reader.read_u16("bone tail")?,
        kind: reader.read_u8("bone type")?,
        ik_bone: reader.read_u16("bone IK index")?,
        position: reader.read_vec3("bone position")?,
    })
}

fn read_ik(reader: &mut ByteReader) -> Result<PmdIk> {
    let ik_bone = reader.read_u16("IK bone")?;
    let target_bone = reader.read_u16("IK target bone")?;
    let chain_len = reader.read_u8("IK chain length")? as usize;
    let iterations = reader.read_u16("IK iterations")?;
    let limit_angle = reader.read_f32("IK limit angle")?;

    reader.ensure_records(chain_len, 2, "IK chain bone")?;
    let mut chain = Vec::with_capacity(chain_len);
    for _ in 0..chain_len {
        chain.push(reader.read_u16("IK chain bone")?);
    }

    Ok(PmdIk {
        ik_bone,
        target_bone,
        iterations,
        limit_angle,
        chain,
    })
}

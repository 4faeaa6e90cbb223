//! PMD 模型加载器

use std::path::{Path, PathBuf};

use crate::config::AnimationConfig;
use crate::format::{PmdFile, PmdVertex};
use crate::skeleton::{IkDefinition, Skeleton};
use crate::texture::TextureCache;
use crate::{DataIntegrityWarning, Result};

use super::material::MaterialTextureSet;
use super::submesh::build_submeshes;
use super::{Material, SubMesh};

/// 顶点直接使用文件中的布局
pub type Vertex = PmdVertex;

/// 加载完成的 PMD 模型，加载后不再修改
#[derive(Clone, Debug)]
pub struct PmdModel {
    pub name: String,
    pub comment: String,
    /// 模型文件所在目录，贴图路径相对于它解析
    pub directory: PathBuf,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    pub materials: Vec<Material>,
    pub submeshes: Vec<SubMesh>,
    pub skeleton: Skeleton,
    /// 有效的 IK 链，保持文件顺序
    pub iks: Vec<IkDefinition>,
    /// 加载过程中发现的非致命问题
    pub warnings: Vec<DataIntegrityWarning>,
}

/// 从 PMD 文件加载模型
pub fn load_pmd<P: AsRef<Path>>(path: P, config: &AnimationConfig) -> Result<PmdModel> {
    let path = path.as_ref();
    let pmd = PmdFile::load(path)?;

    // 获取模型所在目录（用于组合纹理路径）
    let model_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(PmdModel::from_pmd(pmd, model_dir, config))
}

impl PmdModel {
    pub fn load<P: AsRef<Path>>(path: P, config: &AnimationConfig) -> Result<Self> {
        load_pmd(path, config)
    }

    /// 从解析好的 PMD 数据构建
    pub fn from_pmd(pmd: PmdFile, directory: PathBuf, config: &AnimationConfig) -> Self {
        let (skeleton, mut warnings) = Skeleton::build(&pmd.bones);

        let mut iks = Vec::with_capacity(pmd.iks.len());
        for (index, ik) in pmd.iks.iter().enumerate() {
            match IkDefinition::from_pmd(index, ik, &skeleton) {
                Ok(definition) => iks.push(definition),
                Err(warning) => {
                    log::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        let materials: Vec<Material> = pmd
            .materials
            .iter()
            .map(|m| Material::from_pmd(m, &directory, &config.toon_directory))
            .collect();
        let submeshes = build_submeshes(&materials, pmd.indices.len());

        let declared: u64 = materials.iter().map(|m| m.index_count as u64).sum();
        if declared != pmd.indices.len() as u64 {
            log::warn!(
                "materials declare {} indices but the model has {}",
                declared,
                pmd.indices.len()
            );
        }

        log::info!(
            "Loaded PMD model '{}': {} vertices, {} indices, {} materials, {} bones, {} IK chains",
            pmd.header.model_name,
            pmd.vertices.len(),
            pmd.indices.len(),
            materials.len(),
            skeleton.len(),
            iks.len()
        );

        Self {
            name: pmd.header.model_name,
            comment: pmd.header.comment,
            directory,
            vertices: pmd.vertices,
            indices: pmd.indices,
            materials,
            submeshes,
            skeleton,
            iks,
            warnings,
        }
    }

    pub fn bone_count(&self) -> usize {
        self.skeleton.len()
    }

    /// 加载所有材质的纹理，返回与材质一一对应的纹理组
    pub fn load_textures(&self, cache: &mut TextureCache) -> Vec<MaterialTextureSet> {
        self.materials
            .iter()
            .map(|material| material.load_textures(cache))
            .collect()
    }
}

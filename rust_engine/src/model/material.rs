//! PMD 材质定义

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{Vec3, Vec4};

use crate::format::PmdMaterial;
use crate::texture::{Texture, TextureCache, TextureSlot};

/// toon 编号为该值时表示不使用 toon 贴图
pub const NO_TOON: u8 = 0xff;

/// 贴图字段拆分后的文件名
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextureNames {
    pub base: Option<String>,
    pub sphere: Option<String>,
    pub additive: Option<String>,
}

/// 拆分 PMD 贴图字段
///
/// 字段可能是单个文件，也可能是 `a*b` 形式；`.sph` 为乘算球面贴图，
/// `.spa` 为加算球面贴图，其余视为基础贴图。
pub fn split_texture_path(raw: &str) -> TextureNames {
    let mut names = TextureNames::default();
    if raw.is_empty() {
        return names;
    }

    match raw.split_once('*') {
        Some((first, second)) => match sphere_kind(first) {
            Some(slot) => {
                names.set(slot, first);
                names.set(TextureSlot::Base, second);
            }
            None => {
                names.set(TextureSlot::Base, first);
                if let Some(slot) = sphere_kind(second) {
                    names.set(slot, second);
                }
            }
        },
        None => names.set(sphere_kind(raw).unwrap_or(TextureSlot::Base), raw),
    }
    names
}

fn sphere_kind(name: &str) -> Option<TextureSlot> {
    let ext = name.rsplit_once('.')?.1;
    if ext.eq_ignore_ascii_case("sph") {
        Some(TextureSlot::Sphere)
    } else if ext.eq_ignore_ascii_case("spa") {
        Some(TextureSlot::Additive)
    } else {
        None
    }
}

impl TextureNames {
    fn set(&mut self, slot: TextureSlot, name: &str) {
        if name.is_empty() {
            return;
        }
        let name = Some(name.to_string());
        match slot {
            TextureSlot::Base => self.base = name,
            TextureSlot::Sphere => self.sphere = name,
            TextureSlot::Additive => self.additive = name,
            TextureSlot::Toon => {}
        }
    }
}

/// 共享 toon 贴图路径：`<dir>/toonNN.bmp`，NN = 编号 + 1
pub fn toon_path(toon_directory: &Path, toon_index: u8) -> Option<PathBuf> {
    if toon_index == NO_TOON {
        return None;
    }
    Some(toon_directory.join(format!("toon{:02}.bmp", toon_index as u32 + 1)))
}

/// 材质各槽位的贴图文件路径（已相对模型目录解析）
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterialTextures {
    pub base: Option<PathBuf>,
    pub sphere: Option<PathBuf>,
    pub additive: Option<PathBuf>,
    pub toon: Option<PathBuf>,
}

impl MaterialTextures {
    pub fn path(&self, slot: TextureSlot) -> Option<&Path> {
        match slot {
            TextureSlot::Base => self.base.as_deref(),
            TextureSlot::Sphere => self.sphere.as_deref(),
            TextureSlot::Additive => self.additive.as_deref(),
            TextureSlot::Toon => self.toon.as_deref(),
        }
    }
}

/// 材质四个槽位最终使用的纹理（缺失时为占位纹理）
#[derive(Clone, Debug)]
pub struct MaterialTextureSet {
    pub base: Arc<Texture>,
    pub sphere: Arc<Texture>,
    pub additive: Arc<Texture>,
    pub toon: Arc<Texture>,
}

/// PMD 材质
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// 漫反射颜色，w 为不透明度
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_power: f32,
    pub ambient: Vec3,
    pub toon_index: u8,
    pub edge_flag: u8,
    /// 该材质对应的索引数
    pub index_count: u32,
    /// 文件中的原始贴图字段
    pub texture_field: String,
    pub textures: MaterialTextures,
}

impl Material {
    pub fn from_pmd(pmd: &PmdMaterial, model_dir: &Path, toon_directory: &Path) -> Self {
        let names = split_texture_path(&pmd.texture_path);
        let resolve = |name: Option<String>| name.map(|n| model_dir.join(n));
        Self {
            diffuse: pmd.diffuse.extend(pmd.alpha),
            specular: pmd.specular,
            specular_power: pmd.specularity,
            ambient: pmd.ambient,
            toon_index: pmd.toon_index,
            edge_flag: pmd.edge_flag,
            index_count: pmd.index_count,
            texture_field: pmd.texture_path.clone(),
            textures: MaterialTextures {
                base: resolve(names.base),
                sphere: resolve(names.sphere),
                additive: resolve(names.additive),
                toon: toon_path(toon_directory, pmd.toon_index),
            },
        }
    }

    /// 是否绘制轮廓线
    pub fn has_edge(&self) -> bool {
        self.edge_flag != 0
    }

    pub fn is_transparent(&self) -> bool {
        self.diffuse.w < 1.0
    }

    /// 通过缓存加载四个槽位的纹理，缺失时使用占位纹理
    pub fn load_textures(&self, cache: &mut TextureCache) -> MaterialTextureSet {
        MaterialTextureSet {
            base: cache.resolve(self.textures.path(TextureSlot::Base), TextureSlot::Base),
            sphere: cache.resolve(self.textures.path(TextureSlot::Sphere), TextureSlot::Sphere),
            additive: cache.resolve(self.textures.path(TextureSlot::Additive), TextureSlot::Additive),
            toon: cache.resolve(self.textures.path(TextureSlot::Toon), TextureSlot::Toon),
        }
    }
}

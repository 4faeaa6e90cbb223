//! 纹理加载
//!
//! 按扩展名选择解码方式：
//! - sph / spa / bmp / png / jpg：通用解码（按文件内容识别格式）
//! - tga：TGA 解码
//! - dds：DDS（块压缩）解码
//!
//! 其他扩展名不加载，返回“无纹理”。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat};

use super::{Texture, TextureSlot};
use crate::{DataIntegrityWarning, MmdError, Result};

/// 解码方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureDecoder {
    Generic,
    Tga,
    Dds,
}

impl TextureDecoder {
    /// 根据扩展名（不区分大小写）选择解码方式
    pub fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "sph" | "spa" | "bmp" | "png" | "jpg" | "jpeg" => Some(Self::Generic),
            "tga" => Some(Self::Tga),
            "dds" => Some(Self::Dds),
            _ => None,
        }
    }
}

/// 从文件加载纹理
///
/// 扩展名不支持时返回 `Ok(None)`；文件缺失或解码失败返回错误。
pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<Option<Texture>> {
    let path = path.as_ref();
    let Some(decoder) = TextureDecoder::for_path(path) else {
        return Ok(None);
    };

    let mut reader = ImageReader::open(path)?;
    match decoder {
        TextureDecoder::Generic => reader = reader.with_guessed_format()?,
        TextureDecoder::Tga => reader.set_format(ImageFormat::Tga),
        TextureDecoder::Dds => reader.set_format(ImageFormat::Dds),
    }
    let img = reader
        .decode()
        .map_err(|e| MmdError::Texture(format!("Failed to decode '{}': {}", path.display(), e)))?;

    let texture = from_image(img);
    log::debug!(
        "Loaded texture '{}' ({}x{}, {:?})",
        path.display(),
        texture.width,
        texture.height,
        decoder
    );
    Ok(Some(texture))
}

/// 统一转为 RGBA8，保留原始是否带透明通道
fn from_image(img: DynamicImage) -> Texture {
    let has_alpha = img.color().has_alpha();
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Texture::new(width, height, rgba.into_raw(), has_alpha)
}

/// 以路径为键的纹理缓存
///
/// 同一路径只解码一次；加载失败也会被记住，不会重复报告。
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: HashMap<PathBuf, Option<Arc<Texture>>>,
    placeholders: HashMap<TextureSlot, Arc<Texture>>,
    warnings: Vec<DataIntegrityWarning>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取已缓存的纹理，未缓存时加载
    pub fn get_or_load(&mut self, path: &Path) -> Option<Arc<Texture>> {
        if let Some(cached) = self.textures.get(path) {
            return cached.clone();
        }

        let loaded = match load_texture(path) {
            Ok(Some(texture)) => Some(Arc::new(texture)),
            Ok(None) => {
                self.warn(DataIntegrityWarning::UnsupportedTextureExtension {
                    path: path.display().to_string(),
                });
                None
            }
            Err(e) => {
                log::debug!("{}", e);
                self.warn(DataIntegrityWarning::MissingTexture {
                    path: path.display().to_string(),
                });
                None
            }
        };
        self.textures.insert(path.to_path_buf(), loaded.clone());
        loaded
    }

    /// 槽位的占位纹理（共享同一份数据）
    pub fn placeholder(&mut self, slot: TextureSlot) -> Arc<Texture> {
        self.placeholders
            .entry(slot)
            .or_insert_with(|| Arc::new(slot.placeholder()))
            .clone()
    }

    /// 解析一个槽位：有路径且加载成功则返回纹理，否则返回占位纹理
    pub fn resolve(&mut self, path: Option<&Path>, slot: TextureSlot) -> Arc<Texture> {
        match path.and_then(|p| self.get_or_load(p)) {
            Some(texture) => texture,
            None => self.placeholder(slot),
        }
    }

    /// 已缓存的路径数（含加载失败的路径）
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn warnings(&self) -> &[DataIntegrityWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<DataIntegrityWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn warn(&mut self, warning: DataIntegrityWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

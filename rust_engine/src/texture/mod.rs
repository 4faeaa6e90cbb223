//! 纹理加载和管理
//!
//! 所有纹理统一为 RGBA8、按行从上到下排列。缺失的贴图由占位纹理代替。

mod loader;

pub use loader::{load_texture, TextureCache, TextureDecoder};

/// 纹理数据
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub has_alpha: bool,
}

impl Texture {
    pub fn new(width: u32, height: u32, data: Vec<u8>, has_alpha: bool) -> Self {
        Self { width, height, data, has_alpha }
    }

    /// 纯色纹理
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba.repeat((width * height) as usize);
        Self::new(width, height, data, rgba[3] != 0xff)
    }

    /// 4x4 白色占位
    pub fn white() -> Self {
        Self::solid(4, 4, [0xff, 0xff, 0xff, 0xff])
    }

    /// 4x4 黑色占位
    pub fn black() -> Self {
        Self::solid(4, 4, [0x00, 0x00, 0x00, 0xff])
    }

    /// 4x256 灰度渐变，上白下黑（toon 默认）
    pub fn gray_gradient() -> Self {
        const WIDTH: u32 = 4;
        const HEIGHT: u32 = 256;
        let mut data = Vec::with_capacity((WIDTH * HEIGHT * 4) as usize);
        for row in 0..HEIGHT {
            let c = (0xff - row) as u8;
            for _ in 0..WIDTH {
                data.extend_from_slice(&[c, c, c, 0xff]);
            }
        }
        Self::new(WIDTH, HEIGHT, data, false)
    }

    /// 获取纹理字节数
    pub fn byte_count(&self) -> usize {
        self.data.len()
    }

    /// 检查是否包含透明通道
    pub fn has_transparency(&self) -> bool {
        self.has_alpha
    }

    /// 读取像素，越界返回 `None`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        let p = self.data.get(offset..offset + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}

/// 材质上的贴图槽位
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Base,
    /// 乘算球面贴图 (.sph)
    Sphere,
    /// 加算球面贴图 (.spa)
    Additive,
    Toon,
}

impl TextureSlot {
    /// 槽位为空时使用的占位纹理
    pub fn placeholder(self) -> Texture {
        match self {
            Self::Base | Self::Sphere => Texture::white(),
            Self::Additive => Texture::black(),
            Self::Toon => Texture::gray_gradient(),
        }
    }
}

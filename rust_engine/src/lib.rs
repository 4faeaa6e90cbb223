//! MMD Viewer - PMD 模型 / VMD 动作运行时
//!
//! 提供角色查看器的动画核心：
//! - PMD 模型与 VMD 动作的二进制解析
//! - 骨骼层级构建
//! - 关键帧贝塞尔缓动插值
//! - IK 求解（CCD、余弦定理双骨骼、LookAt）
//! - 每帧姿态求值并输出世界矩阵调色板
//!
//! 窗口、图形设备和绘制命令不在本 crate 内，通过 [`render::RenderAdapter`] 对接。

pub mod animation;
pub mod config;
pub mod format;
pub mod model;
pub mod render;
pub mod skeleton;
pub mod texture;

pub use animation::{Animator, Motion, PlaybackState};
pub use config::{AnimationConfig, EndOfClip};
pub use model::{Actor, PmdModel};
pub use render::RenderAdapter;
pub use skeleton::{IkDefinition, IkSolverKind, Pose, Skeleton};
pub use texture::{Texture, TextureCache};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MmdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Resource creation error: {0}")]
    ResourceCreation(String),

    #[error("Texture error: {0}")]
    Texture(String),
}

pub type Result<T> = std::result::Result<T, MmdError>;

/// 数据完整性警告
///
/// 不会中断加载，只记录日志并使用回退值（绑定姿态、占位纹理等）。
#[derive(Clone, Debug, PartialEq)]
pub enum DataIntegrityWarning {
    /// 无法从任何根骨骼到达的骨骼（父子关系成环）
    UnreachableBone { index: usize, name: String },
    /// 引用越界骨骼或没有中间骨骼的 IK 链
    InvalidIkChain { index: usize, reason: String },
    /// 纹理文件不存在或解码失败
    MissingTexture { path: String },
    /// 不支持的纹理扩展名
    UnsupportedTextureExtension { path: String },
    /// 动作中存在模型没有的骨骼轨道
    UnknownMotionBone { name: String },
}

impl std::fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnreachableBone { index, name } => {
                write!(f, "bone #{} '{}' is not reachable from any root", index, name)
            }
            Self::InvalidIkChain { index, reason } => {
                write!(f, "IK chain #{} ignored: {}", index, reason)
            }
            Self::MissingTexture { path } => write!(f, "texture '{}' could not be loaded", path),
            Self::UnsupportedTextureExtension { path } => {
                write!(f, "texture '{}' has an unsupported extension", path)
            }
            Self::UnknownMotionBone { name } => {
                write!(f, "motion track '{}' has no matching bone", name)
            }
        }
    }
}

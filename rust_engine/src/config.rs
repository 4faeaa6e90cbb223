//! 动画运行时配置
//!
//! 参数扁平化，默认值即为 MMD 标准行为；由调用方显式构造并传入，不使用全局状态。

use std::path::PathBuf;

/// 片段结束时的播放策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EndOfClip {
    /// 回到第 0 帧循环播放
    #[default]
    Loop,
    /// 停留在最后一帧
    Hold,
}

/// 动画配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// 动作帧率，默认 30.0（VMD 标准）
    pub frames_per_second: f32,
    /// 贝塞尔曲线求逆的二分迭代次数，默认 12
    pub bezier_iterations: u32,
    /// 片段结束策略，默认循环
    pub end_of_clip: EndOfClip,
    /// CCD 收敛阈值（效果器到目标的距离），默认 1e-4
    pub ik_convergence_epsilon: f32,
    /// 共享 toon 贴图目录，默认 "toon"
    pub toon_directory: PathBuf,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 30.0,
            bezier_iterations: 12,
            end_of_clip: EndOfClip::Loop,
            ik_convergence_epsilon: 1.0e-4,
            toon_directory: PathBuf::from("toon"),
        }
    }
}

impl AnimationConfig {
    pub fn with_frames_per_second(mut self, fps: f32) -> Self {
        self.frames_per_second = fps;
        self
    }

    pub fn with_bezier_iterations(mut self, iterations: u32) -> Self {
        self.bezier_iterations = iterations;
        self
    }

    pub fn with_end_of_clip(mut self, policy: EndOfClip) -> Self {
        self.end_of_clip = policy;
        self
    }

    pub fn with_ik_convergence_epsilon(mut self, epsilon: f32) -> Self {
        self.ik_convergence_epsilon = epsilon;
        self
    }

    pub fn with_toon_directory<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.toon_directory = dir.into();
        self
    }
}

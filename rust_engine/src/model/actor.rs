//! 角色：共享的模型数据 + 独立的播放状态

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use glam::Mat4;

use crate::animation::{Animator, Motion, PlaybackState};
use crate::config::AnimationConfig;
use crate::render::RenderAdapter;
use crate::{DataIntegrityWarning, Result};

use super::PmdModel;

/// 场景中的一个角色
///
/// 克隆时共享顶点、材质、骨骼等只读数据，姿态和播放状态各自独立。
#[derive(Clone, Debug)]
pub struct Actor {
    model: Arc<PmdModel>,
    animator: Animator,
    /// 角色整体的世界变换（调色板槽 0）
    transform: Mat4,
}

impl Actor {
    pub fn new(model: Arc<PmdModel>, config: AnimationConfig) -> Self {
        let animator = Animator::new(model.bone_count(), config);
        Self {
            model,
            animator,
            transform: Mat4::IDENTITY,
        }
    }

    /// 加载模型并创建角色
    pub fn load<P: AsRef<Path>>(path: P, config: AnimationConfig) -> Result<Self> {
        let model = PmdModel::load(path, &config)?;
        Ok(Self::new(Arc::new(model), config))
    }

    pub fn model(&self) -> &Arc<PmdModel> {
        &self.model
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// 设置动作，返回模型中找不到的骨骼轨道
    pub fn set_motion(&mut self, motion: Arc<Motion>) -> Vec<DataIntegrityWarning> {
        let warnings = motion.unmatched_bones(&self.model.skeleton);
        for warning in &warnings {
            log::warn!("{}", warning);
        }
        self.animator.set_motion(Some(motion));
        warnings
    }

    /// 从 VMD 文件加载动作；解析失败时保持原来的动作不变
    pub fn load_motion<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<DataIntegrityWarning>> {
        let motion = Motion::load(path, self.animator.config())?;
        Ok(self.set_motion(Arc::new(motion)))
    }

    pub fn clear_motion(&mut self) {
        self.animator.set_motion(None);
    }

    /// 开始播放
    pub fn start(&mut self, now: Instant) {
        self.animator.start(now);
    }

    pub fn stop(&mut self) {
        self.animator.stop();
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.animator.state()
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// 绕 Y 轴追加旋转
    pub fn rotate_y(&mut self, angle: f32) {
        self.transform = Mat4::from_rotation_y(angle) * self.transform;
    }

    /// 按当前时间更新姿态
    pub fn update(&mut self, now: Instant) -> &[Mat4] {
        self.animator
            .update(&self.model.skeleton, &self.model.iks, self.transform, now)
    }

    /// 求值指定帧
    pub fn evaluate_frame(&mut self, frame: f32) -> &[Mat4] {
        self.animator
            .evaluate(&self.model.skeleton, &self.model.iks, frame, self.transform)
    }

    /// 最近一次更新的调色板
    pub fn palette(&self) -> &[Mat4] {
        self.animator.palette()
    }

    /// 上传调色板，再按材质顺序提交绘制
    pub fn draw<R: RenderAdapter + ?Sized>(&self, adapter: &mut R) -> Result<()> {
        adapter.upload_palette(self.animator.palette())?;
        for submesh in &self.model.submeshes {
            if submesh.index_count == 0 {
                continue;
            }
            adapter.draw_indexed(submesh)?;
        }
        Ok(())
    }
}

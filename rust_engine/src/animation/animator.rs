//! 姿态求值器
//!
//! 每帧流程：
//! 1. 重置为绑定姿态
//! 2. 采样关键帧，生成绕旋转中心的本地矩阵
//! 3. 父先子后合成世界矩阵
//! 4. 按文件顺序运行启用的 IK 链，并更新受影响的子树
//! 5. 输出调色板：槽 0 为角色整体变换，之后每根骨骼一项

use std::sync::Arc;
use std::time::Instant;

use glam::Mat4;

use super::Motion;
use crate::config::{AnimationConfig, EndOfClip};
use crate::skeleton::{IkDefinition, IkSolveStats, Pose, Skeleton};

/// 播放状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// 未加载动作或尚未开始，输出绑定姿态
    Stopped,
    /// 播放中，时间从 `started_at` 开始计
    Playing { started_at: Instant },
}

/// 单个角色的姿态求值器
#[derive(Debug, Clone)]
pub struct Animator {
    config: AnimationConfig,
    motion: Option<Arc<Motion>>,
    state: PlaybackState,
    pose: Pose,
    palette: Vec<Mat4>,
    ik_stats: Vec<IkSolveStats>,
}

impl Animator {
    pub fn new(bone_count: usize, config: AnimationConfig) -> Self {
        Self {
            config,
            motion: None,
            state: PlaybackState::Stopped,
            pose: Pose::new(bone_count),
            palette: vec![Mat4::IDENTITY; bone_count + 1],
            ik_stats: Vec::new(),
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// 设置动作，同时回到停止状态
    pub fn set_motion(&mut self, motion: Option<Arc<Motion>>) {
        self.motion = motion;
        self.state = PlaybackState::Stopped;
    }

    pub fn motion(&self) -> Option<&Arc<Motion>> {
        self.motion.as_ref()
    }

    /// 开始播放，没有动作时保持停止
    pub fn start(&mut self, now: Instant) {
        if self.motion.is_none() {
            log::debug!("start ignored: no motion loaded");
            return;
        }
        self.state = PlaybackState::Playing { started_at: now };
        log::debug!("playback started");
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        log::debug!("playback stopped");
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    /// 根据经过时间计算当前帧，停止时返回 `None`
    pub fn frame_at(&self, now: Instant) -> Option<f32> {
        let PlaybackState::Playing { started_at } = self.state else {
            return None;
        };
        let elapsed = now.saturating_duration_since(started_at).as_secs_f32();
        let frame = elapsed * self.config.frames_per_second;
        let duration = self.motion.as_ref().map(|m| m.duration()).unwrap_or(0) as f32;
        Some(self.wrap_frame(frame, duration))
    }

    fn wrap_frame(&self, frame: f32, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 0.0;
        }
        match self.config.end_of_clip {
            EndOfClip::Loop => frame % duration,
            EndOfClip::Hold => frame.min(duration),
        }
    }

    /// 按当前时间更新姿态并返回调色板
    pub fn update(
        &mut self,
        skeleton: &Skeleton,
        iks: &[IkDefinition],
        actor_transform: Mat4,
        now: Instant,
    ) -> &[Mat4] {
        match self.frame_at(now) {
            Some(frame) => self.evaluate(skeleton, iks, frame, actor_transform),
            None => self.bind_pose(skeleton, actor_transform),
        }
    }

    /// 输出绑定姿态
    pub fn bind_pose(&mut self, skeleton: &Skeleton, actor_transform: Mat4) -> &[Mat4] {
        self.prepare(skeleton.len());
        self.pose.compose(skeleton, Mat4::IDENTITY);
        self.ik_stats.clear();
        self.write_palette(actor_transform);
        &self.palette
    }

    /// 求值指定帧（与播放时钟无关，结果只取决于输入）
    pub fn evaluate(
        &mut self,
        skeleton: &Skeleton,
        iks: &[IkDefinition],
        frame: f32,
        actor_transform: Mat4,
    ) -> &[Mat4] {
        self.prepare(skeleton.len());
        self.ik_stats.clear();

        let Some(motion) = self.motion.clone() else {
            return self.bind_pose(skeleton, actor_transform);
        };

        for bone in skeleton.bones() {
            // VMD 中过长的骨骼名以截断形式出现
            let track = [&bone.name, &bone.motion_name]
                .into_iter()
                .find(|name| motion.contains_bone_track(name));
            if let Some(name) = track {
                let transform = motion.sample(name, frame);
                self.pose.set_local(bone.index, transform.to_matrix(bone.pivot));
            }
        }

        // 骨骼矩阵在模型空间，角色整体变换只放在槽 0
        self.pose.compose(skeleton, Mat4::IDENTITY);

        for (index, ik) in iks.iter().enumerate() {
            let enabled = skeleton
                .bone(ik.ik_bone)
                .map_or(true, |bone| motion.is_ik_enabled(&bone.name, frame));
            if !enabled {
                continue;
            }
            let stats = ik.solve(
                skeleton,
                &mut self.pose,
                Mat4::IDENTITY,
                self.config.ik_convergence_epsilon,
            );
            log::trace!(
                "IK #{} {:?}: {} iterations, max step {:.4}, distance {:.5}",
                index,
                stats.kind,
                stats.iterations,
                stats.max_step_angle,
                stats.distance
            );
            self.ik_stats.push(stats);
        }

        self.write_palette(actor_transform);
        &self.palette
    }

    fn prepare(&mut self, bone_count: usize) {
        if self.pose.len() != bone_count {
            self.pose = Pose::new(bone_count);
        } else {
            self.pose.reset();
        }
        self.palette.resize(bone_count + 1, Mat4::IDENTITY);
    }

    fn write_palette(&mut self, actor_transform: Mat4) {
        self.palette[0] = actor_transform;
        self.palette[1..].copy_from_slice(self.pose.world_matrices());
    }

    /// 最近一次求值的调色板
    pub fn palette(&self) -> &[Mat4] {
        &self.palette
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// 最近一次求值中运行过的 IK 链统计
    pub fn ik_stats(&self) -> &[IkSolveStats] {
        &self.ik_stats
    }
}

//! Motion 核心数据结构
//!
//! 按骨骼名称保存有序关键帧序列和 IK 启用窗口。加载后只读。

use std::collections::HashMap;
use std::path::Path;

use super::keyframe::{BoneKeyframe, IkEnableWindow};
use crate::config::AnimationConfig;
use crate::format::VmdFile;
use crate::skeleton::{BoneTransform, Skeleton};
use crate::{DataIntegrityWarning, Result};

/// 动画数据
#[derive(Debug, Clone)]
pub struct Motion {
    /// 骨骼名称 -> 按帧号排序的关键帧
    bone_tracks: HashMap<String, Vec<BoneKeyframe>>,
    /// 按帧号排序的 IK 启用窗口
    ik_windows: Vec<IkEnableWindow>,
    /// 贝塞尔求逆的二分次数
    bezier_iterations: u32,
}

impl Default for Motion {
    fn default() -> Self {
        Self::new()
    }
}

impl Motion {
    /// 创建空的 Motion
    pub fn new() -> Self {
        Self {
            bone_tracks: HashMap::new(),
            ik_windows: Vec::new(),
            bezier_iterations: AnimationConfig::default().bezier_iterations,
        }
    }

    pub fn with_bezier_iterations(mut self, iterations: u32) -> Self {
        self.bezier_iterations = iterations;
        self
    }

    /// 从 VMD 文件加载
    pub fn load<P: AsRef<Path>>(path: P, config: &AnimationConfig) -> Result<Self> {
        let vmd = VmdFile::load(path)?;
        Ok(Self::from_vmd(&vmd, config))
    }

    /// 从解析好的 VMD 数据构建
    pub fn from_vmd(vmd: &VmdFile, config: &AnimationConfig) -> Self {
        let mut motion = Self::new().with_bezier_iterations(config.bezier_iterations);
        for frame in &vmd.bone_frames {
            motion.insert_bone_keyframe(&frame.bone_name, BoneKeyframe::from_vmd(frame));
        }
        for frame in &vmd.ik_frames {
            motion.insert_ik_window(IkEnableWindow::from_vmd(frame));
        }

        log::info!(
            "Motion for '{}': {} bone tracks, {} keyframes, {} IK windows, {} frames",
            vmd.model_name,
            motion.bone_tracks.len(),
            vmd.bone_frames.len(),
            motion.ik_windows.len(),
            motion.duration()
        );
        motion
    }

    /// 插入骨骼关键帧，保持帧号有序（同帧号按插入顺序）
    pub fn insert_bone_keyframe(&mut self, name: &str, keyframe: BoneKeyframe) {
        let track = self.bone_tracks.entry(name.to_string()).or_default();
        let at = track.partition_point(|k| k.frame <= keyframe.frame);
        track.insert(at, keyframe);
    }

    /// 插入 IK 启用窗口，保持帧号有序
    pub fn insert_ik_window(&mut self, window: IkEnableWindow) {
        let at = self.ik_windows.partition_point(|w| w.frame <= window.frame);
        self.ik_windows.insert(at, window);
    }

    /// 最后一个关键帧（或 IK 窗口）的帧号
    pub fn duration(&self) -> u32 {
        let bone_max = self
            .bone_tracks
            .values()
            .filter_map(|t| t.last().map(|k| k.frame))
            .max()
            .unwrap_or(0);
        let ik_max = self.ik_windows.last().map(|w| w.frame).unwrap_or(0);
        bone_max.max(ik_max)
    }

    pub fn is_empty(&self) -> bool {
        self.bone_tracks.is_empty() && self.ik_windows.is_empty()
    }

    /// 检查是否包含骨骼轨道
    pub fn contains_bone_track(&self, name: &str) -> bool {
        self.bone_tracks.contains_key(name)
    }

    pub fn bone_track(&self, name: &str) -> Option<&[BoneKeyframe]> {
        self.bone_tracks.get(name).map(Vec::as_slice)
    }

    pub fn ik_windows(&self) -> &[IkEnableWindow] {
        &self.ik_windows
    }

    /// 采样骨骼在指定帧的旋转和平移
    ///
    /// 首帧之前和末帧之后取端点值，正好落在关键帧上时直接返回该关键帧。
    /// 没有轨道的骨骼返回绑定姿态。
    pub fn sample(&self, name: &str, frame: f32) -> BoneTransform {
        let Some(track) = self.bone_tracks.get(name) else {
            return BoneTransform::default();
        };
        let (Some(first), Some(last)) = (track.first(), track.last()) else {
            return BoneTransform::default();
        };

        if frame <= first.frame as f32 {
            return keyframe_transform(first);
        }
        if frame >= last.frame as f32 {
            return keyframe_transform(last);
        }

        // first.frame < frame < last.frame，因此 0 < next < len
        let next = track.partition_point(|k| (k.frame as f32) <= frame);
        let from = &track[next - 1];
        let to = &track[next];
        if from.frame as f32 == frame {
            return keyframe_transform(from);
        }

        let span = (to.frame - from.frame) as f32;
        let t = (frame - from.frame as f32) / span;
        let iterations = self.bezier_iterations;

        let rotation_weight = to.interp_rotation.evaluate(t, iterations);
        let weights = glam::Vec3::new(
            to.interp_x.evaluate(t, iterations),
            to.interp_y.evaluate(t, iterations),
            to.interp_z.evaluate(t, iterations),
        );

        BoneTransform {
            translation: from.translation + (to.translation - from.translation) * weights,
            rotation: from.rotation.slerp(to.rotation, rotation_weight).normalize(),
        }
    }

    /// IK 骨骼在指定帧是否启用
    ///
    /// 取帧号 ≤ 当前帧、且提到该骨骼的最近一个窗口；没有任何窗口提到时默认启用。
    pub fn is_ik_enabled(&self, name: &str, frame: f32) -> bool {
        let active = self.ik_windows.partition_point(|w| (w.frame as f32) <= frame);
        self.ik_windows[..active]
            .iter()
            .rev()
            .find_map(|w| w.flags.get(name).copied())
            .unwrap_or(true)
    }

    /// 模型中找不到对应骨骼的轨道
    pub fn unmatched_bones(&self, skeleton: &Skeleton) -> Vec<DataIntegrityWarning> {
        let mut names: Vec<&String> = self
            .bone_tracks
            .keys()
            .filter(|name| skeleton.find_bone_by_motion_name(name).is_none())
            .collect();
        names.sort();
        names
            .into_iter()
            .map(|name| DataIntegrityWarning::UnknownMotionBone { name: name.clone() })
            .collect()
    }
}

fn keyframe_transform(keyframe: &BoneKeyframe) -> BoneTransform {
    BoneTransform {
        translation: keyframe.translation,
        rotation: keyframe.rotation,
    }
}

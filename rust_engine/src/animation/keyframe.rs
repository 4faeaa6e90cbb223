//! 动画关键帧

use std::collections::HashMap;

use glam::{Quat, Vec3};

use super::BezierCurve;
use crate::format::{VmdBoneFrame, VmdIkFrame};

/// 骨骼关键帧
///
/// 插值曲线描述的是“上一关键帧到本关键帧”这一段。
#[derive(Clone, Debug, PartialEq)]
pub struct BoneKeyframe {
    pub frame: u32,
    pub translation: Vec3,
    pub rotation: Quat,
    pub interp_x: BezierCurve,
    pub interp_y: BezierCurve,
    pub interp_z: BezierCurve,
    pub interp_rotation: BezierCurve,
}

impl BoneKeyframe {
    pub fn new(frame: u32) -> Self {
        Self {
            frame,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            interp_x: BezierCurve::linear(),
            interp_y: BezierCurve::linear(),
            interp_z: BezierCurve::linear(),
            interp_rotation: BezierCurve::linear(),
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation.normalize();
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// 所有通道使用同一条曲线
    pub fn with_curve(mut self, curve: BezierCurve) -> Self {
        self.interp_x = curve;
        self.interp_y = curve;
        self.interp_z = curve;
        self.interp_rotation = curve;
        self
    }

    /// 从 VMD 骨骼帧创建，四元数在此归一化
    pub fn from_vmd(frame: &VmdBoneFrame) -> Self {
        let rotation = if frame.rotation.length_squared() > 0.0 {
            frame.rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        Self {
            frame: frame.frame,
            translation: frame.position,
            rotation,
            interp_x: BezierCurve::from_vmd_block(&frame.interpolation, 0),
            interp_y: BezierCurve::from_vmd_block(&frame.interpolation, 1),
            interp_z: BezierCurve::from_vmd_block(&frame.interpolation, 2),
            interp_rotation: BezierCurve::from_vmd_block(&frame.interpolation, 3),
        }
    }
}

/// IK 启用窗口
///
/// 从 `frame` 开始生效，直到下一个提到同一 IK 骨骼的窗口。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IkEnableWindow {
    pub frame: u32,
    /// IK 骨骼名称 -> 是否启用
    pub flags: HashMap<String, bool>,
}

impl IkEnableWindow {
    pub fn new(frame: u32) -> Self {
        Self {
            frame,
            flags: HashMap::new(),
        }
    }

    pub fn with_flag(mut self, ik_bone_name: &str, enabled: bool) -> Self {
        self.flags.insert(ik_bone_name.to_string(), enabled);
        self
    }

    pub fn from_vmd(frame: &VmdIkFrame) -> Self {
        Self {
            frame: frame.frame,
            flags: frame.entries.iter().cloned().collect(),
        }
    }
}

//! 骨骼节点

use glam::Vec3;

use crate::format::{motion_bone_name, PmdBone, NO_BONE};

/// PMD 骨骼种类
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoneType {
    Rotate,
    RotateAndMove,
    Ik,
    Unknown,
    IkAffected,
    RotateAffected,
    IkTarget,
    Invisible,
    Twist,
    RotateFollow,
    Other(u8),
}

impl BoneType {
    /// 能否作为铰链关节参与余弦定理求解
    ///
    /// 扭转、跟随类骨骼的旋转受其他骨骼约束，不能当作自由铰链。
    pub fn is_hinge(self) -> bool {
        matches!(self, Self::Rotate | Self::RotateAndMove | Self::IkAffected)
    }
}

impl From<u8> for BoneType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Rotate,
            1 => Self::RotateAndMove,
            2 => Self::Ik,
            3 => Self::Unknown,
            4 => Self::IkAffected,
            5 => Self::RotateAffected,
            6 => Self::IkTarget,
            7 => Self::Invisible,
            8 => Self::Twist,
            9 => Self::RotateFollow,
            other => Self::Other(other),
        }
    }
}

/// 骨骼节点
///
/// 父子关系都以索引保存在同一个骨骼数组中，不持有其他节点。
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub index: usize,
    pub name: String,
    /// 动作文件中引用该骨骼时使用的名称（骨骼名字段较短，可能被截断）
    pub motion_name: String,
    pub parent: Option<usize>,
    pub bone_type: BoneType,
    /// IK 影响骨骼索引
    pub ik_bone: Option<usize>,
    /// 绑定姿态下的旋转中心（模型空间）
    pub pivot: Vec3,
    pub children: Vec<usize>,
    /// 是否可以从某个根骨骼到达
    pub reachable: bool,
}

impl Bone {
    /// 从 PMD 骨骼数据创建，越界索引视为“无”
    pub fn from_pmd_bone(index: usize, pmd: &PmdBone, bone_count: usize) -> Self {
        Self {
            index,
            name: pmd.name.clone(),
            motion_name: motion_bone_name(&pmd.name),
            parent: bone_ref(pmd.parent, bone_count).filter(|&p| p != index),
            bone_type: BoneType::from(pmd.kind),
            ik_bone: bone_ref(pmd.ik_bone, bone_count),
            pivot: pmd.position,
            children: Vec::new(),
            reachable: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

fn bone_ref(raw: u16, bone_count: usize) -> Option<usize> {
    if raw == NO_BONE || raw as usize >= bone_count {
        None
    } else {
        Some(raw as usize)
    }
}

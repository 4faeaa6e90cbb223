//! 骨骼系统和 IK 求解器

mod bone;
pub(crate) mod hierarchy;
mod ik_solver;
mod pose;

pub use bone::{Bone, BoneType};
pub use hierarchy::Skeleton;
pub use ik_solver::{IkDefinition, IkSolveStats, IkSolverKind};
pub use pose::{pivot_transform, Pose};

use glam::{Mat4, Quat, Vec3};

/// 骨骼变换数据（相对绑定姿态的旋转和平移）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl BoneTransform {
    /// 绕骨骼旋转中心的本地矩阵
    pub fn to_matrix(&self, pivot: Vec3) -> Mat4 {
        pivot_transform(pivot, self.rotation, self.translation)
    }
}

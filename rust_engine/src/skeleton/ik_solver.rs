//! IK 求解器
//!
//! 三种求解策略按链形状静态选择：
//! - 1 根中间骨骼：LookAt，直接把骨骼指向目标
//! - 2 根中间骨骼且都是铰链关节：余弦定理闭式解（膝、肘）
//! - 其余（3 根及以上，或含扭转、跟随骨骼）：CCD 迭代
//!
//! 所有求解器只读取本帧已合成的矩阵，回写链上骨骼的本地矩阵并更新子树。

use glam::{Mat4, Quat, Vec3};

use crate::format::PmdIk;
use crate::DataIntegrityWarning;

use super::{BoneType, Pose, Skeleton};

/// 小于该角度（弧度）的修正直接跳过
const MIN_STEP_ANGLE: f32 = 1.0e-5;

/// IK 求解策略
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IkSolverKind {
    LookAt,
    TwoBone,
    Ccd,
}

impl IkSolverKind {
    /// 根据中间骨骼的数量和声明的骨骼种类选择策略
    pub fn for_chain(link_types: &[BoneType]) -> Option<Self> {
        match link_types {
            [] => None,
            [_] => Some(Self::LookAt),
            [middle, base] if middle.is_hinge() && base.is_hinge() => Some(Self::TwoBone),
            _ => Some(Self::Ccd),
        }
    }
}

/// IK 链定义
#[derive(Clone, Debug, PartialEq)]
pub struct IkDefinition {
    /// IK 骨骼，其位置即目标位置
    pub ik_bone: usize,
    /// 需要到达目标的链末端骨骼
    pub effector: usize,
    pub iterations: u32,
    /// 单次迭代的角度修正上限（弧度），非正值表示不限制
    pub limit_angle: f32,
    /// 中间骨骼，从末端一侧排向根部
    pub links: Vec<usize>,
    /// 加载时按链形状确定的求解策略
    pub kind: IkSolverKind,
}

/// 单次求解统计
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IkSolveStats {
    pub kind: IkSolverKind,
    pub iterations: u32,
    /// 单步中最大的关节旋转角
    pub max_step_angle: f32,
    /// 求解后末端到目标的距离
    pub distance: f32,
}

impl IkDefinition {
    /// 从 PMD IK 数据创建，校验骨骼索引
    pub fn from_pmd(
        index: usize,
        pmd: &PmdIk,
        skeleton: &Skeleton,
    ) -> std::result::Result<Self, DataIntegrityWarning> {
        let bone_count = skeleton.len();
        let invalid = |reason: String| DataIntegrityWarning::InvalidIkChain { index, reason };

        if pmd.ik_bone as usize >= bone_count {
            return Err(invalid(format!("IK bone {} out of range", pmd.ik_bone)));
        }
        if pmd.target_bone as usize >= bone_count {
            return Err(invalid(format!("target bone {} out of range", pmd.target_bone)));
        }
        if pmd.chain.is_empty() {
            return Err(invalid("chain has no intermediate bones".to_string()));
        }
        if let Some(bad) = pmd.chain.iter().find(|&&b| b as usize >= bone_count) {
            return Err(invalid(format!("chain bone {} out of range", bad)));
        }

        let links: Vec<usize> = pmd.chain.iter().map(|&b| b as usize).collect();
        let link_types: Vec<BoneType> = links
            .iter()
            .filter_map(|&b| skeleton.bone(b))
            .map(|bone| bone.bone_type)
            .collect();
        let kind = IkSolverKind::for_chain(&link_types)
            .ok_or_else(|| invalid("chain has no intermediate bones".to_string()))?;

        Ok(Self {
            ik_bone: pmd.ik_bone as usize,
            effector: pmd.target_bone as usize,
            iterations: pmd.iterations as u32,
            limit_angle: pmd.limit_angle,
            links,
            kind,
        })
    }

    /// 按链形状选择策略并求解
    pub fn solve(
        &self,
        skeleton: &Skeleton,
        pose: &mut Pose,
        root: Mat4,
        epsilon: f32,
    ) -> IkSolveStats {
        self.solve_with(self.kind, skeleton, pose, root, epsilon)
    }

    /// 指定策略求解
    pub fn solve_with(
        &self,
        kind: IkSolverKind,
        skeleton: &Skeleton,
        pose: &mut Pose,
        root: Mat4,
        epsilon: f32,
    ) -> IkSolveStats {
        let mut stats = IkSolveStats {
            kind,
            iterations: 0,
            max_step_angle: 0.0,
            distance: 0.0,
        };
        if self.links.is_empty() {
            stats.distance = self.distance(skeleton, pose);
            return stats;
        }

        match kind {
            IkSolverKind::LookAt => self.solve_look_at(skeleton, pose, root, &mut stats),
            IkSolverKind::TwoBone if self.links.len() >= 2 => {
                self.solve_two_bone(skeleton, pose, root, &mut stats)
            }
            _ => self.solve_ccd(skeleton, pose, root, epsilon, &mut stats),
        }

        stats.distance = self.distance(skeleton, pose);
        stats
    }

    /// 末端到目标的距离
    pub fn distance(&self, skeleton: &Skeleton, pose: &Pose) -> f32 {
        let goal = pose.world_position(skeleton, self.ik_bone);
        pose.world_position(skeleton, self.effector).distance(goal)
    }

    fn clamp_step(&self, angle: f32) -> f32 {
        if self.limit_angle > 0.0 {
            angle.min(self.limit_angle)
        } else {
            angle
        }
    }

    /// CCD：从末端一侧逐个关节旋转，使末端方向对准目标
    fn solve_ccd(
        &self,
        skeleton: &Skeleton,
        pose: &mut Pose,
        root: Mat4,
        epsilon: f32,
        stats: &mut IkSolveStats,
    ) {
        let goal = pose.world_position(skeleton, self.ik_bone);

        'iterations: for iteration in 0..self.iterations {
            stats.iterations = iteration + 1;

            for &link in &self.links {
                if link == self.effector {
                    continue;
                }

                let effector_pos = pose.world_position(skeleton, self.effector);
                if effector_pos.distance(goal) <= epsilon {
                    break 'iterations;
                }

                let joint_pos = pose.world_position(skeleton, link);
                let to_effector = (effector_pos - joint_pos).normalize_or_zero();
                let to_goal = (goal - joint_pos).normalize_or_zero();
                if to_effector == Vec3::ZERO || to_goal == Vec3::ZERO {
                    continue;
                }

                let angle = to_effector.dot(to_goal).clamp(-1.0, 1.0).acos();
                if angle < MIN_STEP_ANGLE {
                    continue;
                }
                let angle = self.clamp_step(angle);

                let mut axis = to_effector.cross(to_goal).normalize_or_zero();
                if axis == Vec3::ZERO {
                    // 反向共线，任取一根垂直轴
                    axis = to_effector.any_orthonormal_vector();
                }

                pose.rotate_about(
                    skeleton,
                    link,
                    joint_pos,
                    Quat::from_axis_angle(axis, angle),
                    root,
                );
                stats.max_step_angle = stats.max_step_angle.max(angle);
            }

            if pose.world_position(skeleton, self.effector).distance(goal) <= epsilon {
                break;
            }
        }
    }

    /// 余弦定理双骨骼：links[0] 为中间关节，links[1] 为根关节
    fn solve_two_bone(
        &self,
        skeleton: &Skeleton,
        pose: &mut Pose,
        root: Mat4,
        stats: &mut IkSolveStats,
    ) {
        let middle = self.links[0];
        let base = self.links[1];

        let goal = pose.world_position(skeleton, self.ik_bone);
        let p0 = pose.world_position(skeleton, base);
        let p1 = pose.world_position(skeleton, middle);
        let p2 = pose.world_position(skeleton, self.effector);

        let a = p0.distance(p1);
        let b = p1.distance(p2);
        let to_goal = goal - p0;
        let goal_distance = to_goal.length();
        if a < 1.0e-6 || b < 1.0e-6 || goal_distance < 1.0e-6 {
            return;
        }
        let dir = to_goal / goal_distance;
        // 超出可达范围时伸直，过近时折叠
        let c = goal_distance.clamp((a - b).abs(), a + b);

        // 弯曲平面法线，去掉沿目标方向的分量。
        // 肢体伸直且与目标共线时依次退回到绑定姿态的弯曲平面、根关节本地 X 轴
        let degenerate = 1.0e-8 * (a * (a + b)).powi(2);
        let normal = [
            (p2 - p0).cross(p1 - p0),
            dir.cross(p1 - p0),
            self.bind_bend_normal(skeleton, pose, base, middle),
            pose.world(base).transform_vector3(Vec3::X),
        ]
        .into_iter()
        .map(|n| n - dir * n.dot(dir))
        .find(|n| n.length_squared() > degenerate)
        .map(Vec3::normalize)
        .unwrap_or_else(|| dir.any_orthonormal_vector());

        let cos_base = ((a * a + c * c - b * b) / (2.0 * a * c)).clamp(-1.0, 1.0);
        let base_angle = cos_base.acos();
        let new_p1 = p0 + Quat::from_axis_angle(normal, base_angle) * dir * a;
        let new_p2 = p0 + dir * c;

        // 根关节：把中间关节移到新位置
        let from = (p1 - p0).normalize_or_zero();
        let to = (new_p1 - p0).normalize_or_zero();
        if from != Vec3::ZERO && to != Vec3::ZERO {
            let rotation = Quat::from_rotation_arc(from, to);
            stats.max_step_angle = stats.max_step_angle.max(rotation.angle_between(Quat::IDENTITY));
            pose.rotate_about(skeleton, base, p0, rotation, root);
        }

        // 中间关节：把末端移到新位置
        let p1_now = pose.world_position(skeleton, middle);
        let p2_now = pose.world_position(skeleton, self.effector);
        let from = (p2_now - p1_now).normalize_or_zero();
        let to = (new_p2 - p1_now).normalize_or_zero();
        if from != Vec3::ZERO && to != Vec3::ZERO {
            let rotation = Quat::from_rotation_arc(from, to);
            stats.max_step_angle = stats.max_step_angle.max(rotation.angle_between(Quat::IDENTITY));
            pose.rotate_about(skeleton, middle, p1_now, rotation, root);
        }

        stats.iterations = 1;
    }

    /// 绑定姿态下的弯曲平面法线，随根关节当前的旋转转到世界空间
    fn bind_bend_normal(
        &self,
        skeleton: &Skeleton,
        pose: &Pose,
        base: usize,
        middle: usize,
    ) -> Vec3 {
        let pivot = |index: usize| skeleton.bone(index).map(|b| b.pivot);
        match (pivot(base), pivot(middle), pivot(self.effector)) {
            (Some(b0), Some(b1), Some(b2)) => pose
                .world(base)
                .transform_vector3((b2 - b0).cross(b1 - b0)),
            _ => Vec3::ZERO,
        }
    }

    /// LookAt：旋转唯一的中间骨骼，使其指向末端的方向对准目标
    fn solve_look_at(
        &self,
        skeleton: &Skeleton,
        pose: &mut Pose,
        root: Mat4,
        stats: &mut IkSolveStats,
    ) {
        let joint = self.links[0];
        let goal = pose.world_position(skeleton, self.ik_bone);
        let joint_pos = pose.world_position(skeleton, joint);
        let effector_pos = pose.world_position(skeleton, self.effector);

        let from = (effector_pos - joint_pos).normalize_or_zero();
        let to = (goal - joint_pos).normalize_or_zero();
        if from == Vec3::ZERO || to == Vec3::ZERO {
            return;
        }

        let rotation = Quat::from_rotation_arc(from, to);
        stats.max_step_angle = rotation.angle_between(Quat::IDENTITY);
        pose.rotate_about(skeleton, joint, joint_pos, rotation, root);
        stats.iterations = 1;
    }
}

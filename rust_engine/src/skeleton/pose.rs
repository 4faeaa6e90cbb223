//! 每帧姿态
//!
//! 矩阵采用列向量约定：`world[child] = world[parent] * local[child]`，
//! 根骨骼 `world[root] = root_transform * local[root]`。
//! 这与行向量写法 `local * world[parent]` 等价。

use glam::{Mat4, Quat, Vec3};

use super::Skeleton;

/// 绕旋转中心的本地变换：`T(offset) * T(pivot) * R * T(-pivot)`
pub fn pivot_transform(pivot: Vec3, rotation: Quat, offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset + pivot)
        * Mat4::from_quat(rotation)
        * Mat4::from_translation(-pivot)
}

/// 本地矩阵数组与派生的世界矩阵数组（按骨骼索引）
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    local: Vec<Mat4>,
    world: Vec<Mat4>,
}

impl Pose {
    pub fn new(bone_count: usize) -> Self {
        Self {
            local: vec![Mat4::IDENTITY; bone_count],
            world: vec![Mat4::IDENTITY; bone_count],
        }
    }

    /// 恢复绑定姿态
    pub fn reset(&mut self) {
        self.local.fill(Mat4::IDENTITY);
        self.world.fill(Mat4::IDENTITY);
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }

    pub fn local(&self, index: usize) -> Mat4 {
        self.local.get(index).copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn world(&self, index: usize) -> Mat4 {
        self.world.get(index).copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn local_matrices(&self) -> &[Mat4] {
        &self.local
    }

    pub fn world_matrices(&self) -> &[Mat4] {
        &self.world
    }

    pub fn set_local(&mut self, index: usize, transform: Mat4) {
        if let Some(local) = self.local.get_mut(index) {
            *local = transform;
        }
    }

    /// 骨骼旋转中心当前的世界坐标
    pub fn world_position(&self, skeleton: &Skeleton, index: usize) -> Vec3 {
        let pivot = skeleton.bone(index).map(|b| b.pivot).unwrap_or(Vec3::ZERO);
        self.world(index).transform_point3(pivot)
    }

    fn parent_world(&self, skeleton: &Skeleton, index: usize, root: Mat4) -> Mat4 {
        match skeleton.parent(index) {
            Some(parent) => self.world[parent],
            None => root,
        }
    }

    /// 从所有根骨骼向下合成世界矩阵
    ///
    /// 无法到达的骨骼保持绑定姿态（世界矩阵等于 `root`）。
    pub fn compose(&mut self, skeleton: &Skeleton, root: Mat4) {
        self.world.fill(root);
        for &index in skeleton.order() {
            if index >= self.local.len() {
                continue;
            }
            self.world[index] = self.parent_world(skeleton, index, root) * self.local[index];
        }
    }

    /// 重新合成 `index` 及其子树的世界矩阵
    pub fn propagate_from(&mut self, skeleton: &Skeleton, index: usize, root: Mat4) {
        if index >= self.local.len() || !skeleton.bone(index).map_or(false, |b| b.reachable) {
            return;
        }
        for i in skeleton.subtree(index) {
            self.world[i] = self.parent_world(skeleton, i, root) * self.local[i];
        }
    }

    /// 在世界空间中绕 `pivot` 旋转骨骼，回写本地矩阵并更新子树
    pub fn rotate_about(
        &mut self,
        skeleton: &Skeleton,
        index: usize,
        pivot: Vec3,
        rotation: Quat,
        root: Mat4,
    ) {
        if index >= self.local.len() {
            return;
        }
        let correction = Mat4::from_translation(pivot)
            * Mat4::from_quat(rotation)
            * Mat4::from_translation(-pivot);
        let new_world = correction * self.world[index];
        let parent_world = self.parent_world(skeleton, index, root);
        self.local[index] = parent_world.inverse() * new_world;
        self.propagate_from(skeleton, index, root);
    }
}

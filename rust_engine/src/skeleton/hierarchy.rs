//! 骨骼层级

use std::collections::HashMap;

use crate::format::PmdBone;
use crate::DataIntegrityWarning;

use super::Bone;

/// 骨骼层级
///
/// 扁平骨骼数组 + 名称索引 + 父→子邻接表。`order` 为父先子后的遍历顺序。
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    name_to_index: HashMap<String, usize>,
    /// 动作文件中的（可能被截断的）骨骼名 -> 索引
    motion_name_to_index: HashMap<String, usize>,
    roots: Vec<usize>,
    order: Vec<usize>,
}

impl Skeleton {
    /// 从 PMD 骨骼表构建层级
    pub fn build(pmd_bones: &[PmdBone]) -> (Self, Vec<DataIntegrityWarning>) {
        let count = pmd_bones.len();
        let mut bones: Vec<Bone> = pmd_bones
            .iter()
            .enumerate()
            .map(|(i, b)| Bone::from_pmd_bone(i, b, count))
            .collect();

        let mut name_to_index = HashMap::with_capacity(count);
        let mut motion_name_to_index = HashMap::with_capacity(count);
        for bone in &bones {
            // 同名骨骼保留第一个
            name_to_index.entry(bone.name.clone()).or_insert(bone.index);
            motion_name_to_index
                .entry(bone.motion_name.clone())
                .or_insert(bone.index);
        }

        let mut roots = Vec::new();
        for i in 0..count {
            let parent = bones[i].parent;
            match parent {
                Some(parent) => bones[parent].children.push(i),
                None => roots.push(i),
            }
        }

        // 显式栈深度优先，父骨骼一定先于子骨骼入序
        let mut order = Vec::with_capacity(count);
        let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            if bones[index].reachable {
                continue;
            }
            bones[index].reachable = true;
            order.push(index);
            stack.extend(bones[index].children.iter().rev().copied());
        }

        let warnings: Vec<DataIntegrityWarning> = bones
            .iter()
            .filter(|b| !b.reachable)
            .map(|b| DataIntegrityWarning::UnreachableBone {
                index: b.index,
                name: b.name.clone(),
            })
            .collect();
        for warning in &warnings {
            log::warn!("{}", warning);
        }

        (
            Self {
                bones,
                name_to_index,
                motion_name_to_index,
                roots,
                order,
            },
            warnings,
        )
    }

    /// 通过名称查找骨骼
    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// 按动作轨道名查找骨骼：先精确匹配，再匹配截断后的骨骼名
    pub fn find_bone_by_motion_name(&self, name: &str) -> Option<usize> {
        self.find_bone_by_name(name)
            .or_else(|| self.motion_name_to_index.get(name).copied())
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// 父先子后的遍历顺序（仅包含可到达的骨骼）
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.bones.get(index).and_then(|b| b.parent)
    }

    pub fn children(&self, index: usize) -> &[usize] {
        self.bones
            .get(index)
            .map(|b| b.children.as_slice())
            .unwrap_or(&[])
    }

    /// 以 `index` 为根的子树，父先子后
    pub fn subtree(&self, index: usize) -> Vec<usize> {
        let mut result = Vec::new();
        if index >= self.bones.len() {
            return result;
        }
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            result.push(i);
            stack.extend(self.bones[i].children.iter().rev().copied());
            // 成环的数据不会出现在可到达子树里，这里限制一下遍历长度
            if result.len() > self.bones.len() {
                break;
            }
        }
        result
    }
}

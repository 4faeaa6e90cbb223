//! 子网格定义

use super::Material;

/// 子网格：一个材质对应的连续索引范围
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubMesh {
    pub begin_index: u32,
    pub index_count: u32,
    pub material_id: usize,
}

impl SubMesh {
    pub fn new(begin_index: u32, index_count: u32, material_id: usize) -> Self {
        Self { begin_index, index_count, material_id }
    }

    pub fn end_index(&self) -> u32 {
        self.begin_index + self.index_count
    }
}

/// 按材质顺序切分索引范围
///
/// 材质声明的索引数超出索引总数时截断到末尾。
pub fn build_submeshes(materials: &[Material], total_indices: usize) -> Vec<SubMesh> {
    let total = total_indices as u64;
    let mut begin = 0u64;
    materials
        .iter()
        .enumerate()
        .map(|(id, material)| {
            let end = (begin + material.index_count as u64).min(total);
            let submesh = SubMesh::new(begin as u32, (end - begin) as u32, id);
            begin = end;
            submesh
        })
        .collect()
}

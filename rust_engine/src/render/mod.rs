//! 渲染适配层
//!
//! 图形设备、命令队列和着色器不在本 crate 内。调用方实现 [`RenderAdapter`]，
//! 显式传给角色的绘制方法；核心不访问任何全局设备对象。

use glam::Mat4;

use crate::model::SubMesh;
use crate::Result;

/// 渲染后端接口
///
/// 每帧先收到一次调色板，再按材质顺序收到每个子网格的绘制请求。
/// 后端失败应返回 [`crate::MmdError::ResourceCreation`]。
pub trait RenderAdapter {
    /// 上传矩阵调色板：槽 0 为角色整体变换，之后每根骨骼一项
    fn upload_palette(&mut self, palette: &[Mat4]) -> Result<()>;

    /// 绘制一个材质对应的索引范围
    fn draw_indexed(&mut self, submesh: &SubMesh) -> Result<()>;
}

/// 只记录调用的后端，用于无窗口运行
#[derive(Debug, Default)]
pub struct HeadlessAdapter {
    pub frames: u64,
    pub draw_calls: u64,
    pub last_palette_len: usize,
}

impl RenderAdapter for HeadlessAdapter {
    fn upload_palette(&mut self, palette: &[Mat4]) -> Result<()> {
        self.frames += 1;
        self.last_palette_len = palette.len();
        log::trace!("frame {}: palette of {} matrices", self.frames, palette.len());
        Ok(())
    }

    fn draw_indexed(&mut self, submesh: &SubMesh) -> Result<()> {
        self.draw_calls += 1;
        log::trace!(
            "draw material {}: indices {}..{}",
            submesh.material_id,
            submesh.begin_index,
            submesh.end_index()
        );
        Ok(())
    }
}

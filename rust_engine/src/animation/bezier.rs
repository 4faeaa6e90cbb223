//! 贝塞尔曲线插值

/// VMD 插值参数的取值上限
const VMD_CONTROL_MAX: f32 = 127.0;

/// 贝塞尔曲线（用于 VMD 动画插值）
///
/// 端点固定为 (0,0) 和 (1,1)，只保存两个控制点。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierCurve {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl BezierCurve {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 线性插值（MMD 默认控制点 20/107）
    pub fn linear() -> Self {
        Self::from_vmd_data(&[20, 20, 107, 107])
    }

    /// 从 VMD 插值数据创建，顺序为 x1, y1, x2, y2
    pub fn from_vmd_data(data: &[u8; 4]) -> Self {
        Self {
            x1: data[0] as f32 / VMD_CONTROL_MAX,
            y1: data[1] as f32 / VMD_CONTROL_MAX,
            x2: data[2] as f32 / VMD_CONTROL_MAX,
            y2: data[3] as f32 / VMD_CONTROL_MAX,
        }
    }

    /// 从 64 字节插值块中取出一条曲线
    ///
    /// `channel`：0 = X，1 = Y，2 = Z，3 = 旋转。每条曲线的四个值间隔 4 字节。
    pub fn from_vmd_block(block: &[u8; 64], channel: usize) -> Self {
        let c = channel.min(3);
        Self::from_vmd_data(&[block[c], block[c + 4], block[c + 8], block[c + 12]])
    }

    pub fn is_linear(&self) -> bool {
        self.x1 == self.y1 && self.x2 == self.y2
    }

    /// 评估贝塞尔曲线
    ///
    /// 用固定次数的二分法求解 x(s) = t，再返回 y(s)。
    /// 纯函数，同样的输入总是得到同样的结果。
    pub fn evaluate(&self, t: f32, iterations: u32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        if self.is_linear() {
            return t;
        }

        let mut lo = 0.0f32;
        let mut hi = 1.0f32;
        let mut s = t;
        for _ in 0..iterations {
            s = (lo + hi) * 0.5;
            if self.bezier_x(s) < t {
                lo = s;
            } else {
                hi = s;
            }
        }

        self.bezier_y(s)
    }

    fn bezier_x(&self, s: f32) -> f32 {
        cubic(self.x1, self.x2, s)
    }

    fn bezier_y(&self, s: f32) -> f32 {
        cubic(self.y1, self.y2, s)
    }
}

/// 端点为 0 和 1 的三次贝塞尔分量
fn cubic(p1: f32, p2: f32, s: f32) -> f32 {
    let r = 1.0 - s;
    3.0 * r * r * s * p1 + 3.0 * r * s * s * p2 + s * s * s
}

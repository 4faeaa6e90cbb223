//! 动画系统
//!
//! 提供 VMD 关键帧存储、贝塞尔缓动插值和每帧姿态求值。

mod animator;
mod bezier;
mod keyframe;
mod motion;

pub use animator::{Animator, PlaybackState};
pub use bezier::BezierCurve;
pub use keyframe::{BoneKeyframe, IkEnableWindow};
pub use motion::Motion;

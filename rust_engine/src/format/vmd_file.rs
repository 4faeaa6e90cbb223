//! VMD 文件解析
//!
//! 解析骨骼关键帧与 IK 启用帧；表情、相机、光照、阴影段只做长度校验后跳过。
//! 较老的 VMD 在某个段落边界处直接结束，这种情况视为后续段落不存在。

use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};

use crate::{MmdError, Result};

use super::reader::{truncate_shift_jis, ByteReader};

/// VMD 文件头
const VMD_HEADER_V1: &[u8] = b"Vocaloid Motion Data file";
const VMD_HEADER_V2: &[u8] = b"Vocaloid Motion Data 0002";

/// 魔数 30 字节 + 模型名 20 字节
pub const HEADER_SIZE: usize = 50;
pub const BONE_FRAME_SIZE: usize = 111;
/// 骨骼关键帧中的骨骼名字段，比 PMD 骨骼名短
pub const BONE_NAME_SIZE: usize = 15;
const MORPH_FRAME_SIZE: usize = 23;
const CAMERA_FRAME_SIZE: usize = 61;
const LIGHT_FRAME_SIZE: usize = 28;
const SHADOW_FRAME_SIZE: usize = 9;
/// IK 帧固定部分：帧号 + 显示标志 + 条目数
const IK_FRAME_HEADER_SIZE: usize = 9;
const IK_ENTRY_SIZE: usize = 21;

/// 骨骼关键帧记录（111 字节）
#[derive(Clone, Debug, PartialEq)]
pub struct VmdBoneFrame {
    pub bone_name: String,
    pub frame: u32,
    pub position: Vec3,
    pub rotation: Quat,
    /// [4][4][4] 贝塞尔插值参数
    pub interpolation: [u8; 64],
}

/// IK 启用帧
#[derive(Clone, Debug, PartialEq)]
pub struct VmdIkFrame {
    pub frame: u32,
    pub show: bool,
    /// (IK 骨骼名, 是否启用)
    pub entries: Vec<(String, bool)>,
}

/// VMD 文件数据
#[derive(Clone, Debug, PartialEq)]
pub struct VmdFile {
    pub model_name: String,
    pub bone_frames: Vec<VmdBoneFrame>,
    pub ik_frames: Vec<VmdIkFrame>,
}

impl VmdFile {
    /// 从文件加载 VMD
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref()).map_err(MmdError::Io)?;
        Self::parse(&bytes)
    }

    /// 解析 VMD 数据
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.read_bytes(30, "VMD header")?;
        if magic[..25] != VMD_HEADER_V1[..] && magic[..25] != VMD_HEADER_V2[..] {
            return Err(MmdError::Format("invalid VMD header".to_string()));
        }
        let model_name = reader.read_fixed_string(20, "VMD model name")?;

        let bone_count = reader.read_u32("bone keyframe count")? as usize;
        reader.ensure_records(bone_count, BONE_FRAME_SIZE, "bone keyframe")?;
        let mut bone_frames = Vec::with_capacity(bone_count);
        for _ in 0..bone_count {
            bone_frames.push(read_bone_frame(&mut reader)?);
        }

        let mut ik_frames = Vec::new();
        // 表情 / 相机 / 光照 / 阴影段只跳过
        let skipped = [
            ("morph keyframe", MORPH_FRAME_SIZE),
            ("camera keyframe", CAMERA_FRAME_SIZE),
            ("light keyframe", LIGHT_FRAME_SIZE),
            ("shadow keyframe", SHADOW_FRAME_SIZE),
        ];
        let mut complete = true;
        for (what, stride) in skipped {
            if reader.is_at_end() {
                complete = false;
                break;
            }
            let count = reader.read_u32(what)? as usize;
            reader.ensure_records(count, stride, what)?;
            reader.skip(count * stride, what)?;
            log::debug!("VMD 跳过 {} 条 {}", count, what);
        }

        if complete && !reader.is_at_end() {
            let ik_count = reader.read_u32("IK frame count")? as usize;
            reader.ensure_records(ik_count, IK_FRAME_HEADER_SIZE, "IK frame")?;
            ik_frames.reserve(ik_count);
            for _ in 0..ik_count {
                ik_frames.push(read_ik_frame(&mut reader)?);
            }
        }

        log::debug!(
            "VMD 解析完成: {} 骨骼关键帧, {} IK 帧",
            bone_frames.len(),
            ik_frames.len()
        );

        Ok(Self {
            model_name,
            bone_frames,
            ik_frames,
        })
    }
}

/// 骨骼名写入 VMD 骨骼关键帧后读回的名称
pub fn motion_bone_name(name: &str) -> String {
    truncate_shift_jis(name, BONE_NAME_SIZE)
}

/// 读取骨骼关键帧
fn read_bone_frame(reader: &mut ByteReader) -> Result<VmdBoneFrame> {
    Ok(VmdBoneFrame {
        bone_name: reader.read_fixed_string(BONE_NAME_SIZE, "bone name")?,
        frame: reader.read_u32("frame index")?,
        position: reader.read_vec3("translation")?,
        rotation: reader.read_quat("rotation")?,
        interpolation: reader.read_array::<64>("interpolation")?,
    })
}

/// 读取 IK 帧
/// 每个 IK 帧包含帧索引、显示标志和多个 IK 信息
fn read_ik_frame(reader: &mut ByteReader) -> Result<VmdIkFrame> {
    let frame = reader.read_u32("IK frame index")?;
    let show = reader.read_u8("IK show flag")? != 0;
    let count = reader.read_u32("IK info count")? as usize;
    reader.ensure_records(count, IK_ENTRY_SIZE, "IK info")?;

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let name = reader.read_fixed_string(20, "IK name")?;
        let enabled = reader.read_u8("IK enable flag")? != 0;
        entries.push((name, enabled));
    }

    Ok(VmdIkFrame {
        frame,
        show,
        entries,
    })
}

//! 测试用的 PMD / VMD 合成文件

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use glam::{Quat, Vec2, Vec3};
use mmd_viewer::format::{
    PmdBone, PmdFile, PmdHeader, PmdIk, PmdMaterial, PmdVertex, VmdBoneFrame, VmdIkFrame, NO_BONE,
};

/// 定长 Shift-JIS 字段，不足补 0
fn write_fixed(out: &mut Vec<u8>, text: &str, len: usize) {
    let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(text);
    let mut field = vec![0u8; len];
    let n = encoded.len().min(len);
    field[..n].copy_from_slice(&encoded[..n]);
    out.write_all(&field).unwrap();
}

fn write_vec3(out: &mut Vec<u8>, v: Vec3) {
    for c in v.to_array() {
        out.write_f32::<LittleEndian>(c).unwrap();
    }
}

/// 序列化 PMD（只写运行时读取的段落）
pub fn write_pmd(pmd: &PmdFile) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_all(b"Pmd").unwrap();
    out.write_f32::<LittleEndian>(pmd.header.version).unwrap();
    write_fixed(&mut out, &pmd.header.model_name, 20);
    write_fixed(&mut out, &pmd.header.comment, 256);

    out.write_u32::<LittleEndian>(pmd.vertices.len() as u32).unwrap();
    for v in &pmd.vertices {
        write_vec3(&mut out, v.position);
        write_vec3(&mut out, v.normal);
        out.write_f32::<LittleEndian>(v.uv.x).unwrap();
        out.write_f32::<LittleEndian>(v.uv.y).unwrap();
        out.write_u16::<LittleEndian>(v.bone_indices[0]).unwrap();
        out.write_u16::<LittleEndian>(v.bone_indices[1]).unwrap();
        out.write_u8(v.bone_weight).unwrap();
        out.write_u8(v.edge_flag).unwrap();
    }

    out.write_u32::<LittleEndian>(pmd.indices.len() as u32).unwrap();
    for &i in &pmd.indices {
        out.write_u16::<LittleEndian>(i).unwrap();
    }

    out.write_u32::<LittleEndian>(pmd.materials.len() as u32).unwrap();
    for m in &pmd.materials {
        write_vec3(&mut out, m.diffuse);
        out.write_f32::<LittleEndian>(m.alpha).unwrap();
        out.write_f32::<LittleEndian>(m.specularity).unwrap();
        write_vec3(&mut out, m.specular);
        write_vec3(&mut out, m.ambient);
        out.write_u8(m.toon_index).unwrap();
        out.write_u8(m.edge_flag).unwrap();
        out.write_u32::<LittleEndian>(m.index_count).unwrap();
        write_fixed(&mut out, &m.texture_path, 20);
    }

    out.write_u16::<LittleEndian>(pmd.bones.len() as u16).unwrap();
    for b in &pmd.bones {
        write_fixed(&mut out, &b.name, 20);
        out.write_u16::<LittleEndian>(b.parent).unwrap();
        out.write_u16::<LittleEndian>(b.tail).unwrap();
        out.write_u8(b.kind).unwrap();
        out.write_u16::<LittleEndian>(b.ik_bone).unwrap();
        write_vec3(&mut out, b.position);
    }

    out.write_u16::<LittleEndian>(pmd.iks.len() as u16).unwrap();
    for ik in &pmd.iks {
        out.write_u16::<LittleEndian>(ik.ik_bone).unwrap();
        out.write_u16::<LittleEndian>(ik.target_bone).unwrap();
        out.write_u8(ik.chain.len() as u8).unwrap();
        out.write_u16::<LittleEndian>(ik.iterations).unwrap();
        out.write_f32::<LittleEndian>(ik.limit_angle).unwrap();
        for &c in &ik.chain {
            out.write_u16::<LittleEndian>(c).unwrap();
        }
    }
    out
}

/// 序列化 VMD；有 IK 帧时写出中间的空段落
pub fn write_vmd(model_name: &str, bone_frames: &[VmdBoneFrame], ik_frames: &[VmdIkFrame]) -> Vec<u8> {
    let mut out = Vec::new();
    write_fixed(&mut out, "Vocaloid Motion Data 0002", 30);
    write_fixed(&mut out, model_name, 20);

    out.write_u32::<LittleEndian>(bone_frames.len() as u32).unwrap();
    for f in bone_frames {
        write_fixed(&mut out, &f.bone_name, 15);
        out.write_u32::<LittleEndian>(f.frame).unwrap();
        write_vec3(&mut out, f.position);
        for c in f.rotation.to_array() {
            out.write_f32::<LittleEndian>(c).unwrap();
        }
        out.write_all(&f.interpolation).unwrap();
    }

    if ik_frames.is_empty() {
        return out;
    }

    // 表情、相机、光照、阴影段为空
    for _ in 0..4 {
        out.write_u32::<LittleEndian>(0).unwrap();
    }
    out.write_u32::<LittleEndian>(ik_frames.len() as u32).unwrap();
    for f in ik_frames {
        out.write_u32::<LittleEndian>(f.frame).unwrap();
        out.write_u8(f.show as u8).unwrap();
        out.write_u32::<LittleEndian>(f.entries.len() as u32).unwrap();
        for (name, enabled) in &f.entries {
            write_fixed(&mut out, name, 20);
            out.write_u8(*enabled as u8).unwrap();
        }
    }
    out
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn vertex(index: u16) -> PmdVertex {
    let f = index as f32;
    PmdVertex {
        position: Vec3::new(f, f * 2.0, -f),
        normal: Vec3::Y,
        uv: Vec2::new(f * 0.25, 1.0 - f * 0.25),
        bone_indices: [index % 3, (index + 1) % 3],
        bone_weight: 100 - index as u8,
        edge_flag: (index % 2) as u8,
    }
}

pub fn material(index_count: u32, texture_path: &str, toon_index: u8) -> PmdMaterial {
    PmdMaterial {
        diffuse: Vec3::new(0.8, 0.7, 0.6),
        alpha: 1.0,
        specularity: 10.0,
        specular: Vec3::splat(0.1),
        ambient: Vec3::splat(0.4),
        toon_index,
        edge_flag: 1,
        index_count,
        texture_path: texture_path.to_string(),
    }
}

pub fn bone(name: &str, parent: u16, position: Vec3) -> PmdBone {
    PmdBone {
        name: name.to_string(),
        parent,
        tail: NO_BONE,
        kind: 0,
        ik_bone: 0,
        position,
    }
}

/// 左臂 IK 模型：センター → 左腕 (0,10,0) → 左ひじ (0,8,0) → 左手首 (0,6,0)，
/// IK 骨骼 leftArmIK 位于 (1.5,7,0)
pub fn left_arm_model() -> PmdFile {
    PmdFile {
        header: PmdHeader {
            version: 1.0,
            model_name: "腕テスト".to_string(),
            comment: "fixture".to_string(),
        },
        vertices: (0..4).map(vertex).collect(),
        indices: vec![0, 1, 2, 1, 2, 3],
        materials: vec![material(3, "", 0xff), material(3, "", 0xff)],
        bones: vec![
            bone("センター", NO_BONE, Vec3::ZERO),
            bone("左腕", 0, Vec3::new(0.0, 10.0, 0.0)),
            bone("左ひじ", 1, Vec3::new(0.0, 8.0, 0.0)),
            bone("左手首", 2, Vec3::new(0.0, 6.0, 0.0)),
            bone("leftArmIK", NO_BONE, Vec3::new(1.5, 7.0, 0.0)),
        ],
        iks: vec![PmdIk {
            ik_bone: 4,
            target_bone: 3,
            iterations: 40,
            limit_angle: 0.5,
            chain: vec![2, 1],
        }],
    }
}

pub fn bone_frame(name: &str, frame: u32, rotation: Quat) -> VmdBoneFrame {
    VmdBoneFrame {
        bone_name: name.to_string(),
        frame,
        position: Vec3::ZERO,
        rotation,
        interpolation: [20u8; 64],
    }
}

pub fn ik_frame(frame: u32, name: &str, enabled: bool) -> VmdIkFrame {
    VmdIkFrame {
        frame,
        show: true,
        entries: vec![(name.to_string(), enabled)],
    }
}

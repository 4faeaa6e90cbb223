mod common;

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{Mat4, Quat, Vec3};
use mmd_viewer::format::VmdFile;
use mmd_viewer::model::SubMesh;
use mmd_viewer::{
    Actor, AnimationConfig, DataIntegrityWarning, MmdError, Motion, PlaybackState, PmdModel,
    RenderAdapter, Result,
};

use common::*;

fn arm_actor() -> Actor {
    let model = PmdModel::from_pmd(left_arm_model(), Default::default(), &AnimationConfig::default());
    Actor::new(Arc::new(model), AnimationConfig::default())
}

fn wrist_position(actor: &Actor) -> Vec3 {
    // 调色板槽 0 是角色变换，骨骼从槽 1 开始
    actor.palette()[1 + 3].transform_point3(Vec3::new(0.0, 6.0, 0.0))
}

#[derive(Debug, PartialEq)]
enum Call {
    Palette(usize),
    Draw(SubMesh),
}

#[derive(Default)]
struct RecordingAdapter {
    calls: Vec<Call>,
    palette_root: Option<Mat4>,
}

impl RenderAdapter for RecordingAdapter {
    fn upload_palette(&mut self, palette: &[Mat4]) -> Result<()> {
        self.palette_root = palette.first().copied();
        self.calls.push(Call::Palette(palette.len()));
        Ok(())
    }

    fn draw_indexed(&mut self, submesh: &SubMesh) -> Result<()> {
        self.calls.push(Call::Draw(submesh.clone()));
        Ok(())
    }
}

struct FailingAdapter;

impl RenderAdapter for FailingAdapter {
    fn upload_palette(&mut self, _palette: &[Mat4]) -> Result<()> {
        Err(MmdError::ResourceCreation("upload buffer unavailable".to_string()))
    }

    fn draw_indexed(&mut self, _submesh: &SubMesh) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_ik_enable_windows_from_motion_file() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = write_vmd(
        "腕テスト",
        &[],
        &[ik_frame(0, "leftArmIK", false), ik_frame(30, "leftArmIK", true)],
    );
    let path = write_file(dir.path(), "ik.vmd", &bytes);

    let mut actor = arm_actor();
    let unmatched = actor.load_motion(&path).unwrap();
    assert!(unmatched.is_empty());

    actor.evaluate_frame(15.0);
    assert!(wrist_position(&actor).abs_diff_eq(Vec3::new(0.0, 6.0, 0.0), 1e-5));

    actor.evaluate_frame(45.0);
    let wrist = wrist_position(&actor);
    assert!(wrist.abs_diff_eq(Vec3::new(1.5, 7.0, 0.0), 1e-3), "{:?}", wrist);
}

#[test]
fn test_keyframes_from_motion_file_drive_pose() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = write_vmd(
        "腕テスト",
        &[
            bone_frame("左腕", 0, Quat::IDENTITY),
            bone_frame("左腕", 10, Quat::from_rotation_z(FRAC_PI_2)),
            bone_frame("尻尾", 0, Quat::IDENTITY),
        ],
        &[ik_frame(0, "leftArmIK", false)],
    );
    let path = write_file(dir.path(), "arm.vmd", &bytes);

    let vmd = VmdFile::load(&path).unwrap();
    assert_eq!(vmd.bone_frames.len(), 3);
    assert_eq!(vmd.ik_frames.len(), 1);

    let mut actor = arm_actor();
    let unmatched = actor.load_motion(&path).unwrap();
    assert_eq!(
        unmatched,
        vec![DataIntegrityWarning::UnknownMotionBone {
            name: "尻尾".to_string()
        }]
    );

    // 第 10 帧肩转 90 度，肘到 (2,10,0)
    let palette = actor.evaluate_frame(10.0).to_vec();
    let elbow = palette[1 + 2].transform_point3(Vec3::new(0.0, 8.0, 0.0));
    assert!(elbow.abs_diff_eq(Vec3::new(2.0, 10.0, 0.0), 1e-4), "{:?}", elbow);

    // 线性曲线的中点
    let palette = actor.evaluate_frame(5.0).to_vec();
    let elbow = palette[1 + 2].transform_point3(Vec3::new(0.0, 8.0, 0.0));
    let expected = Vec3::new(0.0, 10.0, 0.0)
        + Quat::from_rotation_z(FRAC_PI_2 * 0.5) * Vec3::new(0.0, -2.0, 0.0);
    assert!(elbow.abs_diff_eq(expected, 1e-3), "{:?}", elbow);
}

#[test]
fn test_long_bone_name_matches_truncated_motion_track() {
    // 16 字节的骨骼名，写入 VMD 时被截断到 15 字节
    let long_name = "左腕捩ダミー補助";
    let mut pmd = left_arm_model();
    pmd.bones.push(bone(long_name, 0, Vec3::new(0.0, 9.0, 0.0)));
    let model = PmdModel::from_pmd(pmd, Default::default(), &AnimationConfig::default());
    let mut actor = Actor::new(Arc::new(model), AnimationConfig::default());

    let dir = tempfile::tempdir().unwrap();
    let bytes = write_vmd(
        "腕テスト",
        &[bone_frame(long_name, 0, Quat::from_rotation_z(FRAC_PI_2))],
        &[],
    );
    let path = write_file(dir.path(), "twist.vmd", &bytes);

    let vmd = VmdFile::load(&path).unwrap();
    assert_ne!(vmd.bone_frames[0].bone_name, long_name);

    let unmatched = actor.load_motion(&path).unwrap();
    assert!(unmatched.is_empty(), "{:?}", unmatched);

    let palette = actor.evaluate_frame(0.0).to_vec();
    assert_ne!(palette[1 + 5], Mat4::IDENTITY);
    // 绕 (0,9,0) 转 90 度
    let moved = palette[1 + 5].transform_point3(Vec3::new(0.0, 8.0, 0.0));
    assert!(moved.abs_diff_eq(Vec3::new(1.0, 9.0, 0.0), 1e-4), "{:?}", moved);
}

#[test]
fn test_failed_motion_load_keeps_actor_usable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "bad.vmd", b"not a motion file at all, definitely not");

    let mut actor = arm_actor();
    assert!(matches!(actor.load_motion(&path), Err(MmdError::Format(_))));
    assert!(actor.animator().motion().is_none());

    actor.start(Instant::now());
    assert_eq!(actor.playback_state(), PlaybackState::Stopped);
    let palette = actor.update(Instant::now());
    assert!(palette[1..].iter().all(|m| *m == Mat4::IDENTITY));
}

#[test]
fn test_draw_uploads_palette_then_each_material() {
    let mut actor = arm_actor();
    actor.rotate_y(0.03);
    actor.update(Instant::now());

    let mut adapter = RecordingAdapter::default();
    actor.draw(&mut adapter).unwrap();

    assert_eq!(
        adapter.calls,
        vec![
            Call::Palette(6),
            Call::Draw(SubMesh::new(0, 3, 0)),
            Call::Draw(SubMesh::new(3, 3, 1)),
        ]
    );
    assert_eq!(adapter.palette_root, Some(Mat4::from_rotation_y(0.03)));
}

#[test]
fn test_adapter_failure_is_resource_creation_error() {
    let actor = arm_actor();
    let result = actor.draw(&mut FailingAdapter);
    assert!(matches!(result, Err(MmdError::ResourceCreation(_))));
}

#[test]
fn test_cloned_actors_share_model_but_not_pose() {
    let mut motion = Motion::new();
    motion.insert_bone_keyframe(
        "左腕",
        mmd_viewer::animation::BoneKeyframe::new(0).with_rotation(Quat::from_rotation_z(1.0)),
    );

    let mut first = arm_actor();
    let mut second = first.clone();
    assert!(Arc::ptr_eq(first.model(), second.model()));

    first.set_motion(Arc::new(motion));
    first.evaluate_frame(0.0);
    second.evaluate_frame(0.0);

    assert_ne!(first.palette()[1 + 1], Mat4::IDENTITY);
    assert_eq!(second.palette()[1 + 1], Mat4::IDENTITY);
}

#[test]
fn test_playing_clock_advances_frames() {
    let mut actor = arm_actor();
    let mut motion = Motion::new();
    motion.insert_bone_keyframe("左腕", mmd_viewer::animation::BoneKeyframe::new(0));
    motion.insert_bone_keyframe(
        "左腕",
        mmd_viewer::animation::BoneKeyframe::new(60).with_rotation(Quat::from_rotation_z(FRAC_PI_2)),
    );
    actor.set_motion(Arc::new(motion));

    let start = Instant::now();
    actor.start(start);
    assert!(matches!(actor.playback_state(), PlaybackState::Playing { .. }));

    // 2 秒 = 60 帧，落在最后一个关键帧上
    let at_end = actor.update(start + Duration::from_secs(2)).to_vec();
    let elbow = at_end[1 + 2].transform_point3(Vec3::new(0.0, 8.0, 0.0));
    // 循环策略下第 60 帧回到第 0 帧
    assert!(elbow.abs_diff_eq(Vec3::new(0.0, 8.0, 0.0), 1e-4), "{:?}", elbow);

    let halfway = actor.update(start + Duration::from_secs(1)).to_vec();
    let elbow = halfway[1 + 2].transform_point3(Vec3::new(0.0, 8.0, 0.0));
    assert!(elbow.x > 0.5 && elbow.y > 8.0, "{:?}", elbow);
}

//! 无窗口运行：加载模型和动作，按帧更新姿态并提交给记录型后端

use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use mmd_viewer::render::HeadlessAdapter;
use mmd_viewer::{Actor, AnimationConfig, TextureCache};

const MODEL_PATH: &str = "Model/初音ミク.pmd";
const MOTION_PATH: &str = "Motion/motion.vmd";
const FRAME_COUNT: u32 = 180;
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);
/// 每帧绕 Y 轴旋转（弧度）
const SPIN_PER_FRAME: f32 = 0.03;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AnimationConfig::default();
    let mut actor = match Actor::load(MODEL_PATH, config) {
        Ok(actor) => actor,
        Err(e) => {
            log::error!("Failed to load model '{}': {}", MODEL_PATH, e);
            return ExitCode::FAILURE;
        }
    };

    let mut cache = TextureCache::new();
    let textures = actor.model().load_textures(&mut cache);
    log::info!(
        "{} materials, {} distinct texture files, {} warnings",
        textures.len(),
        cache.len(),
        cache.warnings().len() + actor.model().warnings.len()
    );

    match actor.load_motion(MOTION_PATH) {
        Ok(unmatched) if !unmatched.is_empty() => {
            log::info!("{} motion tracks do not match any bone", unmatched.len());
        }
        Ok(_) => {}
        Err(e) => log::error!("Failed to load motion '{}': {}; showing bind pose", MOTION_PATH, e),
    }

    let mut adapter = HeadlessAdapter::default();
    actor.start(Instant::now());

    let mut slowest = Duration::ZERO;
    for frame in 0..FRAME_COUNT {
        let begin = Instant::now();
        actor.rotate_y(SPIN_PER_FRAME);
        actor.update(begin);
        if let Err(e) = actor.draw(&mut adapter) {
            log::error!("Frame {} failed: {}", frame, e);
            return ExitCode::FAILURE;
        }
        let spent = begin.elapsed();
        slowest = slowest.max(spent);
        log::debug!("frame {} evaluated in {:?}", frame, spent);

        if let Some(rest) = FRAME_INTERVAL.checked_sub(spent) {
            thread::sleep(rest);
        }
    }

    log::info!(
        "{} frames, {} draw calls, palette of {} matrices, slowest frame {:?}",
        adapter.frames,
        adapter.draw_calls,
        adapter.last_palette_len,
        slowest
    );
    ExitCode::SUCCESS
}

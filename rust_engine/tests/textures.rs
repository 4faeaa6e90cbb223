mod common;

use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use mmd_viewer::texture::{load_texture, Texture};
use mmd_viewer::{AnimationConfig, DataIntegrityWarning, PmdModel, TextureCache};

use common::*;

fn checker(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 128])
        }
    })
}

#[test]
fn test_generic_loader_reads_png_and_sphere_map() {
    let dir = tempfile::tempdir().unwrap();
    checker(8, 4).save(dir.path().join("face.png")).unwrap();
    // .sph 实际是 BMP，按内容识别
    checker(2, 2)
        .save_with_format(dir.path().join("metal.sph"), ImageFormat::Bmp)
        .unwrap();

    let face = load_texture(dir.path().join("face.png")).unwrap().unwrap();
    assert_eq!((face.width, face.height), (8, 4));
    assert!(face.has_transparency());
    assert_eq!(face.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(face.pixel(1, 0), Some([0, 0, 255, 128]));

    let sphere = load_texture(dir.path().join("metal.sph")).unwrap().unwrap();
    assert_eq!((sphere.width, sphere.height), (2, 2));
    assert_eq!(sphere.byte_count(), 2 * 2 * 4);
}

#[test]
fn test_model_textures_resolve_with_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    checker(4, 4).save(dir.path().join("body.png")).unwrap();

    let mut pmd = left_arm_model();
    pmd.materials = vec![
        material(3, "body.png", 0),
        material(3, "body.png*gone.spa", 0xff),
    ];
    let path = write_file(dir.path(), "model.pmd", &write_pmd(&pmd));
    let config = AnimationConfig::default().with_toon_directory(dir.path().join("toon"));
    let model = PmdModel::load(&path, &config).unwrap();

    let mut cache = TextureCache::new();
    let sets = model.load_textures(&mut cache);
    assert_eq!(sets.len(), 2);

    // 同一路径只加载一次
    assert!(Arc::ptr_eq(&sets[0].base, &sets[1].base));
    assert_eq!(sets[0].base.width, 4);

    assert_eq!(*sets[0].sphere, Texture::white());
    assert_eq!(*sets[0].additive, Texture::black());
    // toon01.bmp 不存在，使用灰度渐变
    assert_eq!(*sets[0].toon, Texture::gray_gradient());
    // 第二个材质不使用 toon
    assert_eq!(*sets[1].toon, Texture::gray_gradient());
    assert_eq!(*sets[1].additive, Texture::black());

    // body.png、toon01.bmp、gone.spa
    assert_eq!(cache.len(), 3);
    let missing: Vec<&DataIntegrityWarning> = cache
        .warnings()
        .iter()
        .filter(|w| matches!(w, DataIntegrityWarning::MissingTexture { .. }))
        .collect();
    assert_eq!(missing.len(), 2);
}

#[test]
fn test_unsupported_extension_falls_back_without_reading() {
    let dir = tempfile::tempdir().unwrap();
    let mut pmd = left_arm_model();
    pmd.materials = vec![material(6, "skin.psd", 0xff)];
    pmd.indices = vec![0, 1, 2, 1, 2, 3];
    let path = write_file(dir.path(), "model.pmd", &write_pmd(&pmd));
    let model = PmdModel::load(&path, &AnimationConfig::default()).unwrap();

    let mut cache = TextureCache::new();
    let sets = model.load_textures(&mut cache);
    assert_eq!(*sets[0].base, Texture::white());
    assert!(matches!(
        cache.warnings(),
        [DataIntegrityWarning::UnsupportedTextureExtension { .. }]
    ));
}

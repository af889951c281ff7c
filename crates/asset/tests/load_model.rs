//! End-to-end loading of real files through the threaded loader.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use asset::texture::TextureFormat;
use asset::{AssetClass, AssetStatus, ModelSource, load_model};
use ddsfile::{AlphaMode, D3D10ResourceDimension, Dds, DxgiFormat, NewDxgiParams};

const CUBE_OBJ: &str = "\
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 5/1 6/2 7/3 8/4
f 2/1 1/2 4/3 3/4
f 4/1 8/2 7/3 3/4
f 1/1 2/2 6/3 5/4
f 1/1 5/2 8/3 4/4
f 6/1 2/2 3/3 7/4
";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("orbitview-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &PathBuf) {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

fn write_bc3(path: &PathBuf) {
    let params = NewDxgiParams {
        height: 4,
        width: 4,
        depth: None,
        format: DxgiFormat::BC3_UNorm,
        mipmap_levels: Some(1),
        array_layers: Some(1),
        caps2: None,
        is_cubemap: false,
        resource_dimension: D3D10ResourceDimension::Texture2D,
        alpha_mode: AlphaMode::Unknown,
    };
    let mut dds = Dds::new_dxgi(params).unwrap();
    dds.data = vec![0xAB; 16];
    let mut file = fs::File::create(path).unwrap();
    dds.write(&mut file).unwrap();
}

#[test]
fn loads_every_class_and_isolates_failures() {
    let dir = scratch_dir("full");
    let model = dir.join("cube.obj");
    let primary = dir.join("main_tex_bc3.dds");
    let secondary = dir.join("detail.png");
    let drawing = dir.join("overlay.png");
    fs::write(&model, CUBE_OBJ).unwrap();
    write_bc3(&primary);
    write_png(&secondary);
    write_png(&drawing);

    let source = ModelSource::new(&model)
        .with_texture(&primary)
        .with_texture(&secondary)
        .with_drawing(&drawing)
        .with_cleaner(dir.join("missing_cleaner.dds"));
    let mut assets = load_model(&source);
    assert_eq!(assets.outstanding(), 5);

    let events = assets.wait();
    assert_eq!(events.len(), 5);
    assert_eq!(assets.outstanding(), 0);

    let mesh = assets.mesh.payload().expect("mesh loaded");
    assert_eq!(mesh.indices.len(), 36);
    assert!((mesh.bounding_sphere().radius - 3f32.sqrt()).abs() < 1e-5);

    let main = assets.main_texture.as_ref().unwrap().payload().unwrap();
    assert_eq!(main.format, TextureFormat::Bc3);

    let array = assets.texture_array.as_ref().unwrap();
    assert_eq!(array.status(), AssetStatus::Loaded);
    assert_eq!(array.payload().unwrap()[0].width, 4);

    assert_eq!(
        assets.drawings.as_ref().unwrap().status(),
        AssetStatus::Loaded
    );
    let cleaner = assets.cleaner.as_ref().unwrap();
    assert_eq!(cleaner.status(), AssetStatus::Failed);
    assert!(cleaner.failure().unwrap().contains("missing_cleaner.dds"));

    fs::remove_dir_all(dir).ok();
}

#[test]
fn corrupt_array_member_fails_the_array_only() {
    let dir = scratch_dir("corrupt");
    let model = dir.join("cube.obj");
    let good = dir.join("good.png");
    let bad = dir.join("bad.png");
    fs::write(&model, CUBE_OBJ).unwrap();
    write_png(&good);
    fs::write(&bad, b"definitely not a png").unwrap();

    let source = ModelSource::new(&model)
        .with_texture(&good)
        .with_texture(&good)
        .with_texture(&bad)
        .with_texture(&good);
    let mut assets = load_model(&source);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    assets
        .texture_array
        .as_mut()
        .unwrap()
        .on_status_changed(move |status| sink.borrow_mut().push(status.code()));

    let events = assets.wait();
    let array = assets.texture_array.as_ref().unwrap();
    assert_eq!(array.completed(), 3);
    assert_eq!(array.status(), AssetStatus::Failed);
    assert_eq!(*seen.borrow(), vec![-1]);
    assert!(events.iter().any(|e| e.class == AssetClass::TextureArray));
    assert_eq!(assets.mesh.status(), AssetStatus::Loaded);
    assert_eq!(
        assets.main_texture.as_ref().unwrap().status(),
        AssetStatus::Loaded
    );

    fs::remove_dir_all(dir).ok();
}

#[test]
fn compressed_mesh_format_is_reported_as_failed() {
    let dir = scratch_dir("drc");
    let model = dir.join("tex_test.drc");
    fs::write(&model, [0u8; 32]).unwrap();

    let mut assets = load_model(&ModelSource::new(&model));
    let events = assets.wait();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, AssetStatus::Failed);
    assert!(assets.mesh.failure().unwrap().contains("Unsupported mesh format"));

    fs::remove_dir_all(dir).ok();
}

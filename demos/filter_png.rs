use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context as _;

use filterchain::{
    CountingScheduler, CpuBackend, CpuImage, CpuPaint, FilteredImage, IntRect, PaintFilter,
    Pipeline, RenderBackend, SurfaceDesc,
};

const SEPIA: [f32; 20] = [
    0.393, 0.769, 0.189, 0.0, 0.0, //
    0.349, 0.686, 0.168, 0.0, 0.0, //
    0.272, 0.534, 0.131, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

fn main() {
    if let Err(e) = try_main() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let input = PathBuf::from(args.next().context("usage: filter_png <in> [out]")?);
    let out = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("filtered.png"));

    let bytes = std::fs::read(&input).with_context(|| format!("read {}", input.display()))?;
    let image = CpuImage::decode(&bytes)?;

    let mut pipeline = Pipeline::with_image(image);
    pipeline.push_filter(PaintFilter::new(CpuPaint::color_matrix(SEPIA)));
    pipeline.push_filter(PaintFilter::new(CpuPaint::default().with_opacity(0.85)));

    let scheduler = Rc::new(CountingScheduler::default());
    let mut view = FilteredImage::<CpuBackend, PaintFilter<CpuPaint>>::new(scheduler);
    view.set_pipeline(Some(Rc::new(RefCell::new(pipeline))))?;

    let mut backend = CpuBackend::default();
    let mut canvas = backend.create_surface(&SurfaceDesc::rgba8(512, 512))?;
    let outcome = view.paint(&mut backend, &mut canvas, IntRect::new(0, 0, 512, 512));
    anyhow::ensure!(!outcome.is_aborted(), "composite failed: {outcome:?}");

    canvas
        .to_rgba_image()?
        .save(&out)
        .with_context(|| format!("write {}", out.display()))?;
    println!("wrote {} ({outcome:?})", out.display());
    Ok(())
}

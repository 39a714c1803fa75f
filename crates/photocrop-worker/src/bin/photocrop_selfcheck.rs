use std::io::Cursor;
use std::time::Instant;

use image::{DynamicImage, Rgb, RgbImage};
use photocrop_media::{get_image_metadata, get_options_for_print_size, optimize_for_print};
use photocrop_ml_client::FaceApiConfig;
use photocrop_models::{FaceDetectionOptions, PrintSize, PRINT_ASPECT_RATIO};
use photocrop_worker::{init_tracing, ImageAnalysisService, WorkerConfig};
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::from_env();
    let api = FaceApiConfig::from_env();
    println!(
        "photocrop-selfcheck: detection_timeout={:?} face_api={} configured={}",
        config.detection_timeout,
        api.base_url,
        api.is_configured()
    );
    if !api.is_configured() {
        warn!("FACE_API_TOKEN not set, using heuristic face detection only");
    }

    let buffer = match std::env::args().nth(1) {
        Some(path) => tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path, e))?,
        None => synthetic_image()?,
    };
    let metadata = get_image_metadata(&buffer);
    println!(
        "photocrop-selfcheck: input {}x{} {} ({} bytes)",
        metadata.width, metadata.height, metadata.format, metadata.size
    );

    let service = ImageAnalysisService::from_env()?;
    let start = Instant::now();
    let analysis = service
        .analyze_bytes(&buffer, &FaceDetectionOptions::default(), Some(PRINT_ASPECT_RATIO))
        .await
        .map_err(|e| anyhow::anyhow!("analysis failed [{}]: {}", e.code(), e))?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);

    let smart = photocrop_media::SmartCropAdvisor::default()
        .get_suggested_crops(&buffer, &Default::default())
        .await?;
    for (ratio, crop) in &smart.crops {
        println!(
            "photocrop-selfcheck: smart crop {} -> {:?} score={:.2}",
            ratio, crop.region, crop.score
        );
    }

    let print = optimize_for_print(&buffer, &get_options_for_print_size(PrintSize::A4, 90)).await?;
    println!(
        "photocrop-selfcheck: A4 print file {} bytes, total {:?}",
        print.len(),
        start.elapsed()
    );

    println!("photocrop-selfcheck: ok");
    Ok(())
}

/// Portrait-ish test card: gradient background with a skin-toned block.
fn synthetic_image() -> anyhow::Result<Vec<u8>> {
    let (width, height) = (900u32, 1200u32);
    let mut img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(40 + x * 60 / width) as u8, (60 + y * 80 / height) as u8, 110])
    });
    for y in 300..600 {
        for x in 330..570 {
            img.put_pixel(x, y, Rgb([224, 172, 140]));
        }
    }
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut out, image::ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}

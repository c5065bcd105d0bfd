//! Integration tests: end-to-end behavior of the public boundary
//! operations on synthetic images.

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use std::collections::{HashMap, HashSet};

use inkwash_pipeline::quantize::count_distinct_colors;
use inkwash_pipeline::{
    ColorSpace, Operation, PipelineError, Preset, RgbImage, SegmentationParams, Session, color,
    grayscale, quantize_only, run_stylization,
};

/// A small "photo": four colored quadrants with a soft gradient and a
/// little texture, so every stage has something to do.
fn photo(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let texture = ((x * 7 + y * 13) % 9) as u8;
        let base = match (x < width / 2, y < height / 2) {
            (true, true) => [210, 60, 40],
            (false, true) => [40, 160, 70],
            (true, false) => [50, 70, 190],
            (false, false) => [230, 210, 60],
        };
        image::Rgb(base.map(|c: u8| c.saturating_sub(texture) / 2 + (x % 32) as u8 * 2))
    })
}

fn disabled_extras() -> SegmentationParams {
    SegmentationParams {
        sigma: 0.0,
        edge_weight: 0.0,
        smoothing_factor: 0.0,
        edge_enhancement: 0.0,
        ..SegmentationParams::default()
    }
}

#[test]
fn stylization_preserves_dimensions() {
    let mut params: Vec<SegmentationParams> = Preset::ALL
        .into_iter()
        .filter_map(Preset::params)
        .collect();
    params.push(SegmentationParams::default());
    params.push(disabled_extras());
    for space in ColorSpace::ALL {
        params.push(SegmentationParams {
            color_space: space,
            ..SegmentationParams::default()
        });
    }

    for (width, height) in [(3, 2), (17, 5), (32, 24)] {
        let img = photo(width, height);
        for p in &params {
            let out = run_stylization(&img, p).unwrap();
            assert_eq!(
                out.dimensions(),
                (width, height),
                "params {p:?} changed dimensions",
            );
        }
    }
}

#[test]
fn stylization_does_not_touch_input() {
    let img = photo(20, 20);
    let before = img.clone();
    run_stylization(&img, &SegmentationParams::cartoon()).unwrap();
    assert_eq!(img, before);
}

#[test]
fn grayscale_is_idempotent() {
    let once = grayscale(&photo(25, 14)).unwrap();
    let twice = grayscale(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn quantize_only_bounds_distinct_colors() {
    let img = photo(40, 30);
    assert!(count_distinct_colors(&img) > 16);
    for n in 2..=16 {
        let out = quantize_only(&img, n).unwrap();
        let distinct = count_distinct_colors(&out);
        assert!(distinct <= n as usize, "n = {n}: {distinct} colors");
    }
}

#[test]
fn disabled_stages_match_segment_average_quantize() {
    let img = photo(30, 22);
    let params = disabled_extras();

    let working = color::convert(&img, ColorSpace::Rgb, params.color_space);
    let labeling = inkwash_pipeline::segment::segment(
        &working,
        params.n_segments,
        params.compactness,
        params.sigma,
    )
    .unwrap();
    let averaged = inkwash_pipeline::average::average(&img, &labeling).unwrap();
    let expected =
        inkwash_pipeline::quantize::quantize(&averaged, params.n_colors, params.seed).unwrap();

    assert_eq!(run_stylization(&img, &params).unwrap(), expected);
}

#[test]
fn stylization_is_deterministic() {
    let img = photo(28, 21);
    for params in [SegmentationParams::default(), SegmentationParams::painterly()] {
        let a = run_stylization(&img, &params).unwrap();
        let b = run_stylization(&img, &params).unwrap();
        assert_eq!(a, b);
    }
    assert_eq!(quantize_only(&img, 5).unwrap(), quantize_only(&img, 5).unwrap());
}

#[test]
fn solid_red_stays_red() {
    let red = RgbImage::from_fn(4, 4, |_, _| image::Rgb([255, 0, 0]));
    let params = SegmentationParams {
        n_segments: 100,
        n_colors: 8,
        ..SegmentationParams::default()
    };

    let working = color::convert(&red, ColorSpace::Rgb, params.color_space);
    let labeling =
        inkwash_pipeline::segment::segment(&working, params.n_segments, params.compactness, 0.0)
            .unwrap();
    assert_eq!(labeling.segment_count(), 1);

    let out = run_stylization(&red, &params).unwrap();
    for p in out.pixels() {
        assert_eq!(p.0, [255, 0, 0]);
    }
}

#[test]
fn two_colors_survive_two_color_quantization() {
    let img = RgbImage::from_fn(10, 6, |x, y| {
        if (x + y) % 3 == 0 {
            image::Rgb([17, 99, 240])
        } else {
            image::Rgb([201, 55, 3])
        }
    });
    let out = quantize_only(&img, 2).unwrap();
    assert_eq!(out, img);
}

#[test]
fn operations_without_image_fail() {
    let empty = RgbImage::new(0, 0);
    assert_eq!(grayscale(&empty), Err(PipelineError::NoImageLoaded));
    assert_eq!(quantize_only(&empty, 8), Err(PipelineError::NoImageLoaded));
    assert_eq!(
        run_stylization(&empty, &SegmentationParams::default()),
        Err(PipelineError::NoImageLoaded),
    );

    let mut session = Session::new();
    for op in [
        Operation::Grayscale,
        Operation::Quantize { n_colors: 8 },
        Operation::Stylize(SegmentationParams::cartoon()),
    ] {
        assert_eq!(session.apply(&op), Err(PipelineError::NoImageLoaded));
    }
    assert!(!session.has_image());
}

#[test]
fn zero_compactness_follows_color() {
    // Three vertical stripes of distinct colors.
    let stripes = [[240, 240, 20], [20, 20, 120], [200, 30, 160]];
    let img = RgbImage::from_fn(24, 16, |x, _| image::Rgb(stripes[(x / 8) as usize]));
    let labeling = inkwash_pipeline::segment::segment(&img, 6, 0.0, 0.0).unwrap();

    let mut colors: HashMap<u32, HashSet<[u8; 3]>> = HashMap::new();
    for (x, y, p) in img.enumerate_pixels() {
        colors.entry(labeling.label(x, y)).or_default().insert(p.0);
    }
    for (id, set) in colors {
        assert_eq!(set.len(), 1, "segment {id} mixes colors");
    }
    assert_eq!(labeling.segment_count(), 3);
}

#[test]
fn max_compactness_gives_regular_regions() {
    // Strong color structure that would pull regions off-grid at low
    // compactness.
    let img = RgbImage::from_fn(40, 40, |x, y| {
        let v = ((x * 7919 + y * 104_729) % 41) as u8 + 100;
        image::Rgb([v, v / 2, 255 - v])
    });
    let labeling = inkwash_pipeline::segment::segment(
        &img,
        16,
        inkwash_pipeline::params::MAX_COMPACTNESS,
        0.0,
    )
    .unwrap();
    for size in labeling.segment_sizes() {
        assert!(
            (50..=200).contains(&size),
            "segment size {size} far from the grid cell size of 100",
        );
    }
}

#[test]
fn max_compactness_regions_ignore_periodic_texture() {
    // Every grid cell of these fixtures has the same mean color.
    let checkerboard = RgbImage::from_fn(40, 40, |x, y| {
        let v = if (x + y) % 2 == 0 { 0 } else { 255 };
        image::Rgb([v, v, v])
    });
    let stripes = RgbImage::from_fn(40, 40, |x, _| {
        if (x / 2) % 2 == 0 {
            image::Rgb([255, 0, 0])
        } else {
            image::Rgb([0, 0, 255])
        }
    });

    for (name, img) in [("checkerboard", checkerboard), ("stripes", stripes)] {
        let labeling = inkwash_pipeline::segment::segment(
            &img,
            16,
            inkwash_pipeline::params::MAX_COMPACTNESS,
            0.0,
        )
        .unwrap();
        let sizes = labeling.segment_sizes();
        assert!(
            (12..=20).contains(&sizes.len()),
            "{name}: expected about 16 regions, sizes = {sizes:?}",
        );
        for size in sizes {
            assert!(
                (50..=200).contains(&size),
                "{name}: segment size {size} far from the grid cell size of 100",
            );
        }
    }
}

#[test]
fn session_chains_edits_and_resets() {
    let img = photo(16, 16);
    let mut session = Session::new();
    session.load(img.clone()).unwrap();

    session.apply(&Operation::Quantize { n_colors: 4 }).unwrap();
    let after_quantize = session.working().unwrap().clone();
    session.apply(&Operation::Grayscale).unwrap();
    assert_eq!(
        session.working().unwrap(),
        &grayscale(&after_quantize).unwrap(),
    );
    assert_eq!(session.original().unwrap(), &img);

    session.reset().unwrap();
    assert_eq!(session.working().unwrap(), &img);
}

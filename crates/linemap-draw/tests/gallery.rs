//! End-to-end: compose the demo network, annotate it, lay it out and render.

use proptest::prelude::*;

use linemap_core::input::demo_lines;
use linemap_core::{LineGraph, WeightPolicy, compose};
use linemap_draw::gallery::GALLERY_NAMES;
use linemap_draw::{
    Canvas, GallerySettings, Layout, LayoutKind, LayoutWeights, OutputFormat, VisualEncoding,
    render, render_gallery,
};
use linemap_metrics::{ClosenessOptions, annotate_closeness};

fn annotated_demo() -> LineGraph {
    let mut g = compose(&demo_lines());
    annotate_closeness(&mut g, WeightPolicy::Raw, &ClosenessOptions::default()).unwrap();
    g
}

#[test]
fn gallery_writes_every_svg_in_order() {
    let g = annotated_demo();
    let dir = tempfile::tempdir().unwrap();

    let files = render_gallery(&g, &GallerySettings::default(), dir.path()).unwrap();

    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, GALLERY_NAMES.to_vec());
    for file in &files {
        assert_eq!(file.path, dir.path().join(format!("{}.svg", file.name)));
        let body = std::fs::read_to_string(&file.path).unwrap();
        assert!(body.contains("<svg"), "{}", file.name);
        assert_eq!(body.matches("<text ").count(), 17, "{}", file.name);
    }

    // The first five share the random layout.
    assert!(files[..5].iter().all(|f| f.layout == "random"));
    assert_eq!(files[5].layout, "sfdp");
    assert_eq!(files[8].layout, "fruchterman-reingold");
    assert_eq!(files[11].layout, "arf");
}

#[test]
fn first_images_reuse_one_seeded_random_layout() {
    let g = annotated_demo();
    let dir = tempfile::tempdir().unwrap();
    let settings = GallerySettings {
        format: OutputFormat::Dot,
        ..GallerySettings::default()
    };
    let files = render_gallery(&g, &settings, dir.path()).unwrap();

    for file in &files[..5] {
        assert_eq!(file.iterations, 0, "{}", file.name);
        assert!(file.converged, "{}", file.name);
    }

    let positions = |i: usize| -> Vec<String> {
        let body = std::fs::read_to_string(&files[i].path).unwrap();
        body.split("pos=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(str::to_string)
            .collect()
    };
    let constant = positions(1);
    assert_eq!(constant.len(), 17);
    assert_eq!(positions(2), constant, "1-3 moved vertices");
    assert_eq!(positions(3), constant, "1-4 moved vertices");
    assert_ne!(positions(5), constant, "sfdp should not reuse the random layout");
}

#[test]
fn gallery_canvas_switches_after_first_image() {
    let g = annotated_demo();
    let dir = tempfile::tempdir().unwrap();
    let files = render_gallery(&g, &GallerySettings::default(), dir.path()).unwrap();

    let first = std::fs::read_to_string(&files[0].path).unwrap();
    let second = std::fs::read_to_string(&files[1].path).unwrap();
    assert!(first.contains(r#"width="600" height="600""#));
    assert!(second.contains(r#"width="400" height="400""#));
}

#[test]
fn gallery_in_dot_format() {
    let g = annotated_demo();
    let dir = tempfile::tempdir().unwrap();
    let settings = GallerySettings {
        format: OutputFormat::Dot,
        ..GallerySettings::default()
    };
    let files = render_gallery(&g, &settings, dir.path()).unwrap();
    assert_eq!(files.len(), 12);
    for file in &files {
        assert_eq!(file.path.extension().and_then(|e| e.to_str()), Some("dot"));
        let body = std::fs::read_to_string(&file.path).unwrap();
        assert!(body.starts_with("digraph"));
        assert_eq!(body.matches("pos=\"").count(), 17);
    }
}

#[test]
fn gallery_into_missing_directory_fails() {
    let g = annotated_demo();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent");
    assert!(render_gallery(&g, &GallerySettings::default(), &missing).is_err());
}

#[test]
fn same_seed_same_picture() {
    let g = annotated_demo();
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    render_gallery(&g, &GallerySettings::default(), a.path()).unwrap();
    render_gallery(&g, &GallerySettings::default(), b.path()).unwrap();
    for name in GALLERY_NAMES {
        let file = format!("{name}.svg");
        assert_eq!(
            std::fs::read(a.path().join(&file)).unwrap(),
            std::fs::read(b.path().join(&file)).unwrap(),
            "{name}"
        );
    }
}

#[test]
fn render_rejects_unknown_extension_without_writing() {
    let g = annotated_demo();
    let dir = tempfile::tempdir().unwrap();
    let pos = LayoutKind::Random
        .build(1)
        .compute(&g, &LayoutWeights::none())
        .unwrap()
        .positions;
    let path = dir.path().join("out.pdf");
    assert!(render(&g, &pos, &VisualEncoding::default(), &path, Canvas::default()).is_err());
    assert!(!path.exists());
}

fn arb_batch() -> impl Strategy<Value = Vec<Vec<String>>> {
    let token = prop::sample::select(vec!["A", "B", "C", "D", "E", "O"]).prop_map(str::to_string);
    prop::collection::vec(prop::collection::vec(token, 0..6), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn layouts_always_produce_finite_positions(batch in arb_batch(), seed in 0u64..1000) {
        let g = compose(&batch);
        let counts = g.traverse_counts();
        let visits = g.visit_counts();
        let weights = LayoutWeights::none().with_edge(&counts).with_vertex(&visits);
        for kind in LayoutKind::ALL {
            let layout: Box<dyn Layout> = kind.build(seed);
            let r = layout.compute(&g, &weights).unwrap();
            prop_assert_eq!(r.positions.len(), g.vertex_count());
            prop_assert!(r.positions.iter().all(|p| p.is_finite()), "{}", kind);
        }
    }
}

use filament::config::{AnimationConfig, LayoutConfig, ProximityThreshold, RenderConfig};
use filament::hash::string_hash;
use filament::layout::{EdgeKind, Layout, LayoutGenerator, PointGroup, Viewport};
use filament::reconcile::{Reconciler, ReconcilerState};
use filament::roster::{Roster, Subject};
use filament::scene::SvgScene;
use filament::view::NetworkView;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};

fn random_string(rng: &mut impl Rng) -> String {
    let len = rng.gen_range(1..16);
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

fn random_subjects(seed: u64, count: usize) -> Vec<Subject> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Subject::new(
                format!("{:08}", rng.gen_range(0..100_000_000u32)),
                random_string(&mut rng),
                rng.gen_range(1990..2030).to_string(),
                random_string(&mut rng),
            )
        })
        .collect()
}

fn viewports() -> [Viewport; 3] {
    [
        Viewport::new(800.0, 600.0),
        Viewport::new(1920.0, 1080.0),
        Viewport::new(375.0, 812.0),
    ]
}

fn ids(layout: &Layout) -> Vec<String> {
    layout.points.iter().map(|p| p.id.clone()).collect()
}

#[test]
fn layout_is_deterministic() {
    let generator = LayoutGenerator::default();
    for subject in random_subjects(1, 20) {
        for viewport in viewports() {
            assert_eq!(
                generator.generate(&subject, viewport),
                generator.generate(&subject, viewport)
            );
        }
    }
}

#[test]
fn point_ids_are_index_stable() {
    let generator = LayoutGenerator::default();
    let expected: Vec<String> = (0..80).map(|i| format!("point-{}", i)).collect();
    for subject in random_subjects(2, 10) {
        let layout = generator.generate(&subject, Viewport::new(800.0, 600.0));
        assert_eq!(ids(&layout), expected);
    }
}

#[test]
fn points_stay_inside_their_band() {
    let config = LayoutConfig::default();
    let generator = LayoutGenerator::new(config.clone());
    let margin = config.min_point_margin;
    let eps = 1e-9;

    for subject in random_subjects(3, 20) {
        for viewport in viewports() {
            let (w, h) = (viewport.width, viewport.height);
            for point in generator.generate(&subject, viewport).points {
                let (x_min, x_max, y_min, y_max) = match point.group {
                    PointGroup::Structured => (
                        w * config.right_side_threshold + margin,
                        w - margin,
                        h * config.center_y_offset + margin,
                        h * (config.center_y_offset + config.center_y_ratio) - margin,
                    ),
                    PointGroup::Random => (margin, w - margin, margin, h - margin),
                };
                assert!(point.x >= x_min - eps && point.x <= x_max + eps, "{point:?}");
                assert!(point.y >= y_min - eps && point.y <= y_max + eps, "{point:?}");
            }
        }
    }
}

#[test]
fn radius_and_opacity_follow_tiers() {
    let config = LayoutConfig::default();
    let generator = LayoutGenerator::new(config.clone());
    let max_opacity = config.min_opacity + 4.0 * config.opacity_step;

    for subject in random_subjects(4, 20) {
        let layout = generator.generate(&subject, Viewport::new(800.0, 600.0));
        for (i, point) in layout.points.iter().enumerate() {
            let size_seed = string_hash(&format!("{}-{}-size-{}", subject.id, subject.name, i));
            let tier = generator.tier_for(size_seed).unwrap();
            let scale = config.radius_scale;
            assert!(point.radius >= tier.min * scale - 1e-9, "{point:?}");
            assert!(point.radius <= tier.max * scale + 1e-9, "{point:?}");
            assert!(point.opacity >= config.min_opacity - 1e-9);
            assert!(point.opacity <= max_opacity + 1e-9);
        }
    }
}

#[test]
fn edges_never_loop_and_proximity_pairs_are_unique() {
    let generator = LayoutGenerator::new(LayoutConfig {
        proximity_threshold: ProximityThreshold::DiagonalFraction(0.1),
        ..LayoutConfig::default()
    });

    for subject in random_subjects(5, 20) {
        let layout = generator.generate(&subject, Viewport::new(1280.0, 720.0));
        let mut pairs = HashSet::new();
        for edge in &layout.edges {
            assert_ne!(edge.source, edge.target);
            assert!(edge.source < layout.points.len() && edge.target < layout.points.len());

            let source = &layout.points[edge.source];
            let target = &layout.points[edge.target];
            assert_eq!((edge.x1, edge.y1), (source.x, source.y));
            assert_eq!((edge.x2, edge.y2), (target.x, target.y));

            match edge.kind {
                EdgeKind::Structured => {
                    assert_eq!(source.group, PointGroup::Structured);
                    assert_eq!(target.group, PointGroup::Structured);
                }
                EdgeKind::Proximity => {
                    assert_eq!(source.group, PointGroup::Random);
                    assert_eq!(target.group, PointGroup::Random);
                    let key = (edge.source.min(edge.target), edge.source.max(edge.target));
                    assert!(pairs.insert(key), "duplicate proximity pair {key:?}");
                    assert_eq!(edge.id, format!("proximity-{}-{}", key.0, key.1));
                }
            }
        }
    }
}

#[test]
fn structured_edges_bounded_by_connection_count() {
    let generator = LayoutGenerator::default();
    let layout = generator.generate(
        &Subject::new("00000043", "Test", "2022", "Sound"),
        Viewport::new(800.0, 600.0),
    );
    let structured: Vec<_> = layout
        .edges
        .iter()
        .filter(|e| e.kind == EdgeKind::Structured)
        .collect();
    assert!(structured.len() <= generator.connection_count());
    assert!(structured.len() <= generator.structured_count());
    for (i, edge) in structured.iter().enumerate() {
        assert_eq!(edge.id, format!("connection-structured-{}", i));
    }
}

fn settled_ids(scene: &SvgScene) -> (Vec<String>, Vec<String>) {
    let mut points: Vec<String> = scene.point_ids().into_iter().map(String::from).collect();
    let mut edges: Vec<String> = scene.edge_ids().into_iter().map(String::from).collect();
    points.sort();
    edges.sort();
    (points, edges)
}

#[test]
fn reconciliation_conserves_points() {
    let subjects = random_subjects(6, 3);
    let viewport = Viewport::new(800.0, 600.0);
    let layouts = [
        LayoutGenerator::default().generate(&subjects[0], viewport),
        LayoutGenerator::new(LayoutConfig {
            point_count: 50,
            ..LayoutConfig::default()
        })
        .generate(&subjects[1], viewport),
        LayoutGenerator::new(LayoutConfig {
            point_count: 90,
            ..LayoutConfig::default()
        })
        .generate(&subjects[2], viewport),
    ];

    let mut reconciler = Reconciler::new(
        SvgScene::new(800, 600, RenderConfig::default()),
        AnimationConfig::default(),
    );

    // Opacity each settled point should show. Points that carry over keep
    // whatever they were showing; only new points take the layout's value.
    let mut shown: HashMap<String, f64> = HashMap::new();
    let mut clock = 0;
    for layout in layouts {
        reconciler.reconcile(layout.clone());
        // Interrupt halfway through the previous transition as well.
        clock += 300;
        reconciler.advance(clock);
        reconciler.reconcile(layout.clone());

        clock = reconciler.quiescent_at();
        reconciler.advance(clock);
        assert_eq!(reconciler.state(), ReconcilerState::Idle);

        let (points, edges) = settled_ids(reconciler.surface());
        let mut expected_points = ids(&layout);
        expected_points.sort();
        let mut expected_edges: Vec<String> = layout.edges.iter().map(|e| e.id.clone()).collect();
        expected_edges.sort();
        assert_eq!(points, expected_points);
        assert_eq!(edges, expected_edges);

        shown = layout
            .points
            .iter()
            .map(|point| {
                let opacity = shown.get(&point.id).copied().unwrap_or(point.opacity);
                (point.id.clone(), opacity)
            })
            .collect();
        for point in &layout.points {
            assert_eq!(
                reconciler.surface().opacity_of(&point.id),
                Some(shown[&point.id]),
                "{}",
                point.id
            );
        }
        for edge in &layout.edges {
            assert_eq!(reconciler.surface().opacity_of(&edge.id), Some(0.8));
        }
        assert_eq!(reconciler.surface().pending(), 0);
    }
}

#[test]
fn rapid_switch_never_shows_first_subjects_edges() {
    let layout_config = LayoutConfig {
        point_count: 30,
        ..LayoutConfig::default()
    };
    let mut view = NetworkView::new(
        SvgScene::new(800, 600, RenderConfig::default()),
        layout_config,
        AnimationConfig::default(),
    );
    let subjects = random_subjects(7, 2);
    let viewport = Viewport::new(800.0, 600.0);

    view.on_subject_selected(&subjects[0], viewport);
    view.advance(200);
    let second = view.on_subject_selected(&subjects[1], viewport).clone();

    // Sample every 50ms across both settle windows.
    for t in (250..=3000).step_by(50) {
        view.advance(t);
        let edges = view.surface().edge_ids();
        if t < 1000 {
            assert!(edges.is_empty(), "edges visible at {t}ms: {edges:?}");
        }
        for (id, expected) in edges.iter().zip(&second.edges) {
            assert_eq!(*id, expected.id);
        }
    }

    let edges: Vec<&str> = view.surface().edge_ids();
    let expected: Vec<&str> = second.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edges, expected);
}

#[test]
fn first_render_fades_points_in_sequence() {
    let mut view = NetworkView::new(
        SvgScene::new(800, 600, RenderConfig::default()),
        LayoutConfig {
            point_count: 4,
            ..LayoutConfig::default()
        },
        AnimationConfig::default(),
    );
    let subject = Subject::new("00000043", "Test", "2022", "Sound");
    let layout = view
        .on_subject_selected(&subject, Viewport::new(800.0, 600.0))
        .clone();

    // point-i fades in at 10 + 5 * i ms.
    view.advance(14);
    assert_eq!(view.surface().opacity_of("point-0"), Some(layout.points[0].opacity));
    assert_eq!(view.surface().opacity_of("point-1"), Some(0.0));
    view.advance(15);
    assert_eq!(view.surface().opacity_of("point-1"), Some(layout.points[1].opacity));
    assert_eq!(view.surface().opacity_of("point-3"), Some(0.0));
    view.settle();
    assert_eq!(view.surface().opacity_of("point-3"), Some(layout.points[3].opacity));
}

#[test]
fn roster_drives_a_full_render() {
    let roster = Roster::from_json(
        r#"[{"id": "00000043", "name": "Test", "since": "2022", "area": "Sound"}]"#,
    )
    .unwrap();
    let mut view = NetworkView::new(
        SvgScene::new(800, 600, RenderConfig::default()),
        LayoutConfig::default(),
        AnimationConfig::default(),
    );
    let subject = roster.current().unwrap();
    view.on_subject_selected(subject, Viewport::new(800.0, 600.0));
    view.settle();

    let svg = view.surface().to_svg();
    assert_eq!(svg.matches("<circle").count(), 80);
    assert_eq!(svg.matches("<line").count(), 489);
    assert!(svg.contains(r#"data-id="proximity-40-41""#));
}

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tategaki::draw::{DrawCommand, Point};
use tategaki::layout::{DrawOrientation, VerticalLayoutRun, VerticalLineMetrics};
use tategaki::*;
use tategaki_test_data::{hiragana_gid, kana_font, GID_KANJI_JI};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn font() -> Arc<FontTableSet> {
    Arc::new(FontTableSet::new(SharedData::new(kana_font().build()), 0).unwrap())
}

fn config(font_size: f32, block_height: f32) -> LayoutConfig {
    LayoutConfig {
        font_size,
        block_height,
        ..LayoutConfig::default()
    }
}

fn build<T: layout::Spanned + ?Sized>(text: &T, config: &LayoutConfig) -> VerticalLayout {
    init_logging();
    let font = font();
    let measure = VerticalTextMeasure::new(font.clone(), &config.vertical_substitution).unwrap();
    let mut shaper = MetricsShaper::new(font);
    let len = text.text().len();
    VerticalLayout::build(text, 0, len, &measure, &mut shaper, config).unwrap()
}

fn assert_contiguous(lines: &[VerticalLineMetrics], start: usize, end: usize) {
    assert_eq!(lines.first().map(|l| l.start), Some(start));
    assert_eq!(lines.last().map(|l| l.end), Some(end));
    for pair in lines.windows(2) {
        assert_eq!(pair[0].end, pair[1].start, "gap between {pair:?}");
    }
}

#[test]
fn mixed_text_fits_in_one_column() {
    let layout = build("ABあい", &config(20.0, 600.0));
    assert_eq!(layout.lines().len(), 1);
    let line = &layout.line_layouts()[0];
    let orientations: Vec<DrawOrientation> = line
        .runs()
        .iter()
        .map(|run| match run {
            VerticalLayoutRun::Rotate(_) => DrawOrientation::Rotate,
            VerticalLayoutRun::Upright(_) => DrawOrientation::Upright,
            VerticalLayoutRun::TateChuYoko(_) => DrawOrientation::TateChuYoko,
            VerticalLayoutRun::Ruby(_) => DrawOrientation::Ruby,
        })
        .collect();
    assert_eq!(
        orientations,
        vec![DrawOrientation::Rotate, DrawOrientation::Upright]
    );
    assert_relative_eq!(line.height(), 64.0, epsilon = 1e-3);
    assert_relative_eq!(layout.lines()[0].baseline, -10.0, epsilon = 1e-4);
    assert_relative_eq!(layout.width(), 20.0, epsilon = 1e-4);
}

#[test]
fn tiny_columns_hold_one_character_each() {
    let layout = build("ABあい", &config(20.0, 1.0));
    let ranges: Vec<_> = layout.lines().iter().map(|l| l.range()).collect();
    assert_eq!(ranges, vec![0..1, 1..2, 2..5, 5..8]);
    for line in layout.line_layouts() {
        assert_eq!(line.runs().len(), 1);
    }
}

#[test]
fn long_latin_words_fill_their_columns() {
    // 12px letters, five to a column.
    let layout = build("ABCDEFGH", &config(20.0, 62.0));
    let ranges: Vec<_> = layout.lines().iter().map(|l| l.range()).collect();
    assert_eq!(ranges, vec![0..5, 5..8]);
    assert_relative_eq!(layout.line_layouts()[0].height(), 60.0, epsilon = 1e-3);
}

#[test]
fn ruby_across_a_paragraph_break_is_not_repeated() {
    let text = AnnotatedText::new("字\n字")
        .ruby(0..7, RubySpan::new("じじ"))
        .unwrap();
    let layout = build(&text, &config(20.0, 600.0));
    let ranges: Vec<_> = layout.lines().iter().map(|l| l.range()).collect();
    assert_eq!(ranges, vec![0..3, 4..7]);
    for line in layout.line_layouts() {
        assert!(line
            .runs()
            .iter()
            .all(|run| matches!(run, VerticalLayoutRun::Upright(_))));
    }

    let mut canvas = RecordingCanvas::new();
    layout.draw(&mut canvas, 0.0, 0.0, &DrawParams::default());
    let ids: Vec<u16> = canvas.glyphs().iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![GID_KANJI_JI, GID_KANJI_JI]);
}

#[test]
fn columns_respect_block_height() {
    let text = "たてがきのテキストとLatinの混在。漢字も12345ある";
    for block_height in [15.0, 20.0, 45.0, 61.0, 100.0, 250.0] {
        let layout = build(text, &config(20.0, block_height));
        assert_contiguous(layout.lines(), 0, text.len());
        assert_eq!(layout.lines().len(), layout.line_layouts().len());
        for (metrics, line) in layout.lines().iter().zip(layout.line_layouts()) {
            assert_eq!(metrics.range(), line.range());
            assert!(
                line.height() <= block_height + 1e-3 || line.runs().len() == 1,
                "column {:?} is {} tall, limit {}",
                line.range(),
                line.height(),
                block_height
            );
        }
        for pair in layout.lines().windows(2) {
            assert!(pair[1].baseline < pair[0].baseline);
            assert!(pair[1].right_edge() <= pair[0].left_edge() + 1e-3);
        }
    }
}

#[test]
fn columns_carry_every_character() {
    let text = "あいうえおかきくけこ";
    let layout = build(text, &config(20.0, 50.0));
    let mut covered = String::new();
    for line in layout.lines() {
        covered.push_str(&text[line.range()]);
    }
    assert_eq!(covered, text);
    assert_eq!(layout.lines().len(), 5);
}

#[test]
fn paragraphs_start_new_columns() {
    let config = LayoutConfig {
        line_spacing: 4.0,
        ..config(20.0, 600.0)
    };
    let layout = build("あい\nう", &config);
    let ranges: Vec<_> = layout.lines().iter().map(|l| l.range()).collect();
    assert_eq!(ranges, vec![0..6, 7..10]);
    assert_relative_eq!(layout.lines()[1].baseline, -34.0, epsilon = 1e-3);
    assert_relative_eq!(layout.width(), 44.0, epsilon = 1e-3);
}

#[test]
fn blank_lines_keep_their_column() {
    let layout = build("あ\n\nい\n", &config(20.0, 600.0));
    let ranges: Vec<_> = layout.lines().iter().map(|l| l.range()).collect();
    assert_eq!(ranges, vec![0..3, 4..4, 5..8]);
    assert_relative_eq!(layout.lines()[1].left, 10.0, epsilon = 1e-4);
}

#[test]
fn upright_glyphs_are_drawn_on_the_column_baseline() {
    let layout = build("あい", &config(20.0, 600.0));
    let mut canvas = RecordingCanvas::new();
    layout.draw(&mut canvas, 100.0, 0.0, &DrawParams::default());
    let glyphs = canvas.glyphs();
    assert_eq!(
        glyphs.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
        vec![hiragana_gid('あ'), hiragana_gid('い')]
    );
    assert_relative_eq!(glyphs[0].1.x, 80.0, epsilon = 1e-3);
    assert_relative_eq!(glyphs[0].1.y, 17.6, epsilon = 1e-3);
    assert_relative_eq!(glyphs[1].1.y, 37.6, epsilon = 1e-3);
}

#[test]
fn rotated_text_is_drawn_as_text() {
    let layout = build("AB", &config(20.0, 600.0));
    let mut canvas = RecordingCanvas::new();
    layout.draw(&mut canvas, 0.0, 0.0, &DrawParams::default());
    assert_eq!(canvas.texts(), vec!["AB"]);
    assert!(canvas.commands().iter().any(|c| matches!(
        c,
        DrawCommand::Rotate { degrees, pivot } if *degrees == 90.0 && *pivot == Point::new(-10.0, 0.0)
    )));
}

#[test]
fn combine_upright_text_is_compressed() {
    let text = AnnotatedText::new("第123話").combine_upright(3..6).unwrap();
    let layout = build(&text, &config(20.0, 600.0));
    let mut canvas = RecordingCanvas::new();
    layout.draw(&mut canvas, 0.0, 0.0, &DrawParams::default());
    let (drawn, scale_x) = canvas
        .commands()
        .iter()
        .find_map(|c| match c {
            DrawCommand::Text { text, paint, .. } => Some((text.clone(), paint.scale_x)),
            _ => None,
        })
        .unwrap();
    assert_eq!(drawn, "123");
    assert_relative_eq!(scale_x, 1.1 / 1.65, epsilon = 1e-4);
}

#[test]
fn ruby_is_drawn_beside_its_base() {
    let text = AnnotatedText::new("字").ruby(0..3, RubySpan::new("じ")).unwrap();
    let layout = build(&text, &config(20.0, 600.0));
    let line = &layout.lines()[0];
    assert_relative_eq!(line.left, 10.0, epsilon = 1e-4);
    assert_relative_eq!(line.right, 20.0, epsilon = 1e-4);
    assert_relative_eq!(line.baseline, -20.0, epsilon = 1e-4);

    let mut canvas = RecordingCanvas::new();
    layout.draw(&mut canvas, 0.0, 0.0, &DrawParams::default());
    let glyphs = canvas.glyphs();
    assert_eq!(glyphs.len(), 2);
    assert_eq!(glyphs[0].0, GID_KANJI_JI);
    assert_relative_eq!(glyphs[0].1.x, -30.0, epsilon = 1e-3);
    assert_eq!(glyphs[1].0, hiragana_gid('じ'));
    assert_relative_eq!(glyphs[1].1.x, -10.0, epsilon = 1e-3);
    assert_relative_eq!(glyphs[1].1.y, 13.8, epsilon = 1e-3);
}

#[test]
fn metrics_only_layout_draws_nothing() {
    let config = LayoutConfig {
        compute_full_layout: false,
        ..config(20.0, 30.0)
    };
    let layout = build("あいう", &config);
    assert_eq!(layout.lines().len(), 3);
    assert!(layout.line_layouts().is_empty());
    let mut canvas = RecordingCanvas::new();
    layout.draw(&mut canvas, 0.0, 0.0, &DrawParams::default());
    assert!(canvas.commands().is_empty());
}

#[test]
fn debug_overlays_go_through_the_canvas() {
    let config = LayoutConfig {
        debug_overlays: true,
        ..config(20.0, 600.0)
    };
    let layout = build("あ", &config);
    let mut canvas = RecordingCanvas::new();
    layout.draw(&mut canvas, 0.0, 0.0, &config.draw_params());
    assert!(canvas
        .commands()
        .iter()
        .any(|c| matches!(c, DrawCommand::DebugLine(..))));
    assert_eq!(canvas.glyphs().len(), 1);
}

#[test]
fn layout_from_toml_config() {
    let config = LayoutConfig::from_toml_str(
        r#"
        font-size = 20.0
        block-height = 40.0
        orientation = "upright"
        "#,
    )
    .unwrap();
    let layout = build("あいうAB", &config);
    let ranges: Vec<_> = layout.lines().iter().map(|l| l.range()).collect();
    assert_eq!(ranges, vec![0..6, 6..10, 10..11]);
}

#[test]
fn invalid_inputs_fail_fast() {
    let font = font();
    let measure = VerticalTextMeasure::new(font.clone(), &SubstitutionConfig::default()).unwrap();
    let mut shaper = MetricsShaper::new(font);
    let text = "あい";

    let err = VerticalLayout::build(text, 0, 7, &measure, &mut shaper, &config(20.0, 100.0))
        .unwrap_err();
    assert!(matches!(err, LayoutError::InvalidRange { .. }));

    let err = VerticalLayout::build(text, 1, 6, &measure, &mut shaper, &config(20.0, 100.0))
        .unwrap_err();
    assert_eq!(err, LayoutError::NotCharBoundary(1));

    let err = VerticalLayout::build(text, 0, 6, &measure, &mut shaper, &config(20.0, 0.0))
        .unwrap_err();
    assert_eq!(err, LayoutError::InvalidHeight(0.0));

    let err = VerticalLayout::build(text, 0, 6, &measure, &mut shaper, &config(-1.0, 10.0))
        .unwrap_err();
    assert_eq!(err, LayoutError::InvalidFontSize(-1.0));
}

#[test]
fn empty_range_has_no_columns() {
    let font = font();
    let measure = VerticalTextMeasure::new(font.clone(), &SubstitutionConfig::default()).unwrap();
    let mut shaper = MetricsShaper::new(font);
    let layout =
        VerticalLayout::build("あい", 3, 3, &measure, &mut shaper, &config(20.0, 100.0)).unwrap();
    assert!(layout.lines().is_empty());
    assert_eq!(layout.width(), 0.0);
}

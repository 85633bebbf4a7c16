//! EDL construction.
//!
//! `build` is a total function over parsed timeline documents: every
//! optional field was already defaulted at the parse boundary, so there is
//! no failure path here. One pass classifies items by kind and projects
//! them into segments; each sequence is then stably sorted by start time so
//! ties keep document encounter order.

use clipflow_timeline_model::{CanvasSize, ItemKind, TimelineDocument, TrackItem, Transform};

use crate::edl::{
    AudioSegment, EditDecisionList, PixelPosition, TextSegment, VideoSegment, EDL_VERSION,
};
use crate::quality::Quality;

/// Build a fresh Edit Decision List from the current timeline state.
pub fn build(doc: &TimelineDocument, quality: Quality) -> EditDecisionList {
    let mut video_segments = Vec::new();
    let mut audio_segments = Vec::new();
    let mut text_segments = Vec::new();

    for item in &doc.items {
        match item.kind {
            ItemKind::Video => video_segments.push(video_segment(item)),
            ItemKind::Audio => audio_segments.push(audio_segment(item)),
            ItemKind::Text => text_segments.push(text_segment(item, doc.size)),
            ItemKind::Image | ItemKind::Other => {}
        }
    }

    video_segments.sort_by_key(|segment: &VideoSegment| segment.start_time);
    audio_segments.sort_by_key(|segment: &AudioSegment| segment.start_time);
    text_segments.sort_by_key(|segment: &TextSegment| segment.start_time);

    EditDecisionList {
        version: EDL_VERSION.to_string(),
        project_id: doc.id.clone(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        size: doc.size,
        duration: doc.duration_ms,
        fps: doc.fps,
        quality,
        video_segments,
        audio_segments,
        text_segments,
    }
}

fn video_segment(item: &TrackItem) -> VideoSegment {
    VideoSegment {
        id: item.id.clone(),
        name: item.name.clone(),
        start_time: item.display.from_ms,
        end_time: item.display.to_ms,
        duration: item.display.duration_ms(),
        trim_from: item.trim.from_ms,
        trim_to: item.trim.to_ms,
        speed: item.playback_rate,
        volume: item.volume,
        opacity: item.opacity,
        source_url: item.source_url.clone(),
    }
}

fn audio_segment(item: &TrackItem) -> AudioSegment {
    AudioSegment {
        id: item.id.clone(),
        name: item.name.clone(),
        start_time: item.display.from_ms,
        end_time: item.display.to_ms,
        duration: item.display.duration_ms(),
        trim_from: item.trim.from_ms,
        trim_to: item.trim.to_ms,
        speed: item.playback_rate,
        volume: item.volume,
        source_url: item.source_url.clone(),
    }
}

fn text_segment(item: &TrackItem, canvas: CanvasSize) -> TextSegment {
    let details = item.text.clone().unwrap_or_default();
    TextSegment {
        id: item.id.clone(),
        name: item.name.clone(),
        start_time: item.display.from_ms,
        end_time: item.display.to_ms,
        duration: item.display.duration_ms(),
        text: details.text,
        position: text_pixel_position(item.transform, canvas, details.box_width, details.font_size),
        box_width: details.box_width,
        font_size: details.font_size,
        font_family: details.font_family,
        color: details.color,
        align: details.align,
        border_width: details.border_width,
        border_color: details.border_color,
        shadow: details.shadow,
        animation: details.animation,
    }
}

/// Map a center-relative transform to a top-left pixel position.
///
/// Text is authored relative to the canvas center; rendering wants the box's
/// top-left corner. Both axes clamp to 0 so off-canvas transforms never
/// produce negative positions.
fn text_pixel_position(
    transform: Transform,
    canvas: CanvasSize,
    box_width: f64,
    font_size: f64,
) -> PixelPosition {
    let x = transform.x + canvas.width as f64 / 2.0 - box_width / 2.0;
    let y = transform.y + canvas.height as f64 / 2.0 - font_size / 2.0;
    PixelPosition {
        x: x.max(0.0),
        y: y.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipflow_timeline_model::{TimeWindow, TimelineDocument};
    use proptest::prelude::*;

    fn doc_from_items(items: &str) -> TimelineDocument {
        TimelineDocument::parse(&format!(
            r#"{{
                "id": "proj-1",
                "size": {{"width": 1080, "height": 1920}},
                "duration": 30000,
                "fps": 30,
                "trackItemsMap": {items}
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_segments_sorted_ascending_with_stable_ties() {
        let doc = doc_from_items(
            r#"{
                "late":    {"type": "video", "display": {"from": 9000, "to": 9500}},
                "tie-one": {"type": "video", "display": {"from": 2000, "to": 3000}},
                "tie-two": {"type": "video", "display": {"from": 2000, "to": 2500}},
                "early":   {"type": "video", "display": {"from": 0, "to": 1000}}
            }"#,
        );
        let edl = build(&doc, Quality::FullHd1080);

        let ids: Vec<_> = edl.video_segments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "tie-one", "tie-two", "late"]);
    }

    #[test]
    fn test_duration_always_recomputed_from_display() {
        let doc = doc_from_items(
            r#"{"a": {
                "type": "video",
                "display": {"from": 1000, "to": 4000},
                "duration": 999999
            }}"#,
        );
        let edl = build(&doc, Quality::FullHd1080);
        let segment = &edl.video_segments[0];
        assert_eq!(segment.duration, segment.end_time - segment.start_time);
        assert_eq!(segment.duration, 3000);
    }

    #[test]
    fn test_single_video_scenario() {
        let doc = doc_from_items(
            r#"{"clip": {
                "type": "video",
                "display": {"from": 0, "to": 5000},
                "trim": {"from": 1000, "to": 4000},
                "playbackRate": 2
            }}"#,
        );
        let edl = build(&doc, Quality::FullHd1080);

        assert_eq!(edl.video_segments.len(), 1);
        let segment = &edl.video_segments[0];
        assert_eq!(segment.duration, 5000);
        assert_eq!(segment.trim_from, 1000);
        assert_eq!(segment.trim_to, 4000);
        assert_eq!(segment.speed, 2.0);
    }

    #[test]
    fn test_text_position_derivation() {
        // Canvas 1080x1920, box 600, font 48, transform (0,0):
        // x = 0 + 540 - 300 = 240, y = 0 + 960 - 24 = 936.
        let doc = doc_from_items(
            r#"{"t": {
                "type": "text",
                "display": {"from": 0, "to": 3000},
                "details": {"text": "Title", "width": 600, "fontSize": 48}
            }}"#,
        );
        let edl = build(&doc, Quality::FullHd1080);
        let segment = &edl.text_segments[0];
        assert_eq!(segment.position.x, 240.0);
        assert_eq!(segment.position.y, 936.0);
    }

    #[test]
    fn test_text_position_clamps_at_zero() {
        let position = text_pixel_position(
            Transform {
                x: -4000.0,
                y: -4000.0,
            },
            CanvasSize {
                width: 1080,
                height: 1920,
            },
            600.0,
            48.0,
        );
        assert_eq!(position.x, 0.0);
        assert_eq!(position.y, 0.0);
    }

    #[test]
    fn test_image_and_unknown_items_excluded() {
        let doc = doc_from_items(
            r#"{
                "v": {"type": "video", "display": {"from": 0, "to": 100}},
                "i": {"type": "image", "display": {"from": 0, "to": 100}},
                "s": {"type": "sticker", "display": {"from": 0, "to": 100}}
            }"#,
        );
        let edl = build(&doc, Quality::FullHd1080);
        assert_eq!(edl.video_segments.len(), 1);
        assert!(edl.audio_segments.is_empty());
        assert!(edl.text_segments.is_empty());
    }

    #[test]
    fn test_edl_header_fields() {
        let doc = doc_from_items(r#"{}"#);
        let edl = build(&doc, Quality::Uhd4k);
        assert_eq!(edl.version, "2.0");
        assert_eq!(edl.project_id, "proj-1");
        assert_eq!(edl.fps, 30);
        assert_eq!(edl.duration, 30000);
        assert_eq!(edl.quality, Quality::Uhd4k);
    }

    #[test]
    fn test_edl_json_round_trip_is_lossless() {
        let doc = doc_from_items(
            r#"{
                "v": {
                    "type": "video",
                    "display": {"from": 250, "to": 7750},
                    "trim": {"from": 10, "to": 7500},
                    "playbackRate": 1.5,
                    "details": {"src": "https://cdn.example.com/v.mp4", "volume": 80, "opacity": 55}
                },
                "a": {
                    "type": "audio",
                    "display": {"from": 0, "to": 9000},
                    "details": {"src": "blob:music", "volume": 40}
                },
                "t": {
                    "type": "text",
                    "display": {"from": 100, "to": 2100},
                    "details": {"text": "Hi", "animation": {"kind": "fade", "duration": 500}}
                }
            }"#,
        );
        let edl = build(&doc, Quality::Hd720);
        let json = serde_json::to_string_pretty(&edl).unwrap();
        let parsed: EditDecisionList = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, edl);
    }

    #[test]
    fn test_media_segments_order_video_then_audio() {
        let doc = doc_from_items(
            r#"{
                "a": {"type": "audio", "display": {"from": 0, "to": 100}},
                "v": {"type": "video", "display": {"from": 0, "to": 100}}
            }"#,
        );
        let edl = build(&doc, Quality::FullHd1080);
        let kinds: Vec<_> = edl
            .media_segments()
            .iter()
            .map(|s| s.kind_label())
            .collect();
        assert_eq!(kinds, vec!["video", "audio"]);
        assert_eq!(edl.media_segments()[0].filename(), "v.mp4");
        assert_eq!(edl.media_segments()[1].filename(), "a.mp3");
    }

    fn arb_item_json(index: usize, from: u64, to_extra: u64) -> String {
        format!(
            r#""item-{index}": {{"type": "video", "display": {{"from": {from}, "to": {}}}}}"#,
            from + to_extra
        )
    }

    proptest! {
        #[test]
        fn prop_video_segments_sorted_by_start_time(
            windows in prop::collection::vec((0u64..100_000, 0u64..50_000), 0..24)
        ) {
            let items = windows
                .iter()
                .enumerate()
                .map(|(index, (from, extra))| arb_item_json(index, *from, *extra))
                .collect::<Vec<_>>()
                .join(",");
            let doc = doc_from_items(&format!("{{{items}}}"));
            let edl = build(&doc, Quality::FullHd1080);

            for pair in edl.video_segments.windows(2) {
                prop_assert!(pair[0].start_time <= pair[1].start_time);
            }
        }

        #[test]
        fn prop_duration_equals_end_minus_start(
            windows in prop::collection::vec((0u64..100_000, 0u64..50_000), 0..24)
        ) {
            let items = windows
                .iter()
                .enumerate()
                .map(|(index, (from, extra))| arb_item_json(index, *from, *extra))
                .collect::<Vec<_>>()
                .join(",");
            let doc = doc_from_items(&format!("{{{items}}}"));
            let edl = build(&doc, Quality::FullHd1080);

            for segment in &edl.video_segments {
                prop_assert_eq!(segment.duration, segment.end_time - segment.start_time);
            }
        }
    }

    #[test]
    fn test_trim_falls_back_to_zero_and_full_duration() {
        let doc = doc_from_items(
            r#"{"v": {"type": "video", "display": {"from": 2000, "to": 6000}}}"#,
        );
        let edl = build(&doc, Quality::FullHd1080);
        let segment = &edl.video_segments[0];
        assert_eq!(segment.trim_from, 0);
        assert_eq!(segment.trim_to, 4000);
        // Parser already resolved the fallback; builder carries it through.
        assert_eq!(doc.items[0].trim, TimeWindow::new(0, 4000));
    }
}

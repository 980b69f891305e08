#![no_main]
use libfuzzer_sys::fuzz_target;
use sag_config::{AnchorRow, Anchors};

fuzz_target!(|rows: Vec<(u16, f32)>| {
    let rows: Vec<AnchorRow> = rows
        .into_iter()
        .map(|(raw, length)| AnchorRow { raw, length })
        .collect();
    if let Ok(anchors) = Anchors::from_rows(&rows) {
        assert_eq!(rows.len(), 2);
        assert_ne!(anchors.raw_at_zero, anchors.raw_at_hundred);
    }
});

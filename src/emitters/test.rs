#![cfg(test)]

use crate::emitters::{json, kll};
use crate::error::{Diagnostics, Error};
use crate::finalize::{finalize, FinalData, PixelMapEntry};
use crate::merge::{merge, MergeContext};
use crate::types::KllFile;
use crate::{compile, CancelFlag, CompileRequest, Filestore, KllGroups};
use flexi_logger::Logger;
use std::sync::atomic::Ordering;

enum LogError {
    CouldNotStartLogger,
}

/// Lite logging setup
fn setup_logging_lite() -> Result<(), LogError> {
    match Logger::with_env_or_str("")
        .format(flexi_logger::colored_default_format)
        .format_for_files(flexi_logger::colored_detailed_format)
        .duplicate_to_stderr(flexi_logger::Duplicate::All)
        .start()
    {
        Err(_) => Err(LogError::CouldNotStartLogger),
        Ok(_) => Ok(()),
    }
}

fn pipeline(text: &str) -> (MergeContext, FinalData) {
    let mut diag = Diagnostics::new();
    let state = KllFile::from_str(text)
        .unwrap()
        .into_state("test.kll", &mut diag);
    let groups = KllGroups {
        base: vec![state],
        ..Default::default()
    };
    let merged = merge(&groups, &mut diag);
    assert!(!diag.has_errors(), "unexpected errors: {:?}", diag.errors);
    let data = finalize(&merged, &mut diag).unwrap();
    (merged, data)
}

#[test]
fn range_and_explicit_collision() {
    let (_, data) = pipeline("S[0x10-0x12] : U\"X\";\nS0x11 : U\"Y\";\n");

    // Three mappings; the explicit one wins for S0x11
    assert_eq!(data.layers[0].trigger_results.len(), 3);
    let t11 = data
        .trigger_macros
        .iter()
        .find(|t| t.text == "S0x11")
        .unwrap()
        .index;
    let (_, rpos) = data.layers[0]
        .trigger_results
        .iter()
        .find(|(tpos, _)| *tpos == t11)
        .unwrap();
    assert_eq!(data.result_macros[*rpos].text, "U\"Y\"");

    let t10 = data
        .trigger_macros
        .iter()
        .find(|t| t.text == "S0x10")
        .unwrap()
        .index;
    let (_, rpos) = data.layers[0]
        .trigger_results
        .iter()
        .find(|(tpos, _)| *tpos == t10)
        .unwrap();
    assert_eq!(data.result_macros[*rpos].text, "U\"X\"");
}

#[test]
fn range_expansion_preserves_semantics() {
    let (merged_range, data_range) = pipeline("S[0x43-0x45] : U\"X\";\n");
    let (merged_explicit, data_explicit) =
        pipeline("S0x43 : U\"X\";\nS0x44 : U\"X\";\nS0x45 : U\"X\";\n");
    assert_eq!(
        json::render(&merged_range, &data_range),
        json::render(&merged_explicit, &data_explicit)
    );
}

#[test]
fn range_range_collision_is_an_error() {
    let mut diag = Diagnostics::new();
    let state = KllFile::from_str("S[0x10-0x12] : U\"X\";\nS[0x11-0x13] : U\"Y\";\n")
        .unwrap()
        .into_state("test.kll", &mut diag);
    let groups = KllGroups {
        base: vec![state],
        ..Default::default()
    };
    let merged = merge(&groups, &mut diag);
    assert!(finalize(&merged, &mut diag).is_err());
}

#[test]
fn partial_layer_emits_own_entries_only() {
    let mut diag = Diagnostics::new();
    let base = KllFile::from_str("S0x10 : U\"A\";\nS0x11 : U\"B\";\n")
        .unwrap()
        .into_state("base.kll", &mut diag);
    let partial = KllFile::from_str("S0x11 : U\"C\";\n")
        .unwrap()
        .into_state("partial.kll", &mut diag);
    let groups = KllGroups {
        base: vec![base],
        partials: vec![vec![partial]],
        ..Default::default()
    };
    let merged = merge(&groups, &mut diag);
    let data = finalize(&merged, &mut diag).unwrap();

    assert_eq!(data.layers.len(), 2);
    assert_eq!(data.layers[0].trigger_results.len(), 2);
    // Layer 1 carries S0x11 only; S0x10 falls through to layer 0
    assert_eq!(data.layers[1].trigger_results.len(), 1);
    assert!(data.layers[1].scancode_map.contains_key(&0x11));
    assert!(!data.layers[1].scancode_map.contains_key(&0x10));
}

#[test]
fn pixel_map_density() {
    setup_logging_lite().ok();

    let (_, data) = pipeline("P[1](30:8) : S0x10;\nP[3](32:8) : S0x12;\n");
    assert_eq!(data.pixel_mapping.len(), 3);
    assert!(matches!(data.pixel_mapping[0], PixelMapEntry::Pixel { index: 1, .. }));
    assert!(matches!(data.pixel_mapping[1], PixelMapEntry::Blank { index: 2 }));
    assert!(matches!(data.pixel_mapping[2], PixelMapEntry::Pixel { index: 3, .. }));
}

#[test]
fn display_mapping_buckets_positions() {
    let (_, data) = pipeline(
        "P[1] <= x:0,y:0;\nP[2] <= x:19.05,y:0;\nP[3] <= x:0,y:19.05;\n",
    );
    assert_eq!(data.pixel_display_mapping.len(), 2);
    assert_eq!(data.pixel_display_mapping[0], vec![1, 2]);
    assert_eq!(data.pixel_display_mapping[1], vec![3, 0]);
}

#[test]
fn json_top_level_contract() {
    let (merged, data) = pipeline("scanRate = 5;\nS0x10 : U\"A\";\n");
    let value = json::render(&merged, &data);
    let object = value.as_object().unwrap();
    let mut keys: Vec<_> = object.keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        [
            "animations",
            "capabilities",
            "compiler_version",
            "kll_version",
            "layers",
            "pixel_display_mapping",
            "pixel_mapping",
            "pixel_positions",
            "result_macros",
            "scancode_positions",
            "trigger_macros",
            "variables",
        ]
    );
    assert_eq!(value["variables"]["scanRate"], "5");
}

#[test]
fn compile_pipeline_end_to_end() {
    let mut filestore = Filestore::new();
    filestore.insert("base.kll", "S0x10 : U\"A\";\n".to_string());
    filestore.insert("default.kll", "S0x10 :+ U\"B\";\n".to_string());
    let request = CompileRequest {
        base_files: vec!["base.kll".into()],
        default_files: vec!["default.kll".into()],
        ..Default::default()
    };
    let mut diag = Diagnostics::new();
    let cancel = CancelFlag::default();
    let (merged, data) = compile(&filestore, &request, &cancel, &mut diag).unwrap();
    assert_eq!(
        merged
            .globals
            .keymap
            .get("S0x10")
            .unwrap()
            .mapping
            .2
            .to_string(),
        "U\"A\", U\"B\""
    );
    assert_eq!(data.layers.len(), 1);
}

#[test]
fn compile_accumulates_parse_errors() {
    let mut filestore = Filestore::new();
    filestore.insert("a.kll", "U\"NotAKey\" : U\"A\";\n".to_string());
    filestore.insert("b.kll", "U\"AlsoNotAKey\" : U\"B\";\n".to_string());
    let request = CompileRequest {
        base_files: vec!["a.kll".into(), "b.kll".into()],
        ..Default::default()
    };
    let mut diag = Diagnostics::new();
    let cancel = CancelFlag::default();
    assert!(matches!(
        compile(&filestore, &request, &cancel, &mut diag),
        Err(Error::Failed(2))
    ));
    assert_eq!(diag.errors.len(), 2);
}

#[test]
fn compile_honors_cancellation() {
    let filestore = Filestore::new();
    let request = CompileRequest::default();
    let mut diag = Diagnostics::new();
    let cancel = CancelFlag::default();
    cancel.store(true, Ordering::Relaxed);
    assert!(matches!(
        compile(&filestore, &request, &cancel, &mut diag),
        Err(Error::Cancelled)
    ));
}

#[test]
fn kll_roundtrip_idempotent() {
    let source = "\
myCap => myFunc(arg1:1, arg2:2);
flashMode => flashModeFunc();
Name => CDef;
scanRate = 5;
\"Friendly Name\" = \"Test Board\";
arr[] = a, b, c;
S0x2B <= x:18.5,y:20;
P[1] <= x:1,y:2;
P[1](30:8) : S0x2B;
A[Fade] <= start, loop:3;
A[Fade, 0] <= P[1](255,255,255);
S0x2B : U\"Tab\";
U\"A\" + U\"B\" : U\"C\";
S0x10(P,UP) : myCap(0x1, 2);
S0x11 :: U\"Esc\";
I\"NumLock\" i: U\"F1\";
";
    let render_once = |text: &str| {
        let mut diag = Diagnostics::new();
        let state = KllFile::from_str(text)
            .unwrap()
            .into_state("test.kll", &mut diag);
        let groups = KllGroups {
            base: vec![state],
            ..Default::default()
        };
        let merged = merge(&groups, &mut diag);
        assert!(!diag.has_errors(), "unexpected errors: {:?}", diag.errors);
        kll::render(&merged)
    };
    let first = render_once(source);
    let second = render_once(&first);
    assert_eq!(first, second);
}

#[cfg(test)]
mod tests {
    use crate::context::Value;
    use crate::error::{Diagnostics, Error};
    use crate::merge::merge;
    use crate::types::*;
    use crate::KllGroups;

    fn organize<'a>(text: &'a str, file: &str, diag: &mut Diagnostics) -> crate::KllState<'a> {
        KllFile::from_str(text).unwrap().into_state(file, diag)
    }

    #[test]
    fn test_define() {
        let result = KllFile::from_str("myDefine => myCDefine;\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_quoted() {
        let result = KllFile::from_str("\"Foo Bar\" = \"Baz Cubed\";\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_array() {
        let result = KllFile::from_str("Name_Foo[0] = myKeymapFile;\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_capability() {
        let result = KllFile::from_str("myCapability => myCFunction(arg1:1, arg2:2);\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_scancode() {
        let result = KllFile::from_str("S100 : U\"A\";\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_pixelmap() {
        let result = KllFile::from_str("P[5](30:8) : S13;\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_position() {
        let result = KllFile::from_str("P[30] <= x:20,rx:15;\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_animation() {
        let result = KllFile::from_str("A[MyEyesAreBleeding] <= start, loop:3;\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_frame() {
        let result = KllFile::from_str("A[Bleeed, 5] <= P[2](255,255,255);\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_result() {
        let result = KllFile::from_str("S100 : P[23](+43,+21,-40);\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_unknown_usage() {
        let text = "U\"NotAKey\" : U\"A\";\n";
        let err = KllFile::from_str(text).unwrap_err();
        assert!(matches!(
            Error::from_pest("test.kll", text, err),
            Error::Semantic { .. }
        ));
    }

    #[test]
    fn test_illegal_character() {
        let text = "@ foo;\n";
        let err = KllFile::from_str(text).unwrap_err();
        assert!(matches!(
            Error::from_pest("test.kll", text, err),
            Error::Tokenizer { .. }
        ));
    }

    #[test]
    fn test_trailing_comma() {
        let result = KllFile::from_str("U\"A\", : U\"B\";\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_schedule_distinct() {
        let mut diag = Diagnostics::new();
        let scheduled = organize("U\"A\"() : U\"B\";\n", "a.kll", &mut diag);
        let bare = organize("U\"A\" : U\"B\";\n", "b.kll", &mut diag);
        let scheduled_key = scheduled.keymap.keys().next().unwrap();
        let bare_key = bare.keymap.keys().next().unwrap();
        assert_eq!(scheduled_key, "U\"A\"()");
        assert_eq!(bare_key, "U\"A\"");
        assert_ne!(scheduled_key, bare_key);
    }

    #[test]
    fn test_analog_pulse() {
        // U"A"(0) is an analog pulse, not state O with a timing
        let kll = KllFile::from_str("U\"A\"(0) : U\"B\";\n").unwrap();
        let (_, statement) = &kll.statements[0];
        let mapping = match statement {
            Statement::Keymap(mapping) => mapping,
            _ => panic!("expected a keymap statement"),
        };
        let trigger = mapping.0.iter().next().unwrap();
        let schedule = trigger.state.as_ref().unwrap();
        assert_eq!(schedule.params.len(), 1);
        assert_eq!(schedule.params[0].state, None);
        assert_eq!(schedule.params[0].analog, Some(0));
        assert_eq!(schedule.params[0].time, None);
    }

    #[test]
    fn test_duplicate_schedule_state() {
        let mut diag = Diagnostics::new();
        organize("S0x10(P,P) : U\"A\";\n", "test.kll", &mut diag);
        assert_eq!(diag.errors.len(), 1);
        assert!(matches!(diag.errors[0], Error::Semantic { .. }));
    }

    #[test]
    fn test_last_writer_wins() {
        let mut diag = Diagnostics::new();
        let state = organize("U\"A\" : U\"B\";\nU\"A\" : U\"C\";\n", "test.kll", &mut diag);
        assert_eq!(state.keymap.len(), 1);
        let entry = state.keymap.values().next().unwrap();
        assert_eq!(entry.mapping.2.to_string(), "U\"C\"");
        assert_eq!(diag.warnings.len(), 1);
    }

    #[test]
    fn test_combo_canonical_order() {
        let mut diag = Diagnostics::new();
        let state = organize(
            "U\"B\" + U\"A\" : U\"C\";\nU\"A\" + U\"B\" : U\"D\";\n",
            "test.kll",
            &mut diag,
        );
        // Same combo either way written; the second shadows the first
        assert_eq!(state.keymap.len(), 1);
        assert_eq!(state.keymap.keys().next().unwrap(), "U\"A\" + U\"B\"");
        assert_eq!(diag.warnings.len(), 1);
    }

    #[test]
    fn test_add_to_existing_across_contexts() {
        let mut diag = Diagnostics::new();
        let base = organize("U\"A\" : U\"B\";\n", "base.kll", &mut diag);
        let default = organize("U\"A\" :+ U\"C\";\n", "default.kll", &mut diag);
        let groups = KllGroups {
            base: vec![base],
            default: vec![default],
            ..Default::default()
        };
        let merged = merge(&groups, &mut diag);
        assert!(!diag.has_errors());
        let entry = merged.globals.keymap.get("U\"A\"").unwrap();
        assert_eq!(entry.mapping.2.to_string(), "U\"B\", U\"C\"");
    }

    #[test]
    fn test_add_elides_duplicates() {
        let mut diag = Diagnostics::new();
        let state = organize("U\"A\" : U\"B\";\nU\"A\" :+ U\"B\";\n", "test.kll", &mut diag);
        let entry = state.keymap.get("U\"A\"").unwrap();
        assert_eq!(entry.mapping.2.to_string(), "U\"B\"");
    }

    #[test]
    fn test_remove_deletes_empty_mapping() {
        let mut diag = Diagnostics::new();
        let state = organize("U\"A\" : U\"B\";\nU\"A\" :- U\"B\";\n", "test.kll", &mut diag);
        assert!(state.keymap.is_empty());
    }

    #[test]
    fn test_isolation_survives_partial_override() {
        let mut diag = Diagnostics::new();
        let base = organize("U\"A\" :: U\"Z\";\n", "base.kll", &mut diag);
        let partial = organize("U\"A\" : U\"Q\";\n", "partial.kll", &mut diag);
        let groups = KllGroups {
            base: vec![base],
            partials: vec![vec![partial]],
            ..Default::default()
        };
        let merged = merge(&groups, &mut diag);
        let entry = merged.partials[0].get("U\"A\"").unwrap();
        assert_eq!(entry.mapping.2.to_string(), "U\"Z\"");
        assert!(diag
            .warnings
            .iter()
            .any(|w| w.message.contains("isolated")));
    }

    #[test]
    fn test_isolation_explicit_override() {
        let mut diag = Diagnostics::new();
        let base = organize("U\"A\" :: U\"Z\";\n", "base.kll", &mut diag);
        let default = organize("U\"A\" :: U\"Q\";\n", "default.kll", &mut diag);
        let groups = KllGroups {
            base: vec![base],
            default: vec![default],
            ..Default::default()
        };
        let merged = merge(&groups, &mut diag);
        let entry = merged.globals.keymap.get("U\"A\"").unwrap();
        assert_eq!(entry.mapping.2.to_string(), "U\"Q\"");
    }

    #[test]
    fn test_array_element_patch() {
        let mut diag = Diagnostics::new();
        let state = organize(
            "arr[] = a, b, c;\narr[1] = x;\n",
            "test.kll",
            &mut diag,
        );
        assert_eq!(
            state.variables.get("arr"),
            Some(&Value::List(vec!["a", "x", "c"]))
        );
    }

    #[test]
    fn test_capability_signature_conflict() {
        let mut diag = Diagnostics::new();
        let base = organize("myCap => myFunc(a:1);\n", "base.kll", &mut diag);
        let default = organize("myCap => myFunc(a:2);\n", "default.kll", &mut diag);
        let groups = KllGroups {
            base: vec![base],
            default: vec![default],
            ..Default::default()
        };
        merge(&groups, &mut diag);
        assert!(diag.errors.iter().any(|e| matches!(e, Error::Merge(_))));
    }

    #[test]
    fn test_position_axis_merge() {
        let mut diag = Diagnostics::new();
        let state = organize("S0x10 <= x:5;\nS0x10 <= y:7;\n", "test.kll", &mut diag);
        let pos = state.positions.get(&0x10).unwrap();
        assert_eq!(pos.x, Some(5.0));
        assert_eq!(pos.y, Some(7.0));
    }

    #[test]
    fn test_schedule_bracket_canonicalization() {
        let mut diag = Diagnostics::new();
        let plain = organize("S0x43(P,UP,UR) : U\"Enter\";\n", "a.kll", &mut diag);
        let bracket = organize("S[0x43(P,UP,UR)] : U\"Enter\";\n", "b.kll", &mut diag);
        assert_eq!(
            plain.keymap.keys().next().unwrap(),
            bracket.keymap.keys().next().unwrap()
        );
        assert_eq!(plain.keymap.keys().next().unwrap(), "S0x43(P,UP,UR)");
    }

    #[test]
    fn test_scancode_collection() {
        let mut diag = Diagnostics::new();
        let state = organize(
            "S0x10 : U\"A\";\nS0x11 + S0x12 : U\"B\";\n",
            "test.kll",
            &mut diag,
        );
        let mut codes = state.scancodes();
        codes.sort_unstable();
        assert_eq!(codes, vec![0x10, 0x11, 0x12]);
    }

    #[test]
    fn test_timing_in_result() {
        let mut diag = Diagnostics::new();
        let state = organize("U\"v\" : U\"a\"(P,H:300ms,R);\n", "test.kll", &mut diag);
        let action = state.actions().next().unwrap();
        let schedule = action.state.as_ref().unwrap();
        assert_eq!(schedule.params.len(), 3);
        assert_eq!(schedule.params[0].state, Some(ScheduleState::Press));
        assert_eq!(schedule.params[1].state, Some(ScheduleState::Hold));
        assert_eq!(
            schedule.params[1].time,
            Some(Timing {
                amount: 300,
                unit: TimeUnit::Milliseconds
            })
        );
        assert_eq!(schedule.params[2].state, Some(ScheduleState::Release));
    }
}

use super::*;
use crate::text::quote;

const PAD: &str = r#"
overlays = 2
overlay0_name = "landscape-1"
overlay0_aspect_ratio = 16:9
overlay0_desc0 = "a,0.2,0.4,rect,0.05,0.05"
overlay0_desc1 = "b,0.5,0.5,radial,0.1,0.08"
overlay0_desc2 = "c,0.8,0.6,rect,0.05,0.05"
overlay1_name = "landscape-2"
overlay1_desc0 = "x,0.5,0.5,rect,0.05,0.05"
overlay1_desc0_next_target = "landscape-1"
"#;

fn session_with(settings: EditorSettings) -> EditorSession {
    let mut session = EditorSession::new(settings);
    session.load(PAD).expect("fixture");
    session
}

fn session() -> EditorSession {
    session_with(EditorSettings::default())
}

fn snapping() -> EditorSettings {
    EditorSettings {
        grid_snap: true,
        ..EditorSettings::default()
    }
}

fn ids(session: &EditorSession) -> Vec<ButtonId> {
    session
        .document()
        .current_buttons()
        .iter()
        .map(|b| b.id())
        .collect()
}

fn x_of(session: &EditorSession, index: usize) -> f64 {
    session.document().current_buttons()[index].x
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn load_resets_history_and_selection() {
    let mut session = session();
    let first = ids(&session)[0];
    session.select_button(Some(first));
    session.nudge(0.1, 0.0);
    assert!(session.can_undo());

    session.load(PAD).expect("reload");
    assert!(!session.can_undo());
    assert_eq!(session.selection().current(), None);
    assert_eq!(session.screen().width, 800.0);
}

#[test]
fn failed_load_keeps_previous_state() {
    let mut session = session();
    session.select_button(ids(&session).first().copied());
    session.nudge(0.1, 0.0);
    let before = session.serialize();

    let err = session.load("overlay0_desc0 = \"a,1\"").unwrap_err();
    assert!(matches!(err, EditorError::Parse(_)));
    assert_eq!(session.serialize(), before);
    assert_eq!(session.history().undo_len(), 1);
}

#[test]
fn undo_restores_and_redo_reapplies() {
    let mut session = session();
    let original = session.serialize();
    session.select_button(ids(&session).first().copied());

    assert_eq!(session.nudge(0.05, 0.0), 1);
    let nudged = session.serialize();
    assert_ne!(nudged, original);

    assert!(session.undo());
    assert_eq!(session.serialize(), original);
    assert_eq!(session.selection().current(), None);

    assert!(session.redo());
    assert_eq!(session.serialize(), nudged);
    assert!(!session.redo());
}

#[test]
fn new_edit_after_undo_clears_redo() {
    let mut session = session();
    let all = ids(&session);
    session.select_button(Some(all[0]));
    session.nudge(0.05, 0.0);
    assert!(session.undo());
    assert!(session.can_redo());

    let all = ids(&session);
    session.select_button(Some(all[1]));
    session.nudge(0.0, 0.05);
    assert!(!session.can_redo());
    assert!(!session.redo());
}

fn unreadable_snapshot(description: &str) -> HistorySnapshot {
    HistorySnapshot {
        text: "not a pair\n".to_string(),
        current_overlay: Some(0),
        description: description.to_string(),
    }
}

#[test]
fn unreadable_snapshot_leaves_history_untouched() {
    let mut session = session();
    let before = session.serialize();

    session.history.push(unreadable_snapshot("Broken"));
    assert!(!session.undo());
    assert_eq!(session.history().undo_len(), 1);
    assert_eq!(session.history().redo_len(), 0);
    assert_eq!(session.serialize(), before);

    let parked = session
        .history
        .undo(unreadable_snapshot(""))
        .expect("entry moves to the redo stack");
    assert_eq!(parked.description, "Broken");
    assert!(!session.redo());
    assert_eq!(session.history().undo_len(), 0);
    assert_eq!(session.history().redo_len(), 1);
    assert_eq!(session.history().redo_description(), Some("Broken"));
    assert_eq!(session.serialize(), before);
}

#[test]
fn failed_edits_record_nothing() {
    let mut session = session();
    assert!(matches!(session.flip_x(), Err(EditorError::NotFound(_))));
    assert!(matches!(
        session.apply_section_value(Section::X, 0.3),
        Err(EditorError::NotFound(_))
    ));

    session.select_button(ids(&session).first().copied());
    assert!(matches!(
        session.apply_section_value(Section::W, 0.9),
        Err(EditorError::Validation(_))
    ));
    assert!(matches!(
        session.create_overlay("landscape-2", Vec::new()),
        Err(EditorError::Validation(_))
    ));
    assert!(!session.delete_button(ButtonId(9_999)));
    assert!(!session.can_undo());
}

#[test]
fn undo_restores_current_overlay_index() {
    let mut session = session();
    session.select_overlay(1).expect("overlay");
    session.select_all();
    session.nudge(0.0, 0.1);

    assert!(session.undo());
    assert_eq!(session.document().current_overlay_index(), Some(1));
    assert_close(session.document().current_buttons()[0].y, 0.5);
}

#[test]
fn history_limit_follows_settings() {
    let mut session = session_with(EditorSettings {
        history_limit: 3,
        ..EditorSettings::default()
    });
    session.select_button(ids(&session).first().copied());
    for _ in 0..5 {
        session.nudge(0.01, 0.0);
    }
    assert_eq!(session.history().undo_len(), 3);
}

#[test]
fn gesture_step_pushes_once_per_gesture() {
    let mut session = session();
    session.begin_gesture();
    assert!(session.gesture_step("Move/Resize"));
    assert!(!session.gesture_step("Move/Resize"));
    session.begin_gesture();
    assert!(session.gesture_step("Move/Resize"));
    assert_eq!(session.history().undo_len(), 2);
}

#[test]
fn slider_scrub_records_one_undo() {
    let mut session = session();
    session.select_button(ids(&session).first().copied());
    session.begin_gesture();
    for value in [0.3, 0.31, 0.32] {
        session
            .scrub_section_value(Section::X, value)
            .expect("scrub");
    }
    assert_eq!(session.history().undo_len(), 1);
    assert_close(x_of(&session, 0), 0.32);

    assert!(session.undo());
    assert_close(x_of(&session, 0), 0.2);
}

#[test]
fn drag_moves_group_from_start_positions() {
    let mut session = session_with(snapping());
    let all = ids(&session);
    session.select_in_bounds(SelectionRect::new(0.0, 0.0, 0.6, 0.6));
    assert_eq!(session.selection().selected(), &all[..2]);

    session.begin_drag(all[0]).expect("drag");
    assert_eq!(session.drag_by(0.0005, 0.0).expect("tiny"), 0);
    assert!(!session.can_undo());

    assert_eq!(session.drag_by(0.01, 0.0).expect("move"), 2);
    assert_eq!(session.drag_by(0.013, 0.0).expect("move"), 2);
    session.end_gesture();

    assert_close(x_of(&session, 0), 0.22);
    assert_close(x_of(&session, 1), 0.52);
    assert_close(x_of(&session, 2), 0.8);
    assert_eq!(session.history().undo_len(), 1);
    assert_eq!(session.drag_by(0.5, 0.5).expect("no gesture"), 0);
}

#[test]
fn dragging_outside_group_selects_single_button() {
    let mut session = session();
    let all = ids(&session);
    session.select_in_bounds(SelectionRect::new(0.0, 0.0, 0.6, 0.6));
    session.begin_drag(all[2]).expect("drag");
    assert!(!session.selection().is_group_selected());
    assert_eq!(session.selection().current(), Some(all[2]));

    session.drag_by(-0.1, 0.0).expect("move");
    assert_close(x_of(&session, 2), 0.7);
    assert_close(x_of(&session, 0), 0.2);
}

#[test]
fn resize_gesture_is_relative_to_grab() {
    let mut session = session();
    let all = ids(&session);
    session
        .begin_resize(all[1], ResizeHandle::E)
        .expect("resize");
    session.drag_by(0.1, 0.0).expect("first");
    session.drag_by(0.2, 0.0).expect("second");

    let button = &session.document().current_buttons()[1];
    assert_close(button.w, 0.2);
    assert_close(button.x, 0.5);
    assert_eq!(session.history().undo_len(), 1);
    assert!(matches!(
        session.begin_resize(ButtonId(9_999), ResizeHandle::N),
        Err(EditorError::NotFound(_))
    ));
}

#[test]
fn section_values_target_group_or_current_line() {
    let mut session = session_with(snapping());
    let all = ids(&session);
    session.select_button(Some(all[0]));
    assert_eq!(session.apply_section_value(Section::X, 0.333).expect("x"), 1);
    assert_close(x_of(&session, 0), 0.34);

    session.select_all();
    assert_eq!(session.apply_section_value(Section::W, 0.07).expect("w"), 3);
    for button in session.document().current_buttons() {
        assert_eq!(button.w, 0.07);
    }
    let dims = session.selection_dimensions().expect("dims");
    assert_eq!(dims.w, 0.07);
}

#[test]
fn single_rubber_band_hit_becomes_current_line() {
    let mut session = session();
    let all = ids(&session);
    let hits = session.select_in_bounds(SelectionRect::new(0.15, 0.35, 0.25, 0.45));
    assert_eq!(hits, vec![all[0]]);
    assert!(!session.selection().is_group_selected());
    assert_eq!(session.selection().current(), Some(all[0]));
}

#[test]
fn delete_selected_and_undo() {
    let mut session = session();
    session.select_all();
    assert_eq!(session.delete_selected(), 3);
    assert!(session.document().current_buttons().is_empty());
    assert_eq!(session.delete_selected(), 0);

    assert!(session.undo());
    assert_eq!(session.document().current_buttons().len(), 3);
}

#[test]
fn batch_edit_validates_before_touching_buttons() {
    let mut session = session();
    session.clear_selection();
    assert!(matches!(
        session.apply_batch_edit(BatchEdit::default()),
        Err(EditorError::NotFound(_))
    ));

    session.select_all();
    let before = session.serialize();
    let bad = BatchEdit {
        command: Some("two words".to_string()),
        shape: Some(Shape::Radial),
        ..BatchEdit::default()
    };
    assert!(matches!(
        session.apply_batch_edit(bad),
        Err(EditorError::Validation(_))
    ));
    assert_eq!(session.serialize(), before);
    assert!(!session.can_undo());

    let good = BatchEdit {
        command: Some("turbo".to_string()),
        image: Some(Some("turbo.png".to_string())),
        shape: Some(Shape::Radial),
    };
    assert_eq!(session.apply_batch_edit(good).expect("batch"), 3);
    for button in session.document().current_buttons() {
        assert_eq!(button.command, "turbo");
        assert_eq!(button.image.as_deref(), Some("turbo.png"));
        assert_eq!(button.shape, Shape::Radial);
    }
    assert_eq!(session.history().undo_len(), 1);
}

#[test]
fn generated_overlays_use_free_names_and_defaults() {
    let mut session = session();
    let name = session.add_generated_overlay(false, false).expect("new");
    assert_eq!(name, "landscape-3");
    let overlay = session.document().current_overlay().expect("current");
    assert_eq!(overlay.header.len(), 4);
    assert!(overlay.buttons.is_empty());

    session.select_overlay(0).expect("first");
    let copy = session.add_generated_overlay(true, true).expect("copy");
    assert_eq!(copy, "portrait-4");
    assert_eq!(session.document().current_buttons().len(), 3);

    assert!(session.undo());
    assert_eq!(session.document().overlays().len(), 3);
    assert_eq!(session.document().current_overlay_index(), Some(0));
}

#[test]
fn rename_follows_next_target_and_undoes() {
    let mut session = session();
    session.edit_overlay("main", Vec::new()).expect("rename");
    let target = session.document().overlay(1).expect("second").buttons[0]
        .extra_value("next_target")
        .map(str::to_string);
    assert_eq!(target, Some(quote("main")));

    assert!(session.undo());
    assert_eq!(session.document().overlay_names(), vec!["landscape-1", "landscape-2"]);
}

#[test]
fn delete_overlay_moves_to_first() {
    let mut session = session();
    session.select_overlay(1).expect("second");
    assert_eq!(session.delete_overlay().expect("delete"), "landscape-2");
    assert_eq!(session.document().current_overlay_index(), Some(0));
    assert!(matches!(
        session.select_overlay(4),
        Err(EditorError::NotFound(_))
    ));
}

#[test]
fn duplicate_selection_uses_configured_offset() {
    let mut session = session();
    let all = ids(&session);
    session.select_button(Some(all[2]));
    let copies = session.duplicate_selection().expect("duplicate");
    assert_eq!(copies.len(), 1);

    let buttons = session.document().current_buttons();
    assert_eq!(buttons.len(), 4);
    assert_eq!(buttons[3].id(), copies[0]);
    assert_close(buttons[3].x, 0.82);
    assert_close(buttons[3].y, 0.62);
    assert_eq!(session.selection().current(), Some(copies[0]));

    session.clear_selection();
    assert!(session.duplicate_selection().is_err());
}

#[test]
fn align_and_distribute_need_a_group() {
    let mut session = session();
    let all = ids(&session);
    session.select_button(Some(all[0]));
    assert_eq!(session.align(AlignMode::Top), 0);
    assert_eq!(session.distribute(Axis::X), 0);
    assert!(!session.can_undo());

    session.select_all();
    assert_eq!(session.align(AlignMode::Top), 3);
    for button in session.document().current_buttons() {
        assert_close(button.top(), 0.35);
    }
    assert_eq!(session.distribute(Axis::X), 3);
    assert_eq!(session.history().undo_len(), 2);
}

#[test]
fn fix_aspect_adopts_target_resolution() {
    let mut session = session();
    session.select_all();
    let count = session
        .fix_aspect((16.0, 9.0), (1024.0, 768.0), false)
        .expect("fix");
    assert_eq!(count, 3);
    assert_close(x_of(&session, 2), 0.9);
    assert_eq!(
        (session.screen().width, session.screen().height),
        (1024.0, 768.0)
    );
    assert!(!session.selection().is_group_selected());

    session.fix_aspect((4.0, 3.0), (16.0, 9.0), true).expect("ratio only");
    assert_eq!(session.screen().width, 1024.0);
}

#[test]
fn squaring_uses_session_screen() {
    let mut session = session();
    session.select_button(ids(&session).first().copied());
    session.set_screen_size(1000.0, 500.0).expect("screen");
    assert_close(session.normalize_width().expect("w"), 0.025);
    assert_close(session.normalize_height().expect("h"), 0.05);
    assert!(session.set_screen_size(0.0, 10.0).is_err());
}

#[test]
fn pad_view_marks_selection() {
    let mut session = session();
    let all = ids(&session);
    session.select_in_bounds(SelectionRect::new(0.0, 0.0, 0.6, 0.6));
    let pad = session.build_pad();
    let selected: Vec<ButtonId> = pad.iter().filter(|b| b.selected).map(|b| b.id).collect();
    assert_eq!(selected, all[..2].to_vec());
}

#[test]
fn reset_empties_the_session() {
    let mut session = session();
    session.select_all();
    session.nudge(0.01, 0.01);
    session.reset();
    assert!(session.document().overlays().is_empty());
    assert!(!session.can_undo());
    assert!(matches!(
        session.create_button(ButtonSpec::new("a", Shape::Rect)),
        Err(EditorError::NotFound(_))
    ));
}

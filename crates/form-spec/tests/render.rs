use form_spec::{
    FieldValue, Form, FormSpec, SubmissionPhase, Widget, build_view, render_json_ui, render_text,
};

fn fixture() -> FormSpec {
    serde_json::from_str(include_str!("fixtures/signup_form.json")).expect("deserialize")
}

#[test]
fn view_maps_field_types_to_widgets() {
    let form = Form::new(fixture()).expect("form");
    let view = form.view();

    assert_eq!(view.form_id, "signup");
    assert_eq!(view.fields.len(), 10);
    assert!(matches!(
        view.field("email").expect("email").widget,
        Widget::Input { input_type: "email", .. }
    ));
    assert!(matches!(
        &view.field("role").expect("role").widget,
        Widget::Select { placeholder, options } if placeholder == "Select..." && options.len() == 2
    ));
    assert!(matches!(
        view.field("bio").expect("bio").widget,
        Widget::Textarea { rows: 6, .. }
    ));
    assert!(matches!(
        &view.field("resume").expect("resume").widget,
        Widget::FileInput { accept: Some(accept), multiple: false } if accept == ".pdf,application/pdf"
    ));
}

#[test]
fn checkbox_label_moves_into_widget() {
    let view = Form::new(fixture()).expect("form").view();
    let newsletter = view.field("newsletter").expect("newsletter");
    assert_eq!(newsletter.label, None);
    assert!(matches!(
        &newsletter.widget,
        Widget::Checkbox { label: Some(label) } if label == "Send me the newsletter"
    ));
}

#[test]
fn errors_show_only_for_touched_fields_and_hide_helper_text() {
    let mut form = Form::new(fixture()).expect("form");
    form.change("bio", "x".repeat(201)).expect("change");

    let view = form.view();
    let bio = view.field("bio").expect("bio");
    assert_eq!(bio.error, None);
    assert!(bio.helper_text.is_some());

    form.blur("bio").expect("blur");
    let view = form.view();
    let bio = view.field("bio").expect("bio");
    assert_eq!(bio.error.as_deref(), Some("Maximum length is 200 characters"));
    assert_eq!(bio.helper_text, None);
}

#[test]
fn disabled_inline_errors_keep_fields_clean() {
    let mut spec = fixture();
    spec.settings.inline_errors = false;
    let mut form = Form::new(spec).expect("form");
    form.blur("name").expect("blur");

    assert_eq!(form.state().error("name"), Some("Full name is required"));
    assert_eq!(form.view().field("name").expect("name").error, None);
}

#[test]
fn loading_form_disables_actions_and_fields() {
    let mut spec = fixture();
    spec.settings.loading = true;
    let view = Form::new(spec).expect("form").view();

    assert_eq!(view.submit_label, "Loading...");
    assert!(!view.submit_enabled);
    assert!(view.fields.iter().all(|field| field.disabled));
}

#[test]
fn text_rendering_lists_visible_fields() {
    let mut form = Form::new(fixture()).expect("form");
    form.change("name", "Ada").expect("change");
    let text = render_text(&form.view());

    assert!(text.starts_with("Form: Create your account (signup)"));
    assert!(text.contains("Status: idle"));
    assert!(text.contains(" - name (Full name) * = Ada"));
    assert!(!text.contains("admin_code"));
    assert!(text.ends_with("[Create account]"));
}

#[test]
fn text_rendering_shows_errors_and_cancel() {
    let spec = fixture();
    let mut form = Form::new(spec).expect("form").on_cancel(|| {});
    form.blur("email").expect("blur");
    let text = render_text(&form.view());

    assert!(text.contains("   ! Email is required"));
    assert!(text.ends_with("[Create account] [Cancel]"));
}

#[test]
fn json_ui_exposes_structure() {
    let mut form = Form::new(fixture()).expect("form");
    form.change("role", "admin").expect("change");
    form.change("newsletter", true).expect("change");
    let ui = render_json_ui(&form.view());

    assert_eq!(ui["form_id"], "signup");
    assert_eq!(ui["phase"], "idle");
    assert_eq!(ui["layout"]["columns"], 2);
    assert_eq!(ui["layout"]["gap"], 6);
    assert_eq!(ui["actions"]["submit"]["label"], "Create account");
    assert!(ui["actions"]["cancel"].is_null());

    let fields = ui["fields"].as_array().expect("fields array");
    let admin = fields
        .iter()
        .find(|field| field["name"] == "admin_code")
        .expect("admin_code");
    assert_eq!(admin["visible"], true);
    let newsletter = fields
        .iter()
        .find(|field| field["name"] == "newsletter")
        .expect("newsletter");
    assert_eq!(newsletter["value"], true);
    assert_eq!(newsletter["widget"]["widget"], "checkbox");
}

#[test]
fn view_can_be_built_from_raw_parts() {
    let spec = fixture();
    let mut state = form_spec::FormState::new(&spec);
    state
        .change(&spec, "name", FieldValue::from("Grace"))
        .expect("change");
    let view = build_view(&spec, &state);
    assert_eq!(view.phase, SubmissionPhase::Idle);
    assert_eq!(
        view.field("name").map(|field| &field.value),
        Some(&FieldValue::from("Grace"))
    );
}

//! Tests for select state driven through a form.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use datum::prelude::*;
use datum_select::{Select, SelectOptions};

fn fruits() -> Vec<Value> {
    vec![
        Value::from("apple"),
        Value::from("banana"),
        Value::from("apricot"),
    ]
}

#[test]
fn test_single_select_sets_field_and_closes() {
    let form = Form::default();
    let select = Select::new(&form, SelectOptions::new("fruit"), fruits());
    select.open();
    assert!(select.is_open());

    select.handle_change(Value::from("banana"));

    assert_eq!(form.get("fruit"), Some(Value::from("banana")));
    assert!(!select.is_open());
    assert!(select.check(&Value::from("banana")));
    assert_eq!(select.result(), vec!["banana".to_string()]);
}

#[test]
fn test_click_active_option_in_single_mode_is_ignored() {
    let form = Form::default();
    let select = Select::new(&form, SelectOptions::new("fruit"), fruits());
    select.click_option(0);
    select.open();

    select.click_option(0);

    assert!(select.is_open());
    assert_eq!(form.get("fruit"), Some(Value::from("apple")));
}

#[test]
fn test_multiple_toggles_items() {
    let form = Form::default();
    let select = Select::new(&form, SelectOptions::new("fruits").multiple(), fruits());
    assert_eq!(form.get("fruits"), Some(Value::Array(vec![])));

    select.click_option(0);
    select.click_option(2);
    assert_eq!(form.get("fruits"), Some(Value::from(vec!["apple", "apricot"])));

    select.click_option(0);
    assert_eq!(form.get("fruits"), Some(Value::from(vec!["apricot"])));

    select.remove(&Value::from("apricot"));
    assert_eq!(form.get("fruits"), Some(Value::Array(vec![])));
    assert_eq!(
        form.get_value(),
        Value::object([("fruits", Value::Array(vec![]))])
    );
}

#[test]
fn test_disabled_ignores_changes_and_focus() {
    let form = Form::default();
    let select = Select::new(&form, SelectOptions::new("fruit").disabled(true), fruits());
    select.open();
    select.handle_change(Value::from("apple"));
    assert!(!select.is_open());
    assert_eq!(form.get("fruit"), None);
}

#[test]
fn test_clear_requires_clearable() {
    let form = Form::default();
    let select = Select::new(&form, SelectOptions::new("fruit"), fruits());
    select.click_option(1);
    select.clear();
    assert_eq!(form.get("fruit"), Some(Value::from("banana")));

    let clearable = Select::new(&form, SelectOptions::new("other").clearable(), fruits());
    clearable.click_option(1);
    clearable.open();
    clearable.clear();
    assert_eq!(form.get("other"), None);
    assert!(!clearable.is_open());
}

#[test]
fn test_create_selects_new_option() {
    let form = Form::default();
    let select = Select::new(
        &form,
        SelectOptions::new("tags")
            .multiple()
            .on_create(|text| Value::from(text.to_uppercase())),
        Vec::new(),
    );
    select.create("");
    select.create("rust");
    assert_eq!(form.get("tags"), Some(Value::from(vec!["RUST"])));
}

#[test]
fn test_filter_and_hover() {
    let form = Form::default();
    let select = Select::new(&form, SelectOptions::new("fruit"), fruits());
    select.open();
    select.set_filter("ap");

    let visible = select.visible_items();
    assert_eq!(visible.len(), 2);
    assert!(!visible.contains(&1));

    select.hover_move(1);
    assert_eq!(select.hover_index(), Some(0));
    select.hover_move(-1);
    assert_eq!(select.hover_index(), Some(1));

    select.select_hovered();
    let chosen = &fruits()[visible[1]];
    assert_eq!(form.get("fruit").as_ref(), Some(chosen));

    // Closing clears the filter and hover.
    assert!(!select.is_open());
    assert_eq!(select.filter(), "");
    assert_eq!(select.hover_index(), None);
}

#[test]
fn test_focus_hooks() {
    let form = Form::default();
    let focus = Arc::new(AtomicUsize::new(0));
    let blur = Arc::new(AtomicUsize::new(0));
    let focus_cb = Arc::clone(&focus);
    let blur_cb = Arc::clone(&blur);
    let select = Select::new(
        &form,
        SelectOptions::new("fruit")
            .on_focus(move || {
                focus_cb.fetch_add(1, Ordering::SeqCst);
            })
            .on_blur(move || {
                blur_cb.fetch_add(1, Ordering::SeqCst);
            }),
        fruits(),
    );

    select.open();
    select.open();
    select.close();

    assert_eq!(focus.load(Ordering::SeqCst), 1);
    assert_eq!(blur.load(Ordering::SeqCst), 1);
}

#[test]
fn test_mirrors_form_writes() {
    let form = Form::default();
    let select = Select::new(&form, SelectOptions::new("fruit"), fruits());
    select.clear_dirty();

    form.set("fruit", "apricot");

    assert!(select.is_dirty());
    assert_eq!(select.selected(), vec![Value::from("apricot")]);

    form.set_error("fruit", "Pick another");
    assert_eq!(select.error(), Some(Value::from("Pick another")));
}

#[test]
fn test_reset_restores_empty_selection() {
    let form = Form::default();
    let select = Select::new(&form, SelectOptions::new("fruits").multiple(), fruits());
    select.click_option(1);
    form.reset();
    assert!(select.selected().is_empty());
}

#[test]
fn test_drop_unbinds_field() {
    let form = Form::default();
    {
        let select = Select::new(&form, SelectOptions::new("fruit"), fruits());
        select.click_option(0);
        assert!(form.is_bound("fruit"));
    }
    assert!(!form.is_bound("fruit"));
    assert_eq!(form.get("fruit"), None);
}

#[tokio::test]
async fn test_rules_on_select_field() {
    let form = Form::new(FormOptions::new().rule("fruit", vec![Rule::required().message("Pick one")]));
    let select = Select::new(&form, SelectOptions::new("fruit"), fruits());
    let validator = form.rules_validator("fruit");
    // Rebinding with a validator keeps the select's subscription.
    form.bind("fruit", subscriber(|_| {}), None, Some(validator));

    assert!(form.validate(true).await.is_err());
    assert_eq!(select.error(), Some(Value::from("Pick one")));

    select.click_option(2);
    assert!(form.validate(true).await.is_ok());
    assert_eq!(select.error(), None);
}

//! Tests loading the bundled Mumbai demo model.
use std::path::PathBuf;
use surgecast::model::Model;

/// Get the path to the Mumbai demo model
fn get_model_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("mumbai")
}

#[test]
fn test_load_demo_model() {
    let model = Model::from_path(get_model_dir()).unwrap();

    assert_eq!(model.facilities.len(), 7);
    assert_eq!(model.catalog.len(), 10);
    assert_eq!(model.forecast.horizon_days, 7);

    // Diwali is on the calendar
    let active = model.calendar.active_on("2026-11-09".parse().unwrap());
    assert!(active.iter().any(|festival| festival.name == "Diwali"));

    // Every facility has an inventory entry
    for id in model.facilities.keys() {
        assert!(model.inventory.contains_key(id));
    }
}

use combat_regression::penetration_trace;

#[test]
fn projectile_penetration_matches_golden() {
    let trace = penetration_trace(&[30.0, 25.0, 100.0], 70);
    insta::assert_json_snapshot!("projectile_penetration", trace);
}

#[test]
fn overkill_never_wastes_the_budget() {
    let trace = penetration_trace(&[5.0, 5.0, 5.0], 12);
    let pending: Vec<i64> = trace["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["pending"].as_i64().unwrap())
        .collect();
    assert_eq!(pending, vec![7, 2, 0]);
    assert_eq!(trace["fate"], "spent");
}

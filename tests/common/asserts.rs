use storypath::progress::UserProgress;
use storypath::types::StepStatus;

#[allow(dead_code)]
pub fn assert_status(progress: &UserProgress, step_id: &str, expected: StepStatus) {
    let status = progress
        .step(step_id)
        .unwrap_or_else(|| panic!("no record for step '{step_id}'"))
        .status;
    assert_eq!(status, expected, "status of step '{step_id}'");
}

#[allow(dead_code)]
pub fn assert_percent(progress: &UserProgress, expected: f64) {
    let actual = progress.overall.percent_complete;
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected percent_complete ~= {expected}, got {actual}"
    );
}

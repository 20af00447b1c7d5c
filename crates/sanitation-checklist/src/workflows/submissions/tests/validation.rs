use super::common::*;
use crate::workflows::submissions::domain::{
    IncompleteValidation, SubmissionRecord, SupervisorValidation,
};
use crate::workflows::submissions::validation::{
    apply_validation, can_validate, is_validated, ValidationRejection,
};
use std::collections::BTreeMap;

#[test]
fn unvalidated_records_report_false() {
    for filename in ["daily_A.html", "weekly_B.html", ""] {
        let record = record("sub-1", filename, at(1, 8));
        assert!(!is_validated(&record));
        assert!(can_validate(&record).is_ok());
    }
}

#[test]
fn sign_off_with_empty_checkbox_map_is_not_validated() {
    let mut record = record("sub-1", "daily_A.html", at(1, 8));
    record.supervisor_validation = Some(SupervisorValidation {
        supervisor_name: "Dana Ruiz".to_string(),
        validated_checkboxes: BTreeMap::new(),
        validated_at: at(1, 9),
    });

    assert!(!is_validated(&record));
    assert!(can_validate(&record).is_ok(), "partial sign-off may be replaced");
}

#[test]
fn named_sign_off_with_verdicts_is_validated() {
    let record = validated(record("sub-1", "daily_A.html", at(1, 8)), "Dana Ruiz", at(1, 9));

    assert!(is_validated(&record));
    let err = can_validate(&record).expect_err("re-validation rejected");
    assert_eq!(err.supervisor_name, "Dana Ruiz");
    assert_eq!(err.validated_at, at(1, 9));
}

#[test]
fn legacy_json_with_empty_verdicts_parses_as_unvalidated() {
    let raw = r#"{
        "id": "1718000000000",
        "title": "Daily Dock Sanitation",
        "originalFilename": "daily_A.html",
        "submittedAt": "2025-06-01T08:00:00Z",
        "headings": [],
        "supervisorValidation": {
            "supervisorName": "Dana Ruiz",
            "validatedCheckboxes": {},
            "validatedAt": "2025-06-01T09:00:00Z"
        }
    }"#;

    let record: SubmissionRecord = serde_json::from_str(raw).expect("legacy record parses");
    assert!(record.supervisor_validation.is_some());
    assert!(!record.is_validated());
}

#[test]
fn apply_validation_refuses_blank_supervisor() {
    let record = record("sub-1", "daily_A.html", at(1, 8));
    let verdicts = BTreeMap::from([("floor-1".to_string(), true)]);

    assert_eq!(
        apply_validation(&record, "   ", verdicts, at(1, 9)),
        Err(ValidationRejection::Incomplete(
            IncompleteValidation::MissingSupervisorName
        ))
    );
}

#[test]
fn apply_validation_keeps_unknown_task_ids() {
    let record = record("sub-1", "daily_A.html", at(1, 8));
    let verdicts = BTreeMap::from([
        ("floor-1".to_string(), true),
        ("ghost-9".to_string(), false),
    ]);

    let updated = apply_validation(&record, "Dana Ruiz", verdicts, at(1, 9)).expect("validates");
    let sign_off = updated.supervisor_validation.expect("sign-off present");
    assert_eq!(sign_off.validated_checkboxes.get("ghost-9"), Some(&false));
}

#[test]
fn apply_validation_rejects_validated_records() {
    let record = validated(record("sub-1", "daily_A.html", at(1, 8)), "Dana Ruiz", at(1, 9));
    let verdicts = BTreeMap::from([("floor-1".to_string(), false)]);

    match apply_validation(&record, "Sam Ortiz", verdicts, at(1, 10)) {
        Err(ValidationRejection::AlreadyValidated(existing)) => {
            assert_eq!(existing.supervisor_name, "Dana Ruiz");
        }
        other => panic!("expected already validated, got {other:?}"),
    }
}

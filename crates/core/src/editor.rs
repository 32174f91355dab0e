//! Planning of a nested project + tasks submission.
//!
//! [`plan_edit`] validates the whole submission and turns it into the list of
//! writes to perform. It never touches the database: the caller applies the
//! plan inside one transaction, so a rejected plan means nothing is written.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use validator::{Validate, ValidationError, ValidationErrors};

use crate::form::{FieldValue, FormErrors, ProjectForm, TaskAttributes};
use crate::position::PositionAllocator;
use crate::types::{DbId, Position};

const BLANK: &str = "can't be blank";
const NOT_A_NUMBER: &str = "is not a number";
const NEGATIVE: &str = "must be greater than or equal to 0";
const TOO_LARGE: &str = "is too large";
const DUPLICATE_ROW: &str = "appears more than once";

/// Persisted sibling state the planner needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingTask {
    pub id: DbId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFields {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Row key the task was submitted under.
    pub key: String,
    pub title: String,
    pub allotted_time: i32,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub id: DbId,
    pub title: String,
    pub allotted_time: i32,
    /// `None` keeps the stored position.
    pub position: Option<Position>,
}

/// Validated writes for one submission, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    pub project: ProjectFields,
    pub creates: Vec<NewTask>,
    pub updates: Vec<TaskUpdate>,
    pub deletes: Vec<DbId>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// One or more fields failed validation.
    #[error("submission has invalid fields")]
    Invalid(FormErrors),

    /// A line item names a task that does not belong to the project.
    #[error("task {0} does not belong to this project")]
    UnknownTask(DbId),
}

#[derive(Debug, Validate)]
struct ProjectDraft {
    #[validate(custom(function = "not_blank"))]
    name: String,
}

#[derive(Debug, Validate)]
struct TaskDraft {
    #[validate(custom(function = "not_blank"))]
    title: String,
    #[validate(range(min = 0, message = "must be greater than or equal to 0"))]
    allotted_time: Option<i64>,
    #[validate(range(min = 0, message = "must be greater than or equal to 0"))]
    position: Option<i64>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed(BLANK)));
    }
    Ok(())
}

/// Copy `validator` errors into the form error map.
fn absorb(errors: &mut FormErrors, row: Option<&str>, found: &ValidationErrors) {
    for (field, list) in found.field_errors() {
        for err in list.iter() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string());
            match row {
                Some(key) => errors.add_task(key, field.to_string(), message),
                None => errors.add(field.to_string(), message),
            }
        }
    }
}

/// Parse the raw allotted time. `Err` carries the message for the field.
fn parse_allotted_time(raw: Option<&FieldValue>) -> Result<i64, &'static str> {
    match raw {
        None => Err(BLANK),
        Some(FieldValue::Number(n)) => Ok(*n),
        Some(FieldValue::Text(s)) if s.trim().is_empty() => Err(BLANK),
        Some(FieldValue::Text(s)) => s.trim().parse().map_err(|_| NOT_A_NUMBER),
        Some(FieldValue::Other(_)) => Err(NOT_A_NUMBER),
    }
}

/// Parse an optional explicit position. Blank means "not given".
fn parse_position(raw: Option<&FieldValue>) -> Result<Option<i64>, &'static str> {
    match raw {
        None => Ok(None),
        Some(FieldValue::Number(n)) => Ok(Some(*n)),
        Some(FieldValue::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(FieldValue::Text(s)) => s.trim().parse().map(Some).map_err(|_| NOT_A_NUMBER),
        Some(FieldValue::Other(_)) => Err(NOT_A_NUMBER),
    }
}

/// Validate one create/update row. Field errors go straight into `errors`.
fn validate_row(key: &str, attrs: &TaskAttributes, errors: &mut FormErrors) -> Option<TaskDraft> {
    let mut ok = true;

    let allotted_time = match parse_allotted_time(attrs.allotted_time.as_ref()) {
        Ok(n) => Some(n),
        Err(message) => {
            errors.add_task(key, "allotted_time", message);
            ok = false;
            None
        }
    };

    let position = match parse_position(attrs.position.as_ref()) {
        Ok(p) => p,
        Err(message) => {
            errors.add_task(key, "position", message);
            ok = false;
            None
        }
    };

    let draft = TaskDraft {
        title: attrs.title.clone().unwrap_or_default(),
        allotted_time,
        position,
    };

    if let Err(found) = draft.validate() {
        absorb(errors, Some(key), &found);
        ok = false;
    }

    if draft.allotted_time.is_some_and(|n| n > i64::from(i32::MAX)) {
        errors.add_task(key, "allotted_time", TOO_LARGE);
        ok = false;
    }
    if draft.position.is_some_and(|n| n > i64::from(i32::MAX)) {
        errors.add_task(key, "position", TOO_LARGE);
        ok = false;
    }

    ok.then_some(draft)
}

fn to_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Validate `form` against the project's current tasks and plan the writes.
///
/// New tasks without an explicit position are placed after every sibling,
/// counting both `existing` and earlier rows of the same submission.
pub fn plan_edit(form: &ProjectForm, existing: &[ExistingTask]) -> Result<EditPlan, PlanError> {
    let mut errors = FormErrors::default();

    let project = ProjectDraft {
        name: form.name.clone(),
    };
    if let Err(found) = project.validate() {
        absorb(&mut errors, None, &found);
    }

    let known: HashMap<DbId, Position> = existing.iter().map(|t| (t.id, t.position)).collect();
    let mut allocator = PositionAllocator::new(existing.iter().map(|t| t.position));
    for attrs in form.tasks_attributes.values().filter(|a| !a.destroy) {
        if let Ok(Some(p)) = parse_position(attrs.position.as_ref()) {
            if (0..=i64::from(i32::MAX)).contains(&p) {
                allocator.observe(to_i32(p));
            }
        }
    }

    let mut creates = Vec::new();
    let mut updates = Vec::new();
    let mut deletes = Vec::new();
    let mut seen = HashSet::new();

    for (key, attrs) in &form.tasks_attributes {
        if let Some(id) = attrs.id {
            if !known.contains_key(&id) {
                return Err(PlanError::UnknownTask(id));
            }
            if !seen.insert(id) {
                errors.add_task(key, "id", DUPLICATE_ROW);
                continue;
            }
        }

        if attrs.destroy {
            // A destroyed row that was never saved is simply dropped.
            if let Some(id) = attrs.id {
                deletes.push(id);
            }
            continue;
        }

        let Some(draft) = validate_row(key, attrs, &mut errors) else {
            continue;
        };
        let title = draft.title.trim().to_string();
        let allotted_time = to_i32(draft.allotted_time.unwrap_or_default());
        let position = draft.position.map(to_i32);

        match attrs.id {
            Some(id) => updates.push(TaskUpdate {
                id,
                title,
                allotted_time,
                position,
            }),
            None => {
                let Some(position) = position.or_else(|| allocator.allocate()) else {
                    errors.add_task(key, "position", TOO_LARGE);
                    continue;
                };
                creates.push(NewTask {
                    key: key.clone(),
                    title,
                    allotted_time,
                    position,
                });
            }
        }
    }

    if !errors.is_empty() {
        return Err(PlanError::Invalid(errors));
    }

    let description = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(EditPlan {
        project: ProjectFields {
            name: form.name.trim().to_string(),
            description,
        },
        creates,
        updates,
        deletes,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn form(value: serde_json::Value) -> ProjectForm {
        serde_json::from_value(value).expect("form should parse")
    }

    fn invalid(result: Result<EditPlan, PlanError>) -> FormErrors {
        match result {
            Err(PlanError::Invalid(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn new_project_tasks_get_sequential_positions() {
        let plan = plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": {
                    "a": { "title": "Design", "allotted_time": "60" },
                    "b": { "title": "Build", "allotted_time": 120 },
                    "c": { "title": "Ship", "allotted_time": "15" }
                }
            })),
            &[],
        )
        .expect("plan should succeed");

        let positions: Vec<_> = plan.creates.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(plan.creates[1].allotted_time, 120);
        assert_eq!(plan.creates[0].key, "a");
    }

    #[test]
    fn new_tasks_follow_existing_siblings() {
        let existing = [
            ExistingTask { id: 1, position: 0 },
            ExistingTask { id: 2, position: 4 },
        ];
        let plan = plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": {
                    "x": { "title": "Extra", "allotted_time": 5 }
                }
            })),
            &existing,
        )
        .expect("plan should succeed");
        assert_eq!(plan.creates[0].position, 5);
    }

    #[test]
    fn explicit_positions_are_not_reused() {
        let plan = plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": {
                    "a": { "title": "Auto", "allotted_time": 5 },
                    "b": { "title": "Pinned", "allotted_time": 5, "position": 0 }
                }
            })),
            &[],
        )
        .expect("plan should succeed");
        assert_eq!(plan.creates[0].position, 1);
        assert_eq!(plan.creates[1].position, 0);
    }

    #[test]
    fn update_keeps_position_unless_given() {
        let existing = [ExistingTask { id: 7, position: 3 }];
        let plan = plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": {
                    "task-7": { "id": 7, "title": "Renamed", "allotted_time": "30" }
                }
            })),
            &existing,
        )
        .expect("plan should succeed");
        assert_eq!(
            plan.updates,
            vec![TaskUpdate {
                id: 7,
                title: "Renamed".into(),
                allotted_time: 30,
                position: None,
            }]
        );
    }

    #[test]
    fn destroy_skips_field_validation() {
        let existing = [ExistingTask { id: 7, position: 0 }];
        let plan = plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": {
                    "task-7": { "id": 7, "title": "", "_destroy": "1" },
                    "tmp": { "title": "", "_destroy": "1" }
                }
            })),
            &existing,
        )
        .expect("plan should succeed");
        assert_eq!(plan.deletes, vec![7]);
        assert!(plan.creates.is_empty());
        assert!(plan.updates.is_empty());
    }

    #[test]
    fn errors_are_keyed_by_row_and_field() {
        let errors = invalid(plan_edit(
            &form(json!({
                "name": "  ",
                "tasks_attributes": {
                    "ok": { "title": "Fine", "allotted_time": 10 },
                    "bad": { "title": "", "allotted_time": "soon" },
                    "neg": { "title": "Neg", "allotted_time": -5, "position": -1 }
                }
            })),
            &[],
        ));

        assert_eq!(errors.fields["name"], vec![BLANK]);
        assert!(errors.task("ok").is_none());
        let bad = errors.task("bad").expect("bad row has errors");
        assert_eq!(bad["title"], vec![BLANK]);
        assert_eq!(bad["allotted_time"], vec![NOT_A_NUMBER]);
        let neg = errors.task("neg").expect("neg row has errors");
        assert_eq!(neg["allotted_time"], vec![NEGATIVE]);
        assert_eq!(neg["position"], vec![NEGATIVE]);
    }

    #[test]
    fn missing_allotted_time_is_blank() {
        let errors = invalid(plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": { "a": { "title": "No time" } }
            })),
            &[],
        ));
        assert_eq!(errors.task("a").expect("row errors")["allotted_time"], vec![BLANK]);
    }

    #[test]
    fn foreign_task_id_is_not_found() {
        let result = plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": { "a": { "id": 99, "title": "Hijack", "allotted_time": 1 } }
            })),
            &[ExistingTask { id: 1, position: 0 }],
        );
        assert_eq!(result, Err(PlanError::UnknownTask(99)));
    }

    #[test]
    fn same_task_twice_is_rejected() {
        let errors = invalid(plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": {
                    "a": { "id": 1, "title": "One", "allotted_time": 1 },
                    "b": { "id": 1, "title": "Two", "allotted_time": 2 }
                }
            })),
            &[ExistingTask { id: 1, position: 0 }],
        ));
        assert_eq!(errors.task("b").expect("row errors")["id"], vec![DUPLICATE_ROW]);
    }

    #[test]
    fn blank_description_becomes_none() {
        let plan = plan_edit(&form(json!({ "name": " Site ", "description": "  " })), &[])
            .expect("plan should succeed");
        assert_eq!(plan.project.name, "Site");
        assert_eq!(plan.project.description, None);
    }

    #[test]
    fn positions_follow_submission_order_not_key_order() {
        let form: ProjectForm = serde_json::from_str(
            r#"{
                "name": "Website",
                "tasks_attributes": {
                    "z": { "title": "First", "allotted_time": 1 },
                    "a": { "title": "Second", "allotted_time": 1 }
                }
            }"#,
        )
        .expect("form should parse");
        let plan = plan_edit(&form, &[]).expect("plan should succeed");

        let placed: Vec<_> = plan
            .creates
            .iter()
            .map(|t| (t.key.as_str(), t.position))
            .collect();
        assert_eq!(placed, vec![("z", 0), ("a", 1)]);
    }

    #[test]
    fn no_position_left_after_maximum() {
        let errors = invalid(plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": {
                    "a": { "title": "Pinned", "allotted_time": 1, "position": i32::MAX },
                    "b": { "title": "Auto", "allotted_time": 1 }
                }
            })),
            &[],
        ));
        assert!(errors.task("a").is_none());
        assert_eq!(errors.task("b").expect("row errors")["position"], vec![TOO_LARGE]);

        let errors = invalid(plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": { "n": { "title": "Auto", "allotted_time": 1 } }
            })),
            &[ExistingTask { id: 1, position: i32::MAX }],
        ));
        assert_eq!(errors.task("n").expect("row errors")["position"], vec![TOO_LARGE]);
    }

    #[test]
    fn non_integer_values_are_not_numbers() {
        let errors = invalid(plan_edit(
            &form(json!({
                "name": "Website",
                "tasks_attributes": {
                    "a": { "title": "Half", "allotted_time": 1.5 },
                    "b": { "title": "Flag", "allotted_time": true, "position": "top" }
                }
            })),
            &[],
        ));
        assert_eq!(errors.task("a").expect("row errors")["allotted_time"], vec![NOT_A_NUMBER]);
        let b = errors.task("b").expect("row errors");
        assert_eq!(b["allotted_time"], vec![NOT_A_NUMBER]);
        assert_eq!(b["position"], vec![NOT_A_NUMBER]);
    }
}

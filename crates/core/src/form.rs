//! Project form model: what the browser submits and what it renders.
//!
//! Task rows are addressed by a stable key rather than their index in the
//! list. Persisted rows use `task-<id>`; rows added on the client get a fresh
//! UUID from [`new_row_key`]. Reordering or removing rows therefore never
//! renames the fields of the remaining rows.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::drag::Placement;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// `{ "project": { ... } }` envelope used by create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSubmission {
    pub project: ProjectForm,
}

/// Project fields plus the keyed task line items, in submission order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectForm {
    #[serde(default, deserialize_with = "de_text")]
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks_attributes: IndexMap<String, TaskAttributes>,
}

/// One task line item. The combination of `id` and `_destroy` decides
/// whether it creates, updates or destroys a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskAttributes {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<DbId>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub title: Option<String>,
    #[serde(default)]
    pub allotted_time: Option<FieldValue>,
    #[serde(default, rename = "_destroy", deserialize_with = "de_flag")]
    pub destroy: bool,
    #[serde(default)]
    pub position: Option<FieldValue>,
}

/// `{ "task_ids": [...] }` body of a reorder request. Ids may arrive as
/// numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SortTasksForm {
    #[serde(default, deserialize_with = "de_id_list")]
    pub task_ids: Vec<DbId>,
}

/// Server-side drop: move one task above or below another.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveTaskForm {
    #[serde(deserialize_with = "de_id")]
    pub target_id: DbId,
    pub placement: Placement,
}

/// A numeric input as it arrives from a form: JSON integer, raw text, or any
/// other value, which validation reports as not a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Text inputs: strings pass through, any other non-null value is rendered
/// as its JSON text so it can be validated and echoed back.
fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_text(deserializer)?.unwrap_or_default())
}

/// Accepts `true`, `false`, `"1"`, `"0"`, `"true"`, `"false"`, `""`, `1`, `0`
/// and `null`.
fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Flag::Bool(b)) => Ok(b),
        Some(Flag::Number(n)) => Ok(n != 0),
        Some(Flag::Text(s)) => match s.trim() {
            "1" | "true" => Ok(true),
            "" | "0" | "false" => Ok(false),
            other => Err(de::Error::custom(format!("invalid _destroy flag: {other}"))),
        },
    }
}

/// Accepts a number, a numeric string, an empty string or `null`.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<DbId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FieldValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FieldValue::Number(n)) => Ok(Some(n)),
        Some(FieldValue::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(FieldValue::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid task id: {s}"))),
        Some(FieldValue::Other(v)) => Err(de::Error::custom(format!("invalid task id: {v}"))),
    }
}

fn parse_id<E: de::Error>(value: FieldValue) -> Result<DbId, E> {
    match value {
        FieldValue::Number(n) => Ok(n),
        FieldValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid task id: {s}"))),
        FieldValue::Other(v) => Err(E::custom(format!("invalid task id: {v}"))),
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<DbId, D::Error>
where
    D: Deserializer<'de>,
{
    parse_id(FieldValue::deserialize(deserializer)?)
}

/// A missing or `null` list reads as empty.
fn de_id_list<'de, D>(deserializer: D) -> Result<Vec<DbId>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<FieldValue>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(parse_id)
        .collect()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Field-level validation errors.
///
/// Project fields sit at the top level (`name`); task errors are grouped by
/// row key and then by field (`tasks.<key>.title`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormErrors {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tasks: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.tasks.is_empty()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_task(
        &mut self,
        key: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.tasks
            .entry(key.into())
            .or_default()
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Errors recorded for one task row.
    pub fn task(&self, key: &str) -> Option<&BTreeMap<String, Vec<String>>> {
        self.tasks.get(key)
    }
}

// ---------------------------------------------------------------------------
// Rendered form
// ---------------------------------------------------------------------------

/// A single HTML-style input: field name, current value, type and DOM id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputField {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
}

/// Inputs for one task row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRowInputs {
    pub key: String,
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<DbId>,
    pub title: InputField,
    #[serde(rename = "allottedTime")]
    pub allotted_time: InputField,
    #[serde(rename = "_destroy")]
    pub destroy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormInputs {
    pub name: InputField,
    pub description: InputField,
    #[serde(rename = "tasksAttributes")]
    pub tasks_attributes: Vec<TaskRowInputs>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormTarget {
    pub action: String,
    pub method: &'static str,
}

/// Everything a client needs to render the project form.
#[derive(Debug, Clone, Serialize)]
pub struct FormPayload {
    pub form: FormTarget,
    pub inputs: FormInputs,
    pub errors: FormErrors,
}

/// Fresh key for a row that exists only on the client.
pub fn new_row_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Key for a row backed by a persisted task.
pub fn persisted_row_key(task_id: DbId) -> String {
    format!("task-{task_id}")
}

fn project_input(field: &str, value: String, kind: &'static str) -> InputField {
    InputField {
        name: format!("project[{field}]"),
        value,
        kind,
        id: format!("project_{field}"),
    }
}

fn task_input(key: &str, field: &str, value: String, kind: &'static str) -> InputField {
    InputField {
        name: format!("project[tasks_attributes][{key}][{field}]"),
        value,
        kind,
        id: format!("project_tasks_attributes_{key}_{field}"),
    }
}

impl TaskRowInputs {
    /// Empty row for a task not yet saved.
    pub fn blank() -> Self {
        Self::with_values(new_row_key(), None, String::new(), String::new(), false)
    }

    /// Row pre-filled from a persisted task.
    pub fn persisted(task_id: DbId, title: &str, allotted_time: i32) -> Self {
        Self::with_values(
            persisted_row_key(task_id),
            Some(task_id),
            title.to_string(),
            allotted_time.to_string(),
            false,
        )
    }

    fn with_values(
        key: String,
        task_id: Option<DbId>,
        title: String,
        allotted_time: String,
        destroy: bool,
    ) -> Self {
        Self {
            title: task_input(&key, "title", title, "text"),
            allotted_time: task_input(&key, "allotted_time", allotted_time, "number"),
            key,
            task_id,
            destroy,
        }
    }
}

impl FormInputs {
    pub fn new(name: &str, description: Option<&str>) -> Self {
        Self {
            name: project_input("name", name.to_string(), "text"),
            description: project_input(
                "description",
                description.unwrap_or_default().to_string(),
                "textarea",
            ),
            tasks_attributes: Vec::new(),
        }
    }

    /// Echo a submission back with the user's values and keys intact.
    pub fn from_submission(form: &ProjectForm) -> Self {
        let mut inputs = Self::new(&form.name, form.description.as_deref());
        inputs.tasks_attributes = form
            .tasks_attributes
            .iter()
            .map(|(key, attrs)| {
                TaskRowInputs::with_values(
                    key.clone(),
                    attrs.id,
                    attrs.title.clone().unwrap_or_default(),
                    attrs
                        .allotted_time
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    attrs.destroy,
                )
            })
            .collect();
        inputs
    }
}

impl FormPayload {
    /// Form for a brand new project: empty fields and one blank task row.
    pub fn new_project(action: impl Into<String>) -> Self {
        let mut inputs = FormInputs::new("", None);
        inputs.tasks_attributes.push(TaskRowInputs::blank());
        Self {
            form: FormTarget {
                action: action.into(),
                method: "post",
            },
            inputs,
            errors: FormErrors::default(),
        }
    }

    /// Form for editing a persisted project.
    pub fn edit_project(action: impl Into<String>, inputs: FormInputs) -> Self {
        Self {
            form: FormTarget {
                action: action.into(),
                method: "patch",
            },
            inputs,
            errors: FormErrors::default(),
        }
    }

    /// Re-render a rejected submission with its errors.
    pub fn rejected(
        action: impl Into<String>,
        method: &'static str,
        form: &ProjectForm,
        errors: FormErrors,
    ) -> Self {
        Self {
            form: FormTarget {
                action: action.into(),
                method,
            },
            inputs: FormInputs::from_submission(form),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn destroy_flag_accepts_form_strings() {
        let form: ProjectSubmission = serde_json::from_value(json!({
            "project": {
                "name": "Site",
                "tasks_attributes": {
                    "a": { "id": "4", "_destroy": "1" },
                    "b": { "id": 5, "_destroy": "0" },
                    "c": { "title": "New", "_destroy": true },
                    "d": { "title": "Other" }
                }
            }
        }))
        .expect("submission should parse");

        let rows = &form.project.tasks_attributes;
        assert!(rows["a"].destroy);
        assert_eq!(rows["a"].id, Some(4));
        assert!(!rows["b"].destroy);
        assert!(rows["c"].destroy);
        assert!(!rows["d"].destroy);
    }

    #[test]
    fn submission_keeps_row_order() {
        let form: ProjectForm = serde_json::from_str(
            r#"{
                "name": "Site",
                "tasks_attributes": {
                    "z": { "title": "first" },
                    "a": { "title": "second" },
                    "m": { "title": "third" }
                }
            }"#,
        )
        .expect("form should parse");

        let keys: Vec<_> = form.tasks_attributes.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn allotted_time_accepts_number_or_text() {
        let form: ProjectForm = serde_json::from_value(json!({
            "name": "Site",
            "tasks_attributes": {
                "a": { "title": "x", "allotted_time": 30 },
                "b": { "title": "y", "allotted_time": "45" }
            }
        }))
        .expect("form should parse");
        assert_eq!(
            form.tasks_attributes["a"].allotted_time,
            Some(FieldValue::Number(30))
        );
        assert_eq!(
            form.tasks_attributes["b"].allotted_time,
            Some(FieldValue::Text("45".into()))
        );
    }

    #[test]
    fn invalid_destroy_flag_is_rejected() {
        let result: Result<TaskAttributes, _> =
            serde_json::from_value(json!({ "_destroy": "maybe" }));
        assert!(result.is_err());
    }

    #[test]
    fn blank_row_field_names_use_row_key() {
        let row = TaskRowInputs::blank();
        assert_eq!(
            row.title.name,
            format!("project[tasks_attributes][{}][title]", row.key)
        );
        assert_eq!(
            row.allotted_time.id,
            format!("project_tasks_attributes_{}_allotted_time", row.key)
        );
        assert_eq!(row.title.kind, "text");
        assert_eq!(row.allotted_time.kind, "number");
        assert!(row.title.value.is_empty());
    }

    #[test]
    fn blank_rows_get_distinct_keys() {
        assert_ne!(TaskRowInputs::blank().key, TaskRowInputs::blank().key);
    }

    #[test]
    fn persisted_row_is_keyed_by_task_id() {
        let row = TaskRowInputs::persisted(12, "Wireframes", 90);
        assert_eq!(row.key, "task-12");
        assert_eq!(row.task_id, Some(12));
        assert_eq!(row.allotted_time.value, "90");
    }

    #[test]
    fn rejected_form_echoes_input() {
        let form: ProjectForm = serde_json::from_value(json!({
            "name": "",
            "tasks_attributes": {
                "k1": { "title": "Keep me", "allotted_time": "abc" }
            }
        }))
        .expect("form should parse");

        let mut errors = FormErrors::default();
        errors.add("name", "can't be blank");
        let payload = FormPayload::rejected("/projects", "post", &form, errors);

        let row = &payload.inputs.tasks_attributes[0];
        assert_eq!(row.key, "k1");
        assert_eq!(row.title.value, "Keep me");
        assert_eq!(row.allotted_time.value, "abc");
        assert_eq!(payload.errors.fields["name"], vec!["can't be blank"]);
    }

    #[test]
    fn errors_serialize_fields_and_tasks() {
        let mut errors = FormErrors::default();
        errors.add("name", "can't be blank");
        errors.add_task("k1", "title", "can't be blank");
        let value = serde_json::to_value(&errors).expect("errors serialize");
        assert_eq!(value["name"][0], "can't be blank");
        assert_eq!(value["tasks"]["k1"]["title"][0], "can't be blank");
    }

    #[test]
    fn sort_tasks_accepts_numbers_and_numeric_strings() {
        let body: SortTasksForm =
            serde_json::from_value(json!({ "task_ids": [3, "1", " 2 "] })).expect("parses");
        assert_eq!(body.task_ids, vec![3, 1, 2]);

        let missing: SortTasksForm = serde_json::from_value(json!({})).expect("parses");
        assert!(missing.task_ids.is_empty());
        assert!(serde_json::from_value::<SortTasksForm>(json!({ "task_ids": ["x"] })).is_err());
    }

    #[test]
    fn move_task_reads_target_and_placement() {
        let body: MoveTaskForm =
            serde_json::from_value(json!({ "target_id": "7", "placement": "below" }))
                .expect("parses");
        assert_eq!(body.target_id, 7);
        assert_eq!(body.placement, Placement::Below);
    }

    #[test]
    fn new_project_form_has_one_blank_row() {
        let payload = FormPayload::new_project("/projects");
        assert_eq!(payload.form.method, "post");
        assert_eq!(payload.inputs.tasks_attributes.len(), 1);
        assert!(payload.inputs.tasks_attributes[0].task_id.is_none());
    }

    #[test]
    fn non_text_values_still_parse() {
        let form: ProjectForm = serde_json::from_value(json!({
            "name": 2024,
            "tasks_attributes": {
                "a": { "title": 7, "allotted_time": 1.5, "position": true },
                "b": { "title": null, "allotted_time": false }
            }
        }))
        .expect("form should parse");

        assert_eq!(form.name, "2024");
        let a = &form.tasks_attributes["a"];
        assert_eq!(a.title.as_deref(), Some("7"));
        assert_eq!(a.allotted_time, Some(FieldValue::Other(json!(1.5))));
        assert_eq!(a.position, Some(FieldValue::Other(json!(true))));
        assert_eq!(form.tasks_attributes["b"].title, None);

        let echoed = FormInputs::from_submission(&form);
        assert_eq!(echoed.tasks_attributes[0].allotted_time.value, "1.5");
        assert_eq!(echoed.tasks_attributes[1].allotted_time.value, "false");
    }
}

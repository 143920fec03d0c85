//! Translation between backend documents and [`Task`] values
//!
//! Stored documents are loosely typed. Missing optional fields take their
//! defaults; a missing owner or a field of the wrong type is reported as
//! [`Error::MalformedDocument`].

use chrono::NaiveDate;
use serde_json::{json, Value};

use super::backend::{Document, Fields, OWNER_FIELD};
use super::model::{Subtask, Task, TaskPriority, TaskStatus};
use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Every field written for a task, in document order
pub const TASK_FIELDS: [&str; 9] = [
    OWNER_FIELD,
    "title",
    "description",
    "dueDate",
    "priority",
    "status",
    "inKanban",
    "subtasks",
    "updatedAt",
];

fn optional_str<'a>(doc: &'a Document, key: &str) -> Result<Option<&'a str>> {
    match doc.fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(Error::malformed(
            &doc.id,
            format!("field '{}' should be a string, found {}", key, other),
        )),
    }
}

/// Empty strings are stored for cleared values
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_subtask(doc: &Document, value: &Value) -> Result<Subtask> {
    let Value::Object(map) = value else {
        return Err(Error::malformed(&doc.id, "subtask should be an object"));
    };

    let id = match map.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => Subtask::new("").id,
    };
    let title = match map.get("title") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    };
    let completed = match map.get("completed") {
        Some(Value::Bool(b)) => *b,
        None | Some(Value::Null) => false,
        Some(_) => {
            return Err(Error::malformed(
                &doc.id,
                "subtask 'completed' should be a boolean",
            ))
        }
    };

    Ok(Subtask {
        id,
        title,
        completed,
    })
}

/// Decode a stored document into a task
pub fn task_from_document(doc: &Document) -> Result<Task> {
    let user_id = optional_str(doc, OWNER_FIELD)?
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::malformed(&doc.id, "missing owner field 'userId'"))?
        .to_string();

    let title = optional_str(doc, "title")?.unwrap_or_default().to_string();
    let description = non_empty(optional_str(doc, "description")?).map(str::to_string);

    let due_date = match non_empty(optional_str(doc, "dueDate")?) {
        Some(raw) => {
            // Accept full timestamps by keeping the calendar date part
            let date_part = raw.get(..10).unwrap_or(raw);
            Some(NaiveDate::parse_from_str(date_part, DATE_FORMAT).map_err(|e| {
                Error::malformed(&doc.id, format!("invalid dueDate '{}': {}", raw, e))
            })?)
        }
        None => None,
    };

    let priority = match optional_str(doc, "priority")? {
        Some(raw) => raw
            .parse::<TaskPriority>()
            .map_err(|e| Error::malformed(&doc.id, e.to_string()))?,
        None => TaskPriority::default(),
    };

    let status = match optional_str(doc, "status")? {
        Some(raw) => raw
            .parse::<TaskStatus>()
            .map_err(|e| Error::malformed(&doc.id, e.to_string()))?,
        None => TaskStatus::default(),
    };

    let in_kanban = match doc.fields.get("inKanban") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(Error::malformed(&doc.id, "field 'inKanban' should be a boolean"))
        }
    };

    let subtasks = match doc.fields.get("subtasks") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| parse_subtask(doc, item))
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(Error::malformed(&doc.id, "field 'subtasks' should be a list")),
    };

    let updated_at = doc
        .fields
        .get("updatedAt")
        .and_then(Value::as_i64)
        .unwrap_or_default();

    Ok(Task {
        id: doc.id.clone(),
        user_id,
        title,
        description,
        due_date,
        priority,
        status,
        in_kanban,
        subtasks,
        updated_at,
    })
}

fn field_value(task: &Task, key: &str) -> Value {
    match key {
        OWNER_FIELD => json!(task.user_id),
        "title" => json!(task.title),
        "description" => json!(task.description.clone().unwrap_or_default()),
        "dueDate" => json!(task
            .due_date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()),
        "priority" => json!(task.priority.as_str()),
        "status" => json!(task.status.as_str()),
        "inKanban" => json!(task.in_kanban),
        "subtasks" => Value::Array(
            task.subtasks
                .iter()
                .map(|st| json!({ "id": st.id, "title": st.title, "completed": st.completed }))
                .collect(),
        ),
        "updatedAt" => json!(task.updated_at),
        _ => Value::Null,
    }
}

/// Encode the given fields of `task` for a write
pub fn task_fields(task: &Task, keys: &[&str]) -> Fields {
    keys.iter()
        .map(|key| (key.to_string(), field_value(task, key)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(fields: Value) -> Document {
        Document {
            id: "doc-1".to_string(),
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_defaults_for_sparse_document() {
        let task = task_from_document(&doc(json!({ "userId": "u1" }))).unwrap();
        assert_eq!(task.id, "doc-1");
        assert_eq!(task.title, "");
        assert_eq!(task.priority, TaskPriority::Low);
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(!task.in_kanban);
        assert!(task.subtasks.is_empty());
        assert!(task.description.is_none());
        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_full_document() {
        let task = task_from_document(&doc(json!({
            "userId": "u1",
            "title": "Write report",
            "description": "",
            "dueDate": "2025-11-30",
            "priority": "high",
            "status": "doing",
            "inKanban": true,
            "subtasks": [
                { "id": "s1", "title": "outline", "completed": true },
                { "id": 7, "title": "draft" }
            ],
            "updatedAt": 42
        })))
        .unwrap();

        assert_eq!(task.title, "Write report");
        assert!(task.description.is_none());
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 11, 30));
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.in_kanban);
        assert_eq!(task.subtasks.len(), 2);
        assert_eq!(task.subtasks[1].id, "7");
        assert!(!task.subtasks[1].completed);
        assert_eq!(task.updated_at, 42);
    }

    #[test]
    fn test_missing_owner_is_malformed() {
        let err = task_from_document(&doc(json!({ "title": "orphan" }))).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        for fields in [
            json!({ "userId": "u1", "priority": 7 }),
            json!({ "userId": "u1", "priority": "urgent" }),
            json!({ "userId": "u1", "dueDate": "tomorrow" }),
            json!({ "userId": "u1", "inKanban": "yes" }),
            json!({ "userId": "u1", "subtasks": "none" }),
        ] {
            assert!(matches!(
                task_from_document(&doc(fields)),
                Err(Error::MalformedDocument { .. })
            ));
        }
    }

    #[test]
    fn test_encode_then_decode_keeps_task() {
        let original = task_from_document(&doc(json!({
            "userId": "u1",
            "title": "Plan",
            "dueDate": "2025-01-02",
            "priority": "medium",
            "status": "in-progress",
            "inKanban": true,
            "subtasks": [{ "id": "s1", "title": "a", "completed": false }],
            "updatedAt": 9
        })))
        .unwrap();

        let encoded = Document {
            id: original.id.clone(),
            fields: task_fields(&original, &TASK_FIELDS),
        };
        assert_eq!(encoded.fields["description"], json!(""));
        assert_eq!(task_from_document(&encoded).unwrap(), original);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::user::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicColor {
    pub key: Option<String>,
}

/// An epic as listed by the agile API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    pub id: Option<u64>,
    pub key: Option<String>,
    #[serde(rename = "self")]
    pub self_url: Option<String>,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub color: Option<EpicColor>,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: Option<String>,
    pub key: Option<String>,
    #[serde(rename = "self")]
    pub self_url: Option<String>,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedField {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// The commonly used issue fields; everything else stays in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    pub summary: Option<String>,
    pub status: Option<NamedField>,
    #[serde(rename = "issuetype")]
    pub issue_type: Option<NamedField>,
    pub priority: Option<NamedField>,
    pub assignee: Option<User>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Envelope for the backlog and epic issue listings, which nest under `issues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueList {
    pub start_at: Option<u32>,
    pub max_results: Option<u32>,
    pub total: Option<u32>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backlog_envelope_decodes() {
        let list: IssueList = serde_json::from_str(
            r#"{
                "startAt": 0,
                "maxResults": 1000,
                "total": 1,
                "issues": [{
                    "id": "10001",
                    "key": "DEV-1",
                    "self": "http://jira/rest/agile/1.0/issue/10001",
                    "fields": {
                        "summary": "Fix login",
                        "status": {"id": "3", "name": "In Progress"},
                        "issuetype": {"name": "Bug"},
                        "assignee": null,
                        "labels": ["auth"],
                        "customfield_10016": 5
                    }
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(list.total, Some(1));
        let issue = &list.issues[0];
        assert_eq!(issue.key.as_deref(), Some("DEV-1"));
        assert_eq!(issue.fields.summary.as_deref(), Some("Fix login"));
        assert_eq!(
            issue.fields.status.as_ref().unwrap().name.as_deref(),
            Some("In Progress")
        );
        assert!(issue.fields.assignee.is_none());
        assert_eq!(issue.fields.other["customfield_10016"], 5);
    }

    #[test]
    fn epic_decodes_without_optional_fields() {
        let epic: Epic = serde_json::from_str(r#"{"id":23,"name":"Onboarding"}"#).unwrap();
        assert_eq!(epic.id, Some(23));
        assert!(!epic.done);
        assert!(epic.color.is_none());
    }

    #[test]
    fn sparse_issue_and_epic_decode() {
        let list: IssueList =
            serde_json::from_str(r#"{"issues":[{"fields":{"status":{"id":"3"}}}]}"#).unwrap();
        let issue = &list.issues[0];
        assert!(issue.id.is_none());
        assert!(issue.key.is_none());
        assert!(issue.fields.status.as_ref().unwrap().name.is_none());

        let epic: Epic = serde_json::from_str(r#"{"key":"DEV-7","color":{}}"#).unwrap();
        assert!(epic.id.is_none());
        assert!(epic.color.unwrap().key.is_none());
    }
}

use serde_json::{Map, Value};

/// Where a list request for a resource is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRoute {
    /// `{backend}/{resource}` with the filter as query parameters
    Collection(String),
    /// `{backend}/categories/{archive}/subject-class/`, returns a bare array
    SubjectClass { archive: String },
}

impl ListRoute {
    pub fn path(&self) -> String {
        match self {
            Self::Collection(resource) => resource.clone(),
            Self::SubjectClass { archive } => {
                format!("categories/{}/subject-class/", urlencoding::encode(archive))
            }
        }
    }
}

/// Resource names the console uses that are served under another name
pub fn resource_alias(resource: &str) -> &str {
    match resource {
        "endorsees" => "users",
        other => other,
    }
}

pub fn list_route(resource: &str, filter: &Map<String, Value>) -> ListRoute {
    if resource == "subject_class" {
        let archive = match filter.get("archive") {
            Some(Value::String(archive)) if !archive.is_empty() => Some(archive.clone()),
            Some(Value::Number(archive)) => Some(archive.to_string()),
            _ => None,
        };
        if let Some(archive) = archive {
            return ListRoute::SubjectClass { archive };
        }
    }
    ListRoute::Collection(resource_alias(resource).to_string())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use super::pdf::Pdf;

/// A takeoff project. `data` is the opaque structured payload the client
/// edits: symbols, disciplines, areas, measurements and DALI network
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire shape for project responses: the row plus its attached drawings.
/// `pdfs` is always present, empty when the project has none.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithPdfs {
    #[serde(flatten)]
    pub project: Project,
    pub pdfs: Vec<Pdf>,
}

/// Empty-but-well-formed structured data for a project created without any.
/// All collections are present so clients never have to null-check keys.
pub fn default_project_data() -> Value {
    json!({
        "symbols": [],
        "disciplines": [],
        "areas": [],
        "measurements": [],
        "measurementGroups": [],
        "daliNetworks": [],
        "daliDevices": [],
        "ecdTypes": [],
        "daliNetworkTemplates": [],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_data_has_every_collection_empty() {
        let data = default_project_data();
        let obj = data.as_object().unwrap();

        let expected = [
            "symbols",
            "disciplines",
            "areas",
            "measurements",
            "measurementGroups",
            "daliNetworks",
            "daliDevices",
            "ecdTypes",
            "daliNetworkTemplates",
        ];
        assert_eq!(obj.len(), expected.len());
        for key in expected {
            assert_eq!(obj[key], json!([]), "collection {} should be empty", key);
        }
    }
}

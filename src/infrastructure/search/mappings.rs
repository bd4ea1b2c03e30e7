//! Index names and field mappings
//!
//! Narrative fields are mirrored into `semantic_text` fields bound to the
//! embedding inference endpoint.

use serde_json::{json, Value};

/// Inference endpoint backing the semantic fields
pub const INFERENCE_ID: &str = "cohere-embed";

/// Task type of [`INFERENCE_ID`]
pub const INFERENCE_TASK: &str = "text_embedding";

/// Service body creating [`INFERENCE_ID`] on the Cohere embedding model
pub fn inference_endpoint_config(cohere_api_key: &str) -> Value {
    json!({
        "service": "cohere",
        "service_settings": {
            "api_key": cohere_api_key,
            "model_id": "embed-v4.0",
            "embedding_type": "float"
        }
    })
}

/// Logical collection in the search engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Branches,
    Staff,
    Reports,
    Financial,
}

impl IndexKind {
    pub const ALL: [IndexKind; 4] = [
        IndexKind::Branches,
        IndexKind::Staff,
        IndexKind::Reports,
        IndexKind::Financial,
    ];

    /// Requested kinds, or all of them when none were named
    pub fn selection(requested: &[IndexKind]) -> Vec<IndexKind> {
        if requested.is_empty() {
            Self::ALL.to_vec()
        } else {
            requested.to_vec()
        }
    }

    pub fn index_name(&self) -> &'static str {
        match self {
            IndexKind::Branches => "beanstack-branches",
            IndexKind::Staff => "beanstack-staff",
            IndexKind::Reports => "beanstack-reports",
            IndexKind::Financial => "beanstack-financial-reports",
        }
    }

    pub fn mappings(&self) -> Value {
        match self {
            IndexKind::Branches => branch_mappings(),
            IndexKind::Staff => staff_mappings(),
            IndexKind::Reports => report_mappings(),
            IndexKind::Financial => financial_mappings(),
        }
    }
}

impl std::str::FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "branches" => Ok(IndexKind::Branches),
            "staff" => Ok(IndexKind::Staff),
            "reports" => Ok(IndexKind::Reports),
            "financial" => Ok(IndexKind::Financial),
            _ => Err(format!(
                "Unknown index: {} (available: branches, staff, reports, financial)",
                s
            )),
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Branches => write!(f, "branches"),
            IndexKind::Staff => write!(f, "staff"),
            IndexKind::Reports => write!(f, "reports"),
            IndexKind::Financial => write!(f, "financial"),
        }
    }
}

fn semantic() -> Value {
    json!({ "type": "semantic_text", "inference_id": INFERENCE_ID })
}

fn text_with_keyword() -> Value {
    json!({ "type": "text", "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } } })
}

fn branch_mappings() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "name": text_with_keyword(),
            "address": { "type": "text" },
            "city": { "type": "keyword" },
            "state": { "type": "keyword" },
            "zip": { "type": "keyword" },
            "region": { "type": "keyword" },
            "location": { "type": "geo_point" },
            "size": { "type": "keyword" },
            "opened_date": { "type": "date" },
            "closed_date": { "type": "date" },
            "status": { "type": "keyword" },
            "manager_email": { "type": "keyword" }
        }
    })
}

fn staff_mappings() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "name": text_with_keyword(),
            "email": { "type": "keyword" },
            "role": { "type": "keyword" },
            "branch_id": { "type": "keyword" },
            "branch_name": text_with_keyword(),
            "start_date": { "type": "date" },
            "status": { "type": "keyword" }
        }
    })
}

fn report_mappings() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "branch_id": { "type": "keyword" },
            "branch_name": text_with_keyword(),
            "sender_email": { "type": "keyword" },
            "subject": { "type": "text" },
            "text": { "type": "text" },
            "text_embedding": semantic(),
            "date": { "type": "date" },
            "timestamp": { "type": "date" }
        }
    })
}

fn financial_mappings() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "report_type": { "type": "keyword" },
            "branch_id": { "type": "keyword" },
            "branch_name": text_with_keyword(),
            "period": { "type": "keyword" },
            "start_date": { "type": "date" },
            "end_date": { "type": "date" },
            "submitted_by": { "type": "keyword" },
            "submitted_at": { "type": "date" },
            "revenue": { "type": "double" },
            "transactions": { "type": "long" },
            "avg_ticket": { "type": "double" },
            "labor_hours": { "type": "long" },
            "labor_cost_pct": { "type": "double" },
            "labor_manager_narrative": { "type": "text" },
            "labor_manager_narrative_embedding": semantic(),
            "inventory_waste_pct": { "type": "double" },
            "top_selling_items": { "type": "keyword" },
            "inventory_manager_narrative": { "type": "text" },
            "inventory_manager_narrative_embedding": semantic(),
            "customer_satisfaction": { "type": "double" },
            "employee_count": { "type": "integer" },
            "turnover_count": { "type": "integer" },
            "equipment_issues": { "type": "integer" },
            "notes": { "type": "text" },
            "notes_embedding": semantic()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_kind_parse() {
        assert_eq!("Reports".parse::<IndexKind>().unwrap(), IndexKind::Reports);
        assert!("orders".parse::<IndexKind>().is_err());
    }

    #[test]
    fn test_selection_defaults_to_all() {
        assert_eq!(IndexKind::selection(&[]).len(), 4);
        assert_eq!(
            IndexKind::selection(&[IndexKind::Staff]),
            vec![IndexKind::Staff]
        );
    }

    #[test]
    fn test_inference_endpoint_config() {
        let config = inference_endpoint_config("co-key");
        assert_eq!(config["service"], "cohere");
        assert_eq!(config["service_settings"]["api_key"], "co-key");
        assert_eq!(config["service_settings"]["model_id"], "embed-v4.0");
    }

    #[test]
    fn test_semantic_fields_use_inference_endpoint() {
        let reports = IndexKind::Reports.mappings();
        assert_eq!(
            reports["properties"]["text_embedding"]["inference_id"],
            INFERENCE_ID
        );
        let branches = IndexKind::Branches.mappings();
        assert_eq!(branches["properties"]["location"]["type"], "geo_point");
        let financial = IndexKind::Financial.mappings();
        assert_eq!(
            financial["properties"]["notes_embedding"]["type"],
            "semantic_text"
        );
    }
}

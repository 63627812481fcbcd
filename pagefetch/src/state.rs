use crate::fetcher::FetchError;
use crate::path::{resolve, resolve_or};
use pagefetch_config::{KeyPaths, Params};
use serde::Serialize;
use serde_json::Value;

/// Snapshot of a paginated fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchState {
    pub records: Vec<Value>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_records: u64,
    pub current_records: u64,
    pub items_per_page: u64,
    /// Effective params of the last committed load.
    pub params: Params,
    pub default_params: Params,
    pub is_loading: bool,
    pub error: Option<FetchError>,
    /// Raw body of the last settled fetch, or the payload attached to its
    /// error.
    pub response: Option<Value>,
}

impl FetchState {
    pub fn new(default_params: Params) -> Self {
        Self {
            records: Vec::new(),
            current_page: 0,
            total_pages: 0,
            total_records: 0,
            current_records: 0,
            items_per_page: 0,
            params: default_params.clone(),
            default_params,
            is_loading: true,
            error: None,
            response: None,
        }
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page == 1
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page == self.total_pages
    }

    pub fn paginatable(&self) -> bool {
        self.total_pages > 1
    }

    /// Pagination counts accept any non-negative JSON number (fractions are
    /// truncated) or a numeric string; anything else reads as 0.
    pub(crate) fn apply_response(
        &mut self,
        response: Value,
        params: Params,
        keys: &KeyPaths,
    ) {
        self.records = resolve_or(&response, &keys.records, Vec::new());
        self.current_page = resolve_count(&response, &keys.current_page);
        self.total_pages = resolve_count(&response, &keys.total_pages);
        self.total_records = resolve_count(&response, &keys.total_records);
        self.current_records = resolve_count(&response, &keys.current_records);
        self.items_per_page = resolve_count(&response, &keys.items_per_page);
        self.params = params;
        self.is_loading = false;
        self.error = None;
        self.response = Some(response);
    }

    /// Records and pagination stay as they were.
    pub(crate) fn apply_error(&mut self, error: FetchError) {
        self.response = error.response.clone();
        self.error = Some(error);
        self.is_loading = false;
    }
}

fn resolve_count(response: &Value, path: &str) -> u64 {
    let count = match resolve(response, path) {
        Some(Value::Number(number)) => number.as_u64().or_else(|| {
            number.as_f64().and_then(count_from_float)
        }),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(count_from_float))
        }
        _ => None,
    };
    count.unwrap_or(0)
}

fn count_from_float(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(current: u64, total: u64) -> Value {
        json!({
            "records": [1, 2, 3],
            "paginationInfo": {
                "currentPage": current,
                "totalPages": total,
                "totalRecords": 50,
                "currentRecords": 3,
                "itemsPerPage": 10,
            }
        })
    }

    #[test]
    fn test_initial_state() {
        let state = FetchState::new(Params::new());
        assert!(state.is_loading);
        assert!(state.records.is_empty());
        assert_eq!(state.current_page, 0);
        assert!(!state.paginatable());
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_apply_response() {
        let mut state = FetchState::new(Params::new());
        state.apply_response(page(2, 5), Params::new(), &KeyPaths::default());

        assert_eq!(state.records, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(state.current_page, 2);
        assert_eq!(state.total_pages, 5);
        assert_eq!(state.total_records, 50);
        assert_eq!(state.current_records, 3);
        assert_eq!(state.items_per_page, 10);
        assert!(!state.is_loading);
        assert!(!state.is_first_page());
        assert!(!state.is_last_page());
        assert!(state.paginatable());
    }

    #[test]
    fn test_first_and_last_page() {
        let mut state = FetchState::new(Params::new());
        state.apply_response(page(1, 1), Params::new(), &KeyPaths::default());
        assert!(state.is_first_page());
        assert!(state.is_last_page());
        assert!(!state.paginatable());
    }

    #[test]
    fn test_malformed_response_falls_back() {
        let mut state = FetchState::new(Params::new());
        state.apply_response(json!("not an object"), Params::new(), &KeyPaths::default());
        assert!(state.records.is_empty());
        assert_eq!(state.total_pages, 0);
        assert_eq!(state.response, Some(json!("not an object")));
    }

    #[test]
    fn test_apply_error_keeps_records() {
        let mut state = FetchState::new(Params::new());
        state.apply_response(page(2, 5), Params::new(), &KeyPaths::default());
        state.is_loading = true;

        let error = FetchError::new("boom").with_response(json!({"status": 500}));
        state.apply_error(error.clone());

        assert_eq!(state.error, Some(error));
        assert_eq!(state.response, Some(json!({"status": 500})));
        assert_eq!(state.records.len(), 3);
        assert_eq!(state.current_page, 2);
        assert!(!state.is_loading);
    }

    #[test]
    fn test_lenient_pagination_counts() {
        let mut state = FetchState::new(Params::new());
        let response = json!({
            "records": [],
            "paginationInfo": {
                "currentPage": 2.0,
                "totalPages": "3",
                "totalRecords": " 25 ",
                "currentRecords": 4.7,
                "itemsPerPage": -10,
            }
        });
        state.apply_response(response, Params::new(), &KeyPaths::default());

        assert_eq!(state.current_page, 2);
        assert_eq!(state.total_pages, 3);
        assert_eq!(state.total_records, 25);
        assert_eq!(state.current_records, 4);
        assert_eq!(state.items_per_page, 0);
        assert!(!state.is_first_page());
        assert!(state.paginatable());
    }

    #[test]
    fn test_non_numeric_counts_fall_back() {
        let mut state = FetchState::new(Params::new());
        let response = json!({
            "paginationInfo": {"currentPage": "two", "totalPages": true}
        });
        state.apply_response(response, Params::new(), &KeyPaths::default());
        assert_eq!(state.current_page, 0);
        assert_eq!(state.total_pages, 0);
    }
}

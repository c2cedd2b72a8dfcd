use manual_index::SearchResult;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SearchTopResponse {
    pub results: Vec<SearchResult>,
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;

use crate::resolution::domain::search_provider::{SearchHit, SearchProvider};
use crate::shared::constants::{DUCKDUCKGO_API_URL, HTTP_USER_AGENT};
use crate::shared::retry::{retry_with_backoff, ProviderError, RequestBudget, RetryPolicy};

const MAX_HITS: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    #[serde(default)]
    text: String,
}

/// Search adapter over the DuckDuckGo instant-answer API.
///
/// Results are cached per query for the life of the adapter, so repeated
/// mentions in one job cost a single request.
pub struct DuckDuckGoSearch {
    client: reqwest::blocking::Client,
    endpoint: String,
    policy: RetryPolicy,
    budget: Arc<RequestBudget>,
    cache: Mutex<HashMap<String, Vec<SearchHit>>>,
}

impl DuckDuckGoSearch {
    pub fn new(
        timeout: Duration,
        policy: RetryPolicy,
        budget: Arc<RequestBudget>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(HTTP_USER_AGENT)
            .build()
            .map_err(|e| ProviderError::from_reqwest(DUCKDUCKGO_API_URL, e))?;
        Ok(Self {
            client,
            endpoint: DUCKDUCKGO_API_URL.to_string(),
            policy,
            budget,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn fetch(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .map_err(|e| ProviderError::from_reqwest(&self.endpoint, e))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited {
                endpoint: self.endpoint.clone(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|e| ProviderError::from_reqwest(&self.endpoint, e))?;
        parse_hits(&body).map_err(|detail| ProviderError::Malformed {
            endpoint: self.endpoint.clone(),
            detail,
        })
    }
}

impl SearchProvider for DuckDuckGoSearch {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        if let Some(hits) = self.cache.lock().ok().and_then(|c| c.get(query).cloned()) {
            return Ok(hits);
        }
        let hits = retry_with_backoff(&self.policy, &self.budget, || self.fetch(query))?;
        log::debug!("Search '{query}' returned {} hits", hits.len());
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(query.to_string(), hits.clone());
        }
        Ok(hits)
    }
}

fn parse_hits(body: &str) -> Result<Vec<SearchHit>, String> {
    let answer: InstantAnswer = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let mut hits = Vec::new();
    if !answer.heading.is_empty() || !answer.abstract_text.is_empty() {
        hits.push(SearchHit {
            title: answer.heading,
            snippet: answer.abstract_text,
        });
    }
    hits.extend(
        answer
            .related_topics
            .into_iter()
            .filter(|t| !t.text.is_empty())
            .map(|t| SearchHit {
                title: String::new(),
                snippet: t.text,
            }),
    );
    hits.truncate(MAX_HITS);
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abstract_and_topics() {
        let body = r#"{
            "Heading": "Regional Container Lines",
            "AbstractText": "RCL is listed on the SET.",
            "RelatedTopics": [
                {"Text": "RCL shipping", "FirstURL": "https://x"},
                {"Name": "group", "Topics": []},
                {"Text": "second"},
                {"Text": "third"}
            ]
        }"#;
        let hits = parse_hits(body).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Regional Container Lines");
        assert_eq!(hits[0].snippet, "RCL is listed on the SET.");
        assert_eq!(hits[1].snippet, "RCL shipping");
    }

    #[test]
    fn test_empty_answer_has_no_hits() {
        assert!(parse_hits(r#"{"Heading": "", "RelatedTopics": []}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_non_json_is_malformed() {
        assert!(parse_hits("<html>").is_err());
    }

    #[test]
    fn test_exhausted_budget_skips_the_request() {
        let search = DuckDuckGoSearch::new(
            Duration::from_millis(10),
            RetryPolicy::immediate(1),
            Arc::new(RequestBudget::new(0)),
        )
        .unwrap();
        assert!(matches!(
            search.search("PTT"),
            Err(ProviderError::BudgetExhausted { .. })
        ));
    }
}

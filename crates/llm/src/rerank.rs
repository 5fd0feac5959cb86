//! Candidate reranking over full record detail.
//!
//! The fused candidate list carries only rank information; this stage shows
//! the completion service each candidate's actual detail (tags, duration,
//! remote flag, description) and asks for the `top_n` most relevant ids.
//! The response must be a JSON array of integer ids; everything else
//! degrades to the pre-rerank (fused) order.

use std::sync::Arc;

use crate::{CompletionService, FallbackCause};

// Descriptions are capped in the prompt to keep token usage bounded.
const DESCRIPTION_CAP: usize = 200;

/// What the reranker is shown about one candidate. A flattened view of the
/// catalog record, decoupled from the catalog crate.
#[derive(Debug, Clone)]
pub struct CandidateDetail {
    pub name: String,
    pub test_type: Vec<String>,
    pub duration: u32,
    pub remote_support: String,
    pub description: String,
}

/// Outcome of one rerank attempt. `Selected` ids are 0-based positions into
/// the candidate list handed to [`CandidateReranker::select`].
#[derive(Debug)]
pub enum Selection {
    Selected(Vec<usize>),
    Fallback(FallbackCause),
}

impl Selection {
    /// Resolve to final positions: the selected order, or the first `top_n`
    /// candidates in their pre-rerank order on fallback.
    pub fn positions_or_first(&self, candidate_count: usize, top_n: usize) -> Vec<usize> {
        match self {
            Self::Selected(ids) => ids.clone(),
            Self::Fallback(_) => (0..candidate_count.min(top_n)).collect(),
        }
    }
}

pub struct CandidateReranker {
    service: Option<Arc<dyn CompletionService>>,
}

impl CandidateReranker {
    pub fn new(service: Option<Arc<dyn CompletionService>>) -> Self {
        Self { service }
    }

    /// Ask the service to pick and order the `top_n` most relevant
    /// candidates for `query`. Every failure mode (unconfigured service,
    /// transport error, malformed or empty selection) falls back; the
    /// returned ids are always within `[0, candidates.len())`.
    pub async fn select(
        &self,
        query: &str,
        candidates: &[CandidateDetail],
        top_n: usize,
    ) -> Selection {
        let service = match &self.service {
            Some(service) => service,
            None => return Selection::Fallback(FallbackCause::Unconfigured),
        };
        if candidates.is_empty() {
            return Selection::Selected(Vec::new());
        }

        let prompt = build_prompt(query, candidates, top_n);
        match service.complete(&prompt).await {
            Ok(response) => parse_selection(&response, candidates.len(), top_n),
            Err(e) => Selection::Fallback(FallbackCause::ServiceError(e)),
        }
    }
}

fn build_prompt(query: &str, candidates: &[CandidateDetail], top_n: usize) -> String {
    let mut block = String::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let description: String = candidate.description.chars().take(DESCRIPTION_CAP).collect();
        block.push_str(&format!(
            "\nID {i}: {name}\n  - Type: {types}\n  - Duration: {duration} mins\n  - Remote: {remote}\n  - Description: {description}\n",
            i = i,
            name = candidate.name,
            types = candidate.test_type.join(", "),
            duration = candidate.duration,
            remote = candidate.remote_support,
            description = description
        ));
    }

    format!(
        r#"You are an expert skill-assessment recommender acting for a specific client.

User Query: "{query}"

Available Assessments:
{candidates}

SELECTION CRITERIA (Client Specific Priorities):
1. **Specific Tool/Skill Verification**: HIGHEST PRIORITY. If the query mentions specific tools (Excel, Java, Selenium, SQL), ALWAYS prioritize assessments that test those EXACT tools over general role assessments.
   - Example: Query "Marketing Manager with Excel" -> Prioritize "Microsoft Excel" over "Marketing Manager Solution".
2. **Exact Skill Match**: Look for assessments that match specific hard skills mentioned (e.g., "Digital Advertising", "SEO", "Automata").
3. **Role Relevance**: Use general role assessments (e.g., "Sales Solution") ONLY if specific skill tests are not available or as secondary options.
4. **Soft Skills**: Include behavioral tests (OPQ, Communication) only if explicitly requested or to round out a technical profile.

The client prefers specific, verifiable skill tests.

Select the TOP {top_n} most relevant assessments.
Return ONLY a JSON array of selected IDs. Example: [0, 3, 7, 2, 5, 8, 1, 4, 6, 9]"#,
        query = query,
        candidates = block,
        top_n = top_n
    )
}

/// Parse the service response into candidate positions.
///
/// Strips code-fence markup, then reads a JSON array. Entries that are not
/// integers or fall outside `[0, candidate_count)` are discarded; duplicates
/// keep their first occurrence. An empty surviving list is a fallback, not
/// an empty result.
fn parse_selection(response: &str, candidate_count: usize, top_n: usize) -> Selection {
    let cleaned = response.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let values: Vec<serde_json::Value> = match serde_json::from_str(cleaned) {
        Ok(values) => values,
        Err(e) => return Selection::Fallback(FallbackCause::MalformedSelection(e.to_string())),
    };

    let mut ids: Vec<usize> = Vec::new();
    for value in values {
        let id = match &value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if let Some(id) = id {
            if id >= 0 && (id as usize) < candidate_count {
                let id = id as usize;
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    }

    if ids.is_empty() {
        return Selection::Fallback(FallbackCause::EmptySelection);
    }
    ids.truncate(top_n);
    Selection::Selected(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticCompletion;

    fn candidate(name: &str) -> CandidateDetail {
        CandidateDetail {
            name: name.to_string(),
            test_type: vec!["Knowledge & Skills".to_string()],
            duration: 30,
            remote_support: "Yes".to_string(),
            description: "d".repeat(500),
        }
    }

    #[test]
    fn parse_plain_array() {
        let selection = parse_selection("[2, 0, 1]", 3, 3);
        assert!(matches!(selection, Selection::Selected(ref ids) if ids == &[2, 0, 1]));
    }

    #[test]
    fn parse_strips_code_fences() {
        let selection = parse_selection("```json\n[1, 0]\n```", 2, 2);
        assert!(matches!(selection, Selection::Selected(ref ids) if ids == &[1, 0]));
    }

    #[test]
    fn parse_discards_out_of_range_and_non_integer() {
        let selection = parse_selection(r#"[0, 99, -1, "2", 1.5, null]"#, 3, 5);
        assert!(matches!(selection, Selection::Selected(ref ids) if ids == &[0, 2]));
    }

    #[test]
    fn parse_deduplicates_preserving_first() {
        let selection = parse_selection("[1, 1, 0, 1]", 3, 5);
        assert!(matches!(selection, Selection::Selected(ref ids) if ids == &[1, 0]));
    }

    #[test]
    fn parse_truncates_to_top_n() {
        let selection = parse_selection("[0, 1, 2, 3]", 4, 2);
        assert!(matches!(selection, Selection::Selected(ref ids) if ids == &[0, 1]));
    }

    #[test]
    fn all_discarded_is_a_fallback() {
        let selection = parse_selection("[99, 100]", 3, 5);
        assert!(matches!(
            selection,
            Selection::Fallback(FallbackCause::EmptySelection)
        ));
    }

    #[test]
    fn garbage_is_a_fallback() {
        let selection = parse_selection("sure, here are my picks: 1 and 2", 3, 5);
        assert!(matches!(
            selection,
            Selection::Fallback(FallbackCause::MalformedSelection(_))
        ));
    }

    #[tokio::test]
    async fn unconfigured_falls_back_to_fused_order() {
        let reranker = CandidateReranker::new(None);
        let candidates = vec![candidate("a"), candidate("b"), candidate("c")];
        let selection = reranker.select("query", &candidates, 2).await;
        assert!(matches!(
            selection,
            Selection::Fallback(FallbackCause::Unconfigured)
        ));
        assert_eq!(selection.positions_or_first(candidates.len(), 2), vec![0, 1]);
    }

    #[tokio::test]
    async fn scripted_service_reorders() {
        let reranker = CandidateReranker::new(Some(Arc::new(StaticCompletion {
            response: "```json\n[2, 0]\n```".to_string(),
        })));
        let candidates = vec![candidate("a"), candidate("b"), candidate("c")];
        let selection = reranker.select("query", &candidates, 2).await;
        assert!(matches!(selection, Selection::Selected(ref ids) if ids == &[2, 0]));
    }

    #[test]
    fn prompt_caps_description_length() {
        let prompt = build_prompt("q", &[candidate("a")], 1);
        let run_length = prompt
            .chars()
            .fold((0usize, 0usize), |(best, current), c| {
                if c == 'd' {
                    (best.max(current + 1), current + 1)
                } else {
                    (best, 0)
                }
            })
            .0;
        assert_eq!(run_length, DESCRIPTION_CAP);
    }
}

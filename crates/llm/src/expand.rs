//! Query expansion.
//!
//! Rewrites the raw query to surface the concrete tools and hard skills the
//! catalog indexes under, so that retrieval matches "Microsoft Excel 365"
//! when the user wrote "marketing manager who knows Excel". Expansion is
//! best-effort: any failure yields the original query.

use std::sync::Arc;

use crate::{CompletionService, FallbackCause};

// Static catalog summary embedded in every expansion prompt. Keeps the
// model's vocabulary anchored to what the catalog actually contains.
const CATALOG_CONTEXT: &str = "\
AVAILABLE ASSESSMENT TYPES:
- Ability & Aptitude (numerical, verbal, inductive reasoning)
- Knowledge & Skills (Java, Python, SQL, Excel, HTML/CSS, Selenium, etc.)
- Personality & Behavior (OPQ32r, leadership assessment)
- Simulations (Automata coding tests, SVAR spoken English)
- Competencies (interpersonal communications, business communication)
- Development & 360 (leadership reports, team assessment)

COMMON SKILL KEYWORDS IN OUR CATALOG:
Programming: Java, Python, SQL, JavaScript, C++, .NET, Selenium, HTML, CSS, PHP
Business: Sales, Marketing, Management, Customer Service, Administrative
Technical: Engineering, Data, Analytics, QA, Testing, Automation
Soft Skills: Communication, Leadership, Interpersonal, Collaboration
Levels: Entry Level, Advanced, Professional, Manager, Executive";

/// Outcome of one expansion attempt.
#[derive(Debug)]
pub enum Expansion {
    Expanded(String),
    Fallback(FallbackCause),
}

impl Expansion {
    /// The text retrieval should run against: the expanded query, or the
    /// original when expansion fell back.
    pub fn text_or<'a>(&'a self, original: &'a str) -> &'a str {
        match self {
            Self::Expanded(text) => text,
            Self::Fallback(_) => original,
        }
    }
}

pub struct QueryExpander {
    service: Option<Arc<dyn CompletionService>>,
}

impl QueryExpander {
    pub fn new(service: Option<Arc<dyn CompletionService>>) -> Self {
        Self { service }
    }

    /// Expand `query`. Never fails: unconfigured service or a failed call
    /// yields `Expansion::Fallback` and the caller proceeds with the
    /// original query. No retry.
    pub async fn expand(&self, query: &str) -> Expansion {
        let service = match &self.service {
            Some(service) => service,
            None => return Expansion::Fallback(FallbackCause::Unconfigured),
        };

        let prompt = build_prompt(query);
        match service.complete(&prompt).await {
            Ok(response) => {
                let expanded = response.trim();
                if expanded.is_empty() {
                    Expansion::Fallback(FallbackCause::ServiceError(
                        crate::CompletionError::Malformed("empty response".to_string()),
                    ))
                } else {
                    Expansion::Expanded(expanded.to_string())
                }
            }
            Err(e) => Expansion::Fallback(FallbackCause::ServiceError(e)),
        }
    }
}

fn build_prompt(query: &str) -> String {
    format!(
        r#"You are an expert at understanding job requirements and matching them to skill assessment tests.

{context}

User Query: "{query}"

Task: Expand this query to include SPECIFIC TOOLS and HARD SKILLS mentioned.
The client prioritizes exact tool matches (e.g., Excel, Selenium, Java) over general role descriptions.

Instructions:
1. Identify every specific tool, language, or software mentioned (e.g., "Excel", "Python", "SEO").
2. Map these to catalog keywords (e.g., "Microsoft Excel 365", "Search Engine Optimization").
3. Include general role keywords only as secondary context.

For example:
- "Marketing Manager with Excel" -> "Microsoft Excel 365, Excel, Data Analysis, Marketing, Digital Advertising"
- "Java developer" -> "Core Java, Java 8, Automata, programming, coding simulation"

Return ONLY the expanded query (2-3 sentences max), heavily weighted towards specific hard skills."#,
        context = CATALOG_CONTEXT,
        query = query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompletionError, StaticCompletion};
    use async_trait::async_trait;

    struct FailingCompletion;

    #[async_trait]
    impl crate::CompletionService for FailingCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Err(CompletionError::Transport("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn unconfigured_falls_back_to_original() {
        let expander = QueryExpander::new(None);
        let outcome = expander.expand("Java developer").await;
        assert!(matches!(
            outcome,
            Expansion::Fallback(FallbackCause::Unconfigured)
        ));
        assert_eq!(outcome.text_or("Java developer"), "Java developer");
    }

    #[tokio::test]
    async fn service_error_falls_back_to_original() {
        let expander = QueryExpander::new(Some(Arc::new(FailingCompletion)));
        let outcome = expander.expand("Java developer").await;
        assert_eq!(outcome.text_or("Java developer"), "Java developer");
    }

    #[tokio::test]
    async fn successful_expansion_is_used() {
        let expander = QueryExpander::new(Some(Arc::new(StaticCompletion {
            response: "Core Java, Java 8, Automata, coding simulation\n".to_string(),
        })));
        let outcome = expander.expand("Java developer").await;
        assert_eq!(
            outcome.text_or("Java developer"),
            "Core Java, Java 8, Automata, coding simulation"
        );
    }

    #[test]
    fn prompt_embeds_query_and_context() {
        let prompt = build_prompt("QA tester with Selenium");
        assert!(prompt.contains("QA tester with Selenium"));
        assert!(prompt.contains("AVAILABLE ASSESSMENT TYPES"));
    }
}

use crate::services::qa::{QaService, ServiceError};
use crate::services::staging::StagedFile;
use std::sync::Arc;

/// Fixed proofreading instruction sent with every document
pub const CORRECTION_INSTRUCTION: &str = "Follow the instructions as given below:
- Run a spell check to identify misspelled words. Correct each flagged word, ensuring accurate spelling and context.
- Carefully review for grammar and sentence structure errors. Correct subject-verb agreement, tense misuse, and punctuation errors.
- Proofread line by line, focusing on syntax, coherence, and clarity. Rectify awkward phrasing, unclear language, and inconsistencies in writing style. Rewrite or rephrase sentences for enhanced readability.
- Keep the corrected document and print it. Start printing the corrected version from the next line after this statement: \"Correct version:\".
- Errors: Show the errors in the document and how they have been changed.";

/// One request to the QA service: the instruction plus a reference to the staged document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub instruction: String,
    pub model: String,
    pub document: StagedFile,
}

pub struct QueryDispatcher {
    service: Arc<dyn QaService>,
    model: String,
}

impl QueryDispatcher {
    pub fn new(service: Arc<dyn QaService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_query(&self, document: &StagedFile) -> Query {
        Query {
            instruction: CORRECTION_INSTRUCTION.to_string(),
            model: self.model.clone(),
            document: document.clone(),
        }
    }

    /// Sends the query and hands back the service's text untouched.
    /// A blank answer is an error, whichever `QaService` produced it.
    pub async fn submit(&self, query: &Query) -> Result<String, ServiceError> {
        tracing::info!(
            "Dispatching {} to QA service (model {})",
            query.document.filename,
            query.model
        );

        let answer = self.service.query(query).await.and_then(|text| {
            if text.trim().is_empty() {
                Err(ServiceError::EmptyResponse)
            } else {
                Ok(text)
            }
        });

        match answer {
            Ok(text) => {
                tracing::info!(
                    "QA service answered for {} ({} chars)",
                    query.document.filename,
                    text.chars().count()
                );
                Ok(text)
            }
            Err(e) => {
                tracing::error!("QA service failed for {}: {}", query.document.filename, e);
                Err(e)
            }
        }
    }
}

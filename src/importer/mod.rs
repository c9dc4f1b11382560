//! AI import flow: free text or URL in, parsed recipe document out, held as
//! transient pending state until the user reviews it in the editor and
//! explicitly creates the recipe.

pub mod commands;

use std::sync::Arc;

use anyhow::Result;
use log::info;
use tokio::sync::Mutex;
use url::Url;

use crate::api::ApiClient;
use crate::editor::EditorState;
use crate::models::{Recipe, RecipeVersionPayload};

const IMPORT_LANGUAGE: &str = "en";

/// Which import endpoint a pasted source routes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Webpage(Url),
    FreeText(String),
}

impl ImportSource {
    /// A source is a webpage import only when it parses as a URL with an
    /// `http`/`https` scheme; everything else is free text.
    pub fn classify(source: &str) -> Self {
        let trimmed = source.trim();
        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => ImportSource::Webpage(url),
            _ => ImportSource::FreeText(trimmed.to_owned()),
        }
    }
}

#[derive(Clone)]
pub struct ImportController {
    api: ApiClient,
    pending: Arc<Mutex<Option<RecipeVersionPayload>>>,
}

impl ImportController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Run the import and stash the parsed document for review. Returns the
    /// editor state seeded from it. On failure the previous pending import
    /// (if any) is left untouched so edits are not lost.
    pub async fn import(&self, source: &str) -> Result<EditorState> {
        let parsed = match ImportSource::classify(source) {
            ImportSource::Webpage(url) => {
                info!("importing recipe from webpage {url}");
                let content = self.api.fetch_page(url.as_str()).await?;
                self.api
                    .import_webpage(url.as_str(), &content, IMPORT_LANGUAGE)
                    .await?
            }
            ImportSource::FreeText(text) => {
                info!("importing recipe from pasted text ({} chars)", text.len());
                self.api.import_text(&text).await?
            }
        };

        let editor = EditorState::from_payload(&parsed);
        *self.pending.lock().await = Some(parsed);
        Ok(editor)
    }

    pub async fn pending(&self) -> Option<RecipeVersionPayload> {
        self.pending.lock().await.clone()
    }

    /// The explicit create action after review. The reviewed editor state is
    /// what gets submitted, not the raw parse. Pending state is cleared only
    /// on success so a failed create can be retried without losing edits.
    pub async fn create_reviewed(&self, editor: &EditorState) -> Result<Recipe> {
        let normalized = editor.normalize();
        let recipe = self.api.create_recipe(&normalized.payload).await?;
        *self.pending.lock().await = None;
        Ok(recipe)
    }

    pub async fn discard(&self) {
        *self.pending.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_url_routes_to_webpage_import() {
        match ImportSource::classify("https://example.com/recipe") {
            ImportSource::Webpage(url) => assert_eq!(url.host_str(), Some("example.com")),
            other => panic!("expected webpage import, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_routes_to_free_text_import() {
        let source = "2 cups flour, 1 tsp salt...";
        assert_eq!(
            ImportSource::classify(source),
            ImportSource::FreeText(source.into())
        );
    }

    #[test]
    fn non_http_schemes_are_treated_as_text() {
        assert!(matches!(
            ImportSource::classify("ftp://example.com/recipe.txt"),
            ImportSource::FreeText(_)
        ));
        assert!(matches!(
            ImportSource::classify("file:///etc/recipes"),
            ImportSource::FreeText(_)
        ));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert!(matches!(
            ImportSource::classify("  https://example.com/  "),
            ImportSource::Webpage(_)
        ));
    }
}

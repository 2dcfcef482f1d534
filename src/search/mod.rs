//! Tantivy-based search over the rulebook.
//!
//! The index is disposable: it is rebuilt from the record store at boot and
//! after every mutation made through the API.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::RuleSection;

const BOOST_TITLE: f32 = 10.0;
const BOOST_CONTENT: f32 = 5.0;
const BOOST_SECTION_TITLE: f32 = 2.5;

/// Largest page a single search returns.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Deepest result position a page may start at.
pub const MAX_SEARCH_OFFSET: usize = 10_000;

/// A rule matching a search, with the section it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleHit {
    pub rule_id: String,
    pub section_id: String,
    pub section_title: String,
    pub title: String,
    pub content: String,
    pub score: f32,
}

struct SearchFields {
    rule_id: Field,
    section_id: Field,
    section_title: Field,
    title: Field,
    content: Field,
}

/// Full-text index of rules.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let rule_id = schema_builder.add_text_field("rule_id", STRING | STORED);
        let section_id = schema_builder.add_text_field("section_id", STRING | STORED);
        let section_title = schema_builder.add_text_field("section_title", TEXT | STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let content = schema_builder.add_text_field("content", TEXT | STORED);
        let schema = schema_builder.build();

        let fields = SearchFields {
            rule_id,
            section_id,
            section_title,
            title,
            content,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000)
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Replace the whole index with the rules of `sections`.
    pub async fn rebuild(&self, sections: &[RuleSection]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;

        let mut count = 0usize;
        for section in sections {
            for rule in &section.rules {
                writer.add_document(doc!(
                    self.fields.rule_id => rule.id.clone(),
                    self.fields.section_id => section.id.clone(),
                    self.fields.section_title => section.title.clone(),
                    self.fields.title => rule.title.clone(),
                    self.fields.content => rule.content.clone(),
                ))?;
                count += 1;
            }
        }

        writer.commit()?;
        self.reader.reload()?;

        tracing::info!(rules = count, "Search index rebuilt");
        Ok(())
    }

    /// Search rule titles, contents and section titles.
    ///
    /// `limit` is capped at [`MAX_SEARCH_LIMIT`]. An empty query, a zero
    /// `limit` or an `offset` past [`MAX_SEARCH_OFFSET`] returns no results.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RuleHit>, AppError> {
        if query_str.trim().is_empty() || limit == 0 || offset > MAX_SEARCH_OFFSET {
            return Ok(Vec::new());
        }
        let limit = limit.min(MAX_SEARCH_LIMIT);

        let field_boosts = [
            (self.fields.title, BOOST_TITLE),
            (self.fields.content, BOOST_CONTENT),
            (self.fields.section_title, BOOST_SECTION_TITLE),
        ];

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in field_boosts {
            let parser = QueryParser::for_index(&self.index, vec![field]);
            let field_query = parser
                .parse_query(query_str)
                .map_err(|e| AppError::BadRequest(format!("Invalid search query: {}", e)))?;
            subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
        }
        let query = BooleanQuery::new(subqueries);

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit + offset))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let text = |doc: &TantivyDocument, field: Field| -> Option<String> {
            Some(doc.get_first(field)?.as_str()?.to_string())
        };

        let hits = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, address)| {
                let doc: TantivyDocument = searcher.doc(address).ok()?;
                Some(RuleHit {
                    rule_id: text(&doc, self.fields.rule_id)?,
                    section_id: text(&doc, self.fields.section_id)?,
                    section_title: text(&doc, self.fields.section_title).unwrap_or_default(),
                    title: text(&doc, self.fields.title).unwrap_or_default(),
                    content: text(&doc, self.fields.content).unwrap_or_default(),
                    score,
                })
            })
            .collect();

        Ok(hits)
    }
}

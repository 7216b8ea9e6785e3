use serde::Serialize;

use crate::{HotwheelsModel, ModelCatalog, ModelRarity};

pub const PAGE_SIZE: i64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchColumn {
    Name,
    Series,
}

impl SearchColumn {
    pub fn as_column(&self) -> &'static str {
        match self {
            SearchColumn::Name => "name",
            SearchColumn::Series => "series",
        }
    }
}

/// A case-insensitive substring match of `text` against `column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    pub column: SearchColumn,
    pub text: String,
}

/// Rows match when the rarity (if any) is equal and at least one term (if any) matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub rarity: Option<ModelRarity>,
    pub any_of: Vec<SearchTerm>,
}

impl SearchFilter {
    pub fn matches(&self, model: &HotwheelsModel) -> bool {
        if let Some(rarity) = self.rarity {
            if model.rarity != rarity {
                return false;
            }
        }
        if self.any_of.is_empty() {
            return true;
        }
        let name = model.name.to_lowercase();
        let series = model.series.to_lowercase();
        self.any_of.iter().any(|term| match term.column {
            SearchColumn::Name => name.contains(&term.text),
            SearchColumn::Series => series.contains(&term.text),
        })
    }
}

/// A free-text catalog query. Whole words `sth`, `chase` and `th` select a
/// rarity (in that priority) and are removed from the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub rarity: Option<ModelRarity>,
    pub text: String,
    pub words: Vec<String>,
}

impl SearchQuery {
    /// `None` for a blank query.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }

        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        let rarity = if tokens.contains(&"sth") {
            Some(ModelRarity::SuperTreasureHunt)
        } else if tokens.contains(&"chase") {
            Some(ModelRarity::Chase)
        } else if tokens.contains(&"th") {
            Some(ModelRarity::TreasureHunt)
        } else {
            None
        };

        let words: Vec<String> = tokens
            .into_iter()
            .filter(|t| !matches!(*t, "sth" | "chase" | "th"))
            .map(str::to_string)
            .collect();

        Some(Self { rarity, text: words.join(" "), words })
    }

    pub fn filter(&self) -> SearchFilter {
        let mut any_of = Vec::new();
        let term = |column, text: &str| SearchTerm { column, text: text.to_string() };

        match self.words.as_slice() {
            [] => {}
            [_] => {
                any_of.push(term(SearchColumn::Name, &self.text));
                any_of.push(term(SearchColumn::Series, &self.text));
            }
            [first, second, ..] => {
                any_of.push(term(SearchColumn::Name, &self.text));
                any_of.push(term(SearchColumn::Name, first));
                any_of.push(term(SearchColumn::Name, second));
                any_of.push(term(SearchColumn::Series, first));
                any_of.push(term(SearchColumn::Series, second));
            }
        }

        SearchFilter { rarity: self.rarity, any_of }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub items: Vec<HotwheelsModel>,
    pub total: i64,
    pub page: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl SearchPage {
    pub fn empty(page: i64) -> Self {
        Self { items: Vec::new(), total: 0, page, total_pages: 0 }
    }
}

/// `%text%` with LIKE metacharacters escaped (backslash is the default escape).
pub fn ilike_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// One page of catalog matches. Storage failures are logged and answered
/// with an empty page.
pub async fn search_models(catalog: &dyn ModelCatalog, raw_query: &str, page: i64) -> SearchPage {
    let page = page.max(1);
    let Some(query) = SearchQuery::parse(raw_query) else {
        return SearchPage::empty(page);
    };

    let offset = (page - 1).saturating_mul(PAGE_SIZE);
    match catalog.search_models(&query.filter(), PAGE_SIZE, offset).await {
        Ok((items, total)) => SearchPage {
            items,
            total,
            page,
            total_pages: (total + PAGE_SIZE - 1) / PAGE_SIZE,
        },
        Err(e) => {
            tracing::error!("[search_models] query '{}' failed: {}", raw_query, e);
            SearchPage::empty(page)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn rarity_markers_are_whole_words() {
        let q = SearchQuery::parse("  Camaro STH ").unwrap();
        assert_eq!(q.rarity, Some(ModelRarity::SuperTreasureHunt));
        assert_eq!(q.words, vec!["camaro"]);

        let q = SearchQuery::parse("th chase mustang").unwrap();
        assert_eq!(q.rarity, Some(ModelRarity::Chase));
        assert_eq!(q.text, "mustang");

        let q = SearchQuery::parse("the batmobile").unwrap();
        assert_eq!(q.rarity, None);
        assert_eq!(q.words, vec!["the", "batmobile"]);

        assert!(SearchQuery::parse("   ").is_none());
    }

    #[test]
    fn filter_shapes_follow_word_count() {
        let single = SearchQuery::parse("skyline").unwrap().filter();
        assert_eq!(single.any_of.len(), 2);

        let multi = SearchQuery::parse("nissan skyline gt-r").unwrap().filter();
        assert_eq!(multi.any_of.len(), 5);
        assert_eq!(multi.any_of[0].text, "nissan skyline gt-r");
        assert_eq!(multi.any_of[2], SearchTerm { column: SearchColumn::Name, text: "skyline".into() });
        assert_eq!(multi.any_of[3], SearchTerm { column: SearchColumn::Series, text: "nissan".into() });

        let rarity_only = SearchQuery::parse("TH").unwrap().filter();
        assert_eq!(rarity_only.rarity, Some(ModelRarity::TreasureHunt));
        assert!(rarity_only.any_of.is_empty());
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(ilike_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(ilike_pattern("gt-r"), "%gt-r%");
    }

    #[tokio::test]
    async fn paging_and_rarity_filter() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        for i in 0..20 {
            store.insert_model(HotwheelsModel::new(&format!("Camaro {:02}", i), "Muscle Mania", 2020, ModelRarity::Regular)).await?;
        }
        store.insert_model(HotwheelsModel::new("Camaro Z28", "Treasure", 2021, ModelRarity::SuperTreasureHunt)).await?;

        let first = search_models(&store, "camaro", 1).await;
        assert_eq!(first.total, 21);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items.len(), 16);
        assert_eq!(first.items[0].name, "Camaro 00");

        let second = search_models(&store, "camaro", 2).await;
        assert_eq!(second.items.len(), 5);

        let sth = search_models(&store, "camaro sth", 0).await;
        assert_eq!(sth.page, 1);
        assert_eq!(sth.total, 1);
        assert_eq!(sth.items[0].name, "Camaro Z28");

        let blank = search_models(&store, "", 3).await;
        assert_eq!((blank.total, blank.page, blank.total_pages), (0, 3, 0));
        Ok(())
    }
}

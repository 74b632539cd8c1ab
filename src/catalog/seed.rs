use std::fmt;

use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use crate::models::EntityKind;
use crate::store::{Row, SelectQuery};

use super::Catalog;

const DEFAULT_SOCIAL_HANDLE: &str = "@metarhconsultoria";
const DEFAULT_WEBSITE: &str = "www.metarh.com.br";
const DEFAULT_QUOTE_CATEGORY: &str = "Inspiração";
const DEFAULT_AUTHOR_ROLE: &str = "Autor";
const DEFAULT_BOOK_CATEGORY: &str = "Desenvolvimento";

struct SeedQuote {
    category: Option<&'static str>,
    quote: &'static str,
    author_name: &'static str,
    author_role: Option<&'static str>,
}

struct SeedBook {
    category: Option<&'static str>,
    title: &'static str,
    author: &'static str,
    review: &'static str,
}

const SEED_QUOTES: &[SeedQuote] = &[
    SeedQuote {
        category: Some("Motivação"),
        quote: "O sucesso é a soma de pequenos esforços repetidos dia após dia.",
        author_name: "Robert Collier",
        author_role: Some("Escritor"),
    },
    SeedQuote {
        category: Some("Liderança"),
        quote: "A função da liderança é produzir mais líderes, não mais seguidores.",
        author_name: "Ralph Nader",
        author_role: Some("Ativista"),
    },
    SeedQuote {
        category: Some("Carreira"),
        quote: "Escolha um trabalho que você ame e não terá que trabalhar um único dia em sua vida.",
        author_name: "Confúcio",
        author_role: Some("Filósofo"),
    },
    SeedQuote {
        category: None,
        quote: "A persistência é o caminho do êxito.",
        author_name: "Charles Chaplin",
        author_role: None,
    },
    SeedQuote {
        category: Some("Produtividade"),
        quote: "Não é que tenhamos pouco tempo, é que desperdiçamos muito.",
        author_name: "Sêneca",
        author_role: Some("Filósofo"),
    },
];

const SEED_BOOKS: &[SeedBook] = &[
    SeedBook {
        category: Some("Desenvolvimento"),
        title: "Mindset: A Nova Psicologia do Sucesso",
        author: "Carol S. Dweck",
        review: "Mostra como a crença de que habilidades podem ser desenvolvidas muda a forma como aprendemos e lideramos.",
    },
    SeedBook {
        category: Some("Liderança"),
        title: "Comece pelo Porquê",
        author: "Simon Sinek",
        review: "Um guia sobre propósito e sobre como grandes líderes inspiram ação.",
    },
    SeedBook {
        category: None,
        title: "Essencialismo",
        author: "Greg McKeown",
        review: "A disciplinada busca por menos para fazer o que realmente importa.",
    },
];

/// Rows inserted by a seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub quotes_added: usize,
    pub books_added: usize,
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quotes_added == 0 && self.books_added == 0 {
            write!(f, "Nothing new added (all seed items already exist).")
        } else {
            write!(
                f,
                "Added {} quotes and {} books.",
                self.quotes_added, self.books_added
            )
        }
    }
}

impl Catalog {
    /// Inserts the built-in quotes and books whose text or title is not in
    /// the store yet. Insert failures are logged and skipped.
    pub async fn seed(&self) -> SeedReport {
        let quotes: Vec<(String, Row)> = SEED_QUOTES
            .iter()
            .map(|q| (q.quote.to_string(), quote_row(q)))
            .collect();
        let books: Vec<(String, Row)> = SEED_BOOKS
            .iter()
            .map(|b| (b.title.to_string(), book_row(b)))
            .collect();

        SeedReport {
            quotes_added: self.seed_missing(EntityKind::Quote, "quote", quotes).await,
            books_added: self.seed_missing(EntityKind::Book, "book_title", books).await,
        }
    }

    async fn seed_missing(&self, kind: EntityKind, key_column: &str, items: Vec<(String, Row)>) -> usize {
        let table = kind.table();

        // Existence checks run a few at a time; inserts stay sequential.
        let missing: Vec<Row> = stream::iter(items)
            .map(|(key, row)| async move {
                let query = SelectQuery::from(table).eq(key_column, key.as_str()).limit(1);
                match self.rows.select(&query).await {
                    Ok(found) if !found.is_empty() => None,
                    Ok(_) => Some(row),
                    Err(e) => {
                        tracing::warn!("Seed lookup for '{}' in {} failed: {}", key, table, e);
                        Some(row)
                    }
                }
            })
            .buffer_unordered(4)
            .filter_map(|r| async { r })
            .collect()
            .await;

        let mut added = 0;
        for row in missing {
            match self.rows.insert(table, row).await {
                Ok(_) => added += 1,
                Err(e) => tracing::warn!("Failed to insert seed row into {}: {}", table, e),
            }
        }

        tracing::info!("Seeded {} rows into {}", added, table);
        added
    }
}

fn quote_row(q: &SeedQuote) -> Row {
    row(json!({
        "category": q.category.unwrap_or(DEFAULT_QUOTE_CATEGORY),
        "quote": q.quote,
        "author_name": q.author_name,
        "author_role": q.author_role.unwrap_or(DEFAULT_AUTHOR_ROLE),
        "author_image": null,
        "author_image_offset_x": 0,
        "author_image_offset_y": 0,
        "social_handle": DEFAULT_SOCIAL_HANDLE,
        "footer_logo_url": null,
        "website_url": DEFAULT_WEBSITE,
        "caption": null,
    }))
}

fn book_row(b: &SeedBook) -> Row {
    row(json!({
        "category": b.category.unwrap_or(DEFAULT_BOOK_CATEGORY),
        "book_title": b.title,
        "book_author": b.author,
        "cover_image": null,
        "review": b.review,
        "social_handle": DEFAULT_SOCIAL_HANDLE,
        "footer_logo_url": null,
        "caption": null,
    }))
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

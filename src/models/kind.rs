use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// How a field is edited in the form and written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput {
    Text,
    LongText,
    Category,
    Number,
}

/// Maps a logical (camelCase) field to its store column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub label: &'static str,
    pub input: FieldInput,
}

const fn field(
    name: &'static str,
    column: &'static str,
    label: &'static str,
    input: FieldInput,
) -> FieldSpec {
    FieldSpec {
        name,
        column,
        label,
        input,
    }
}

const QUOTE_FIELDS: &[FieldSpec] = &[
    field("category", "category", "Category", FieldInput::Category),
    field("quote", "quote", "Quote", FieldInput::LongText),
    field("authorName", "author_name", "Author", FieldInput::Text),
    field("authorRole", "author_role", "Author role", FieldInput::Text),
    field("authorImage", "author_image", "Author image", FieldInput::Text),
    field("authorImageOffsetX", "author_image_offset_x", "Image offset X", FieldInput::Number),
    field("authorImageOffsetY", "author_image_offset_y", "Image offset Y", FieldInput::Number),
    field("socialHandle", "social_handle", "Social handle", FieldInput::Text),
    field("footerLogoUrl", "footer_logo_url", "Footer logo URL", FieldInput::Text),
    field("websiteUrl", "website_url", "Website", FieldInput::Text),
    field("caption", "caption", "Caption", FieldInput::LongText),
];

const BOOK_FIELDS: &[FieldSpec] = &[
    field("category", "category", "Category", FieldInput::Category),
    field("bookTitle", "book_title", "Title", FieldInput::Text),
    field("bookAuthor", "book_author", "Author", FieldInput::Text),
    field("coverImage", "cover_image", "Cover image", FieldInput::Text),
    field("review", "review", "Review", FieldInput::LongText),
    field("socialHandle", "social_handle", "Social handle", FieldInput::Text),
    field("footerLogoUrl", "footer_logo_url", "Footer logo URL", FieldInput::Text),
    field("caption", "caption", "Caption", FieldInput::LongText),
];

const JOB_FIELDS: &[FieldSpec] = &[
    field("jobTitle", "job_title", "Job title", FieldInput::Text),
    field("tagline", "tagline", "Tagline", FieldInput::Text),
    field("sector", "sector", "Sector", FieldInput::Text),
    field("jobCode", "job_code", "Job code", FieldInput::Text),
    field("contractType", "contract_type", "Contract type", FieldInput::Text),
    field("modality", "modality", "Modality", FieldInput::Text),
    field("location", "location", "Location", FieldInput::Text),
    field("imageUrl", "image_url", "Image", FieldInput::Text),
    field("footerLogoUrl", "footer_logo_url", "Footer logo URL", FieldInput::Text),
    field("websiteUrl", "website_url", "Website", FieldInput::Text),
    field("caption", "caption", "Caption", FieldInput::LongText),
];

pub const QUOTE_CATEGORIES: &[&str] = &[
    "Motivação",
    "Inspiração",
    "Liderança",
    "Carreira",
    "Produtividade",
    "Gestão de Pessoas",
];

pub const BOOK_CATEGORIES: &[&str] = &[
    "Desenvolvimento",
    "Liderança",
    "Gestão",
    "Carreira",
    "Negócios",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Quote,
    Book,
    Job,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Quote, EntityKind::Book, EntityKind::Job];

    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Quote => "quotes",
            EntityKind::Book => "books",
            EntityKind::Job => "jobs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Quote => "Quotes",
            EntityKind::Book => "Books",
            EntityKind::Job => "Jobs",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::Quote => "Quote",
            EntityKind::Book => "Book",
            EntityKind::Job => "Job",
        }
    }

    /// Editable fields in form order.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            EntityKind::Quote => QUOTE_FIELDS,
            EntityKind::Book => BOOK_FIELDS,
            EntityKind::Job => JOB_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn image_field(self) -> &'static str {
        match self {
            EntityKind::Quote => "authorImage",
            EntityKind::Book => "coverImage",
            EntityKind::Job => "imageUrl",
        }
    }

    /// Storage folder that uploaded images for this kind land in.
    pub fn upload_folder(self) -> &'static str {
        match self {
            EntityKind::Quote => "authors",
            EntityKind::Book => "books",
            EntityKind::Job => "jobs",
        }
    }

    pub fn search_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::Quote => &["quote", "authorName", "category"],
            EntityKind::Book => &["bookTitle", "bookAuthor"],
            EntityKind::Job => &["jobTitle", "jobCode"],
        }
    }

    /// Field shown in the principal column of the table.
    pub fn title_field(self) -> &'static str {
        match self {
            EntityKind::Quote => "quote",
            EntityKind::Book => "bookTitle",
            EntityKind::Job => "jobTitle",
        }
    }

    pub fn detail_field(self) -> &'static str {
        match self {
            EntityKind::Quote => "authorName",
            EntityKind::Book => "bookAuthor",
            EntityKind::Job => "jobCode",
        }
    }

    /// Field used by the random-pick category filter and the category
    /// column of the table. Jobs are grouped by sector.
    pub fn category_field(self) -> &'static str {
        match self {
            EntityKind::Quote | EntityKind::Book => "category",
            EntityKind::Job => "sector",
        }
    }

    pub fn category_column(self) -> &'static str {
        self.field(self.category_field())
            .map(|spec| spec.column)
            .unwrap_or("category")
    }

    pub fn categories(self) -> &'static [&'static str] {
        match self {
            EntityKind::Quote => QUOTE_CATEGORIES,
            EntityKind::Book => BOOK_CATEGORIES,
            EntityKind::Job => &[],
        }
    }

    pub fn next(self) -> Self {
        match self {
            EntityKind::Quote => EntityKind::Book,
            EntityKind::Book => EntityKind::Job,
            EntityKind::Job => EntityKind::Quote,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            EntityKind::Quote => EntityKind::Job,
            EntityKind::Book => EntityKind::Quote,
            EntityKind::Job => EntityKind::Book,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quote" | "quotes" => Ok(EntityKind::Quote),
            "book" | "books" => Ok(EntityKind::Book),
            "job" | "jobs" => Ok(EntityKind::Job),
            other => Err(AppError::Config(format!(
                "unknown entity kind '{other}' (expected quote, book or job)"
            ))),
        }
    }
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Marketplace category. Stored and serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Textbooks,
    Furniture,
    Clothing,
    Electronics,
    Other,
}

impl Category {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "textbooks" => Some(Self::Textbooks),
            "furniture" => Some(Self::Furniture),
            "clothing" => Some(Self::Clothing),
            "electronics" => Some(Self::Electronics),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Textbooks => "textbooks",
            Self::Furniture => "furniture",
            Self::Clothing => "clothing",
            Self::Electronics => "electronics",
            Self::Other => "other",
        }
    }
}

/// Physical condition of the item. Canonical spellings match the
/// frontend picker ("Like New", not "like_new").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    New,
    #[serde(rename = "Like New")]
    LikeNew,
    Excellent,
    Good,
    Fair,
}

impl Condition {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(Self::New),
            "like new" => Some(Self::LikeNew),
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::LikeNew => "Like New",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }
}

/// A marketplace listing. Seller email/name are a snapshot taken at
/// creation; they are not re-joined if the user record changes later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub condition: Condition,
    pub image_url: String,
    pub seller_id: Uuid,
    pub seller_email: String,
    pub seller_name: String,
    #[serde(rename = "isArchived")]
    pub archived: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub archived_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Raw row shape; category/condition live as TEXT in Postgres.
#[derive(Debug, FromRow)]
pub struct ListingRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub image_url: String,
    pub seller_id: Uuid,
    pub seller_email: String,
    pub seller_name: String,
    pub archived: bool,
    pub archived_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ListingRow> for Listing {
    type Error = anyhow::Error;

    fn try_from(r: ListingRow) -> Result<Self, Self::Error> {
        let category = Category::parse(&r.category)
            .ok_or_else(|| anyhow::anyhow!("unknown category in row: {}", r.category))?;
        let condition = Condition::parse(&r.condition)
            .ok_or_else(|| anyhow::anyhow!("unknown condition in row: {}", r.condition))?;
        Ok(Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            category,
            condition,
            image_url: r.image_url,
            seller_id: r.seller_id,
            seller_email: r.seller_email,
            seller_name: r.seller_name,
            archived: r.archived,
            archived_at: r.archived_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Browse filter for the public feed. `category` is already lowercased;
/// `search` matches name or description as a substring.
#[derive(Debug, Default, Clone)]
pub struct ListingFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

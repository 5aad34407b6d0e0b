use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::items::repo_types::{Listing, ListingFilter, ListingRow};

/// Persistence seam for listings. `update` writes the whole record,
/// last-write-wins; there is no version check.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn insert(&self, listing: Listing) -> anyhow::Result<Listing>;
    /// Non-archived listings, newest first, optionally filtered.
    async fn list(&self, filter: &ListingFilter) -> anyhow::Result<Vec<Listing>>;
    /// Any archive state.
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Listing>>;
    /// Everything the owner has, archived included, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Listing>>;
    async fn update(&self, listing: &Listing) -> anyhow::Result<()>;
}

pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn insert(&self, listing: Listing) -> anyhow::Result<Listing> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            INSERT INTO listings
                (id, name, description, price, category, condition, image_url,
                 seller_id, seller_email, seller_name, archived, archived_at,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, name, description, price, category, condition, image_url,
                      seller_id, seller_email, seller_name, archived, archived_at,
                      created_at, updated_at
            "#,
        )
        .bind(listing.id)
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(listing.category.as_str())
        .bind(listing.condition.as_str())
        .bind(&listing.image_url)
        .bind(listing.seller_id)
        .bind(&listing.seller_email)
        .bind(&listing.seller_name)
        .bind(listing.archived)
        .bind(listing.archived_at)
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn list(&self, filter: &ListingFilter) -> anyhow::Result<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, name, description, price, category, condition, image_url,
                   seller_id, seller_email, seller_name, archived, archived_at,
                   created_at, updated_at
            FROM listings
            WHERE archived = FALSE
              AND ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%'
                   OR description ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.search.as_deref())
        .bind(filter.category.as_deref())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, name, description, price, category, condition, image_url,
                   seller_id, seller_email, seller_name, archived, archived_at,
                   created_at, updated_at
            FROM listings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, name, description, price, category, condition, image_url,
                   seller_id, seller_email, seller_name, archived, archived_at,
                   created_at, updated_at
            FROM listings
            WHERE seller_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, listing: &Listing) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE listings
            SET name = $2, description = $3, price = $4, category = $5,
                condition = $6, image_url = $7, archived = $8, archived_at = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(listing.id)
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(listing.category.as_str())
        .bind(listing.condition.as_str())
        .bind(&listing.image_url)
        .bind(listing.archived)
        .bind(listing.archived_at)
        .bind(listing.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// In-memory store backing `AppState::fake()`.
#[derive(Default)]
pub struct MemListingStore {
    listings: RwLock<Vec<Listing>>,
}

#[async_trait]
impl ListingStore for MemListingStore {
    async fn insert(&self, listing: Listing) -> anyhow::Result<Listing> {
        self.listings.write().await.push(listing.clone());
        Ok(listing)
    }

    async fn list(&self, filter: &ListingFilter) -> anyhow::Result<Vec<Listing>> {
        let listings = self.listings.read().await;
        let mut out: Vec<Listing> = listings
            .iter()
            .filter(|l| !l.archived)
            .filter(|l| match &filter.search {
                Some(term) => {
                    let term = term.to_lowercase();
                    l.name.to_lowercase().contains(&term)
                        || l.description.to_lowercase().contains(&term)
                }
                None => true,
            })
            .filter(|l| match &filter.category {
                Some(cat) => l.category.as_str() == cat.as_str(),
                None => true,
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Listing>> {
        Ok(self
            .listings
            .read()
            .await
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Listing>> {
        let listings = self.listings.read().await;
        let mut out: Vec<Listing> = listings
            .iter()
            .filter(|l| l.seller_id == owner_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn update(&self, listing: &Listing) -> anyhow::Result<()> {
        let mut listings = self.listings.write().await;
        match listings.iter_mut().find(|l| l.id == listing.id) {
            Some(slot) => {
                *slot = listing.clone();
                Ok(())
            }
            None => anyhow::bail!("listing {} not found", listing.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::repo_types::{Category, Condition};
    use time::{Duration as TimeDuration, OffsetDateTime};

    fn make_listing(
        seller_id: Uuid,
        name: &str,
        description: &str,
        age_minutes: i64,
        archived: bool,
    ) -> Listing {
        let created = OffsetDateTime::now_utc() - TimeDuration::minutes(age_minutes);
        Listing {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            price: 10.0,
            category: Category::Other,
            condition: Condition::Good,
            image_url: "/uploads/x.jpg".into(),
            seller_id,
            seller_email: "s@case.edu".into(),
            seller_name: "S T".into(),
            archived,
            archived_at: archived.then(|| OffsetDateTime::now_utc()),
            created_at: created,
            updated_at: created,
        }
    }

    #[tokio::test]
    async fn list_excludes_archived_and_sorts_newest_first() {
        let store = MemListingStore::default();
        let seller = Uuid::new_v4();
        store
            .insert(make_listing(seller, "Older", "d", 30, false))
            .await
            .unwrap();
        store
            .insert(make_listing(seller, "Newer", "d", 5, false))
            .await
            .unwrap();
        store
            .insert(make_listing(seller, "Hidden", "d", 1, true))
            .await
            .unwrap();

        let feed = store.list(&ListingFilter::default()).await.unwrap();
        let names: Vec<&str> = feed.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn search_matches_name_or_description_case_insensitively() {
        let store = MemListingStore::default();
        let seller = Uuid::new_v4();
        store
            .insert(make_listing(seller, "Physics Textbook", "halliday", 10, false))
            .await
            .unwrap();
        store
            .insert(make_listing(seller, "Couch", "red PHYSICS poster included", 5, false))
            .await
            .unwrap();
        store
            .insert(make_listing(seller, "Lamp", "desk light", 1, false))
            .await
            .unwrap();

        let filter = ListingFilter {
            search: Some("physics".into()),
            category: None,
        };
        let hits = store.list(&filter).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn category_filter_is_exact() {
        let store = MemListingStore::default();
        let seller = Uuid::new_v4();
        let mut books = make_listing(seller, "Calc Book", "d", 10, false);
        books.category = Category::Textbooks;
        store.insert(books).await.unwrap();
        store
            .insert(make_listing(seller, "Chair", "d", 5, false))
            .await
            .unwrap();

        let filter = ListingFilter {
            search: None,
            category: Some("textbooks".into()),
        };
        let hits = store.list(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Calc Book");
    }

    #[tokio::test]
    async fn list_by_owner_includes_archived_newest_first() {
        let store = MemListingStore::default();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        store
            .insert(make_listing(owner, "Active", "d", 20, false))
            .await
            .unwrap();
        store
            .insert(make_listing(owner, "Archived", "d", 5, true))
            .await
            .unwrap();
        store
            .insert(make_listing(stranger, "Not Mine", "d", 1, false))
            .await
            .unwrap();

        let mine = store.list_by_owner(owner).await.unwrap();
        let names: Vec<&str> = mine.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Archived", "Active"]);
    }

    #[tokio::test]
    async fn update_replaces_whole_record() {
        let store = MemListingStore::default();
        let seller = Uuid::new_v4();
        let mut listing = store
            .insert(make_listing(seller, "Before", "d", 10, false))
            .await
            .unwrap();

        listing.name = "After".into();
        store.update(&listing).await.unwrap();

        let reloaded = store.get(listing.id).await.unwrap().unwrap();
        assert_eq!(reloaded.name, "After");
    }
}

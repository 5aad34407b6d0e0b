use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    error::ApiError,
    items::{
        dto::{ImageUpload, ListingForm},
        repo_types::{Category, Condition, Listing},
    },
    state::AppState,
};

/// Fallback image when a listing is created without a file or URL.
pub fn placeholder_image_url(name: &str) -> String {
    format!(
        "https://placehold.co/400x300/e2e8f0/cbd5e0?text={}",
        urlencoding::encode(name)
    )
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn invalid_price() -> ApiError {
    ApiError::InvalidInput("Price must be a valid non-negative number.".into())
}

fn not_found() -> ApiError {
    ApiError::NotFound("Item not found.".into())
}

fn parse_price(raw: &str) -> Result<f64, ApiError> {
    let price: f64 = raw.trim().parse().map_err(|_| invalid_price())?;
    if !price.is_finite() || price < 0.0 {
        return Err(invalid_price());
    }
    Ok(price)
}

fn parse_category(raw: &str) -> Result<Category, ApiError> {
    Category::parse(raw).ok_or_else(|| {
        ApiError::InvalidInput(
            "Invalid category. Must be one of: textbooks, furniture, clothing, electronics, other."
                .into(),
        )
    })
}

fn parse_condition(raw: &str) -> Result<Condition, ApiError> {
    Condition::parse(raw).ok_or_else(|| {
        ApiError::InvalidInput(
            "Invalid condition. Must be one of: New, Like New, Excellent, Good, Fair.".into(),
        )
    })
}

/// Only the creator may mutate a listing.
fn ensure_owner(listing: &Listing, user: &User) -> Result<(), ApiError> {
    if listing.seller_id != user.id {
        return Err(ApiError::Forbidden(
            "User not authorized to modify this item.".into(),
        ));
    }
    Ok(())
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Validate and persist an upload, returning the public path. Rejections
/// happen before anything touches the listing store.
async fn store_upload(state: &AppState, upload: ImageUpload) -> Result<String, ApiError> {
    let ext = ext_from_mime(&upload.content_type).ok_or_else(|| {
        ApiError::UploadRejected(format!(
            "File upload only supports jpeg, png, gif and webp (got {}).",
            upload.content_type
        ))
    })?;
    if upload.body.len() > state.config.max_upload_bytes {
        return Err(ApiError::UploadRejected(format!(
            "Image exceeds the upload limit of {} bytes.",
            state.config.max_upload_bytes
        )));
    }
    let key = format!("{}.{}", Uuid::new_v4(), ext);
    let url = state.images.save(&key, upload.body).await?;
    Ok(url)
}

pub async fn create_listing(
    state: &AppState,
    seller: &User,
    form: ListingForm,
) -> Result<Listing, ApiError> {
    let missing = || {
        ApiError::InvalidInput(
            "Please provide name, description, price, category, and condition.".into(),
        )
    };

    let name = non_empty(form.name).ok_or_else(missing)?;
    let description = non_empty(form.description).ok_or_else(missing)?;
    let price = parse_price(form.price.as_deref().ok_or_else(missing)?)?;
    let category = parse_category(form.category.as_deref().ok_or_else(missing)?)?;
    let condition = parse_condition(form.condition.as_deref().ok_or_else(missing)?)?;

    let image_url = if let Some(upload) = form.image_file {
        store_upload(state, upload).await?
    } else if let Some(url) = non_empty(form.image_url) {
        url
    } else {
        placeholder_image_url(&name)
    };

    let now = OffsetDateTime::now_utc();
    let listing = Listing {
        id: Uuid::new_v4(),
        name,
        description,
        price,
        category,
        condition,
        image_url,
        seller_id: seller.id,
        seller_email: seller.email.clone(),
        seller_name: seller.full_name.clone(),
        archived: false,
        archived_at: None,
        created_at: now,
        updated_at: now,
    };
    Ok(state.listings.insert(listing).await?)
}

pub async fn update_listing(
    state: &AppState,
    requester: &User,
    id: Uuid,
    form: ListingForm,
) -> Result<Listing, ApiError> {
    let Some(mut listing) = state.listings.get(id).await? else {
        return Err(not_found());
    };
    ensure_owner(&listing, requester)?;

    if let Some(name) = non_empty(form.name) {
        listing.name = name;
    }
    if let Some(description) = non_empty(form.description) {
        listing.description = description;
    }
    if let Some(price) = form.price.as_deref() {
        listing.price = parse_price(price)?;
    }
    if let Some(category) = non_empty(form.category) {
        listing.category = parse_category(&category)?;
    }
    if let Some(condition) = non_empty(form.condition) {
        listing.condition = parse_condition(&condition)?;
    }

    // A new file or a non-empty URL replaces the image; anything else,
    // including an explicitly empty imageUrl field, keeps the current one.
    if let Some(upload) = form.image_file {
        listing.image_url = store_upload(state, upload).await?;
    } else if let Some(url) = non_empty(form.image_url) {
        listing.image_url = url;
    }

    listing.updated_at = OffsetDateTime::now_utc();
    state.listings.update(&listing).await?;
    Ok(listing)
}

pub async fn toggle_archive(
    state: &AppState,
    requester: &User,
    id: Uuid,
) -> Result<Listing, ApiError> {
    let Some(mut listing) = state.listings.get(id).await? else {
        return Err(not_found());
    };
    ensure_owner(&listing, requester)?;

    let now = OffsetDateTime::now_utc();
    listing.archived = !listing.archived;
    listing.archived_at = listing.archived.then_some(now);
    listing.updated_at = now;

    state.listings.update(&listing).await?;
    Ok(listing)
}

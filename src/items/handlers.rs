use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::ApiError,
    items::{
        dto::{ImageUpload, ListingForm, ListingQuery},
        repo_types::{Listing, ListingFilter},
        services,
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items))
        .route("/items/user/:user_id", get(list_items_by_user))
        .route("/items/:id", get(get_item))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/items", post(create_item))
        .route("/items/:id", put(update_item))
        .route("/items/:id/toggle-archive", put(toggle_archive_item))
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024)) // above the per-image cap
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    Query(q): Query<ListingQuery>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let filter = ListingFilter {
        search: services::non_empty(q.search),
        category: services::non_empty(q.category).map(|c| c.to_lowercase()),
    };
    let items = state.listings.list(&filter).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Listing>, ApiError> {
    // Archived listings are still fetchable; display policy is the
    // caller's business.
    let listing = state
        .listings
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Item not found.".into()))?;
    Ok(Json(listing))
}

#[instrument(skip(state))]
pub async fn list_items_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let items = state.listings.list_by_owner(user_id).await?;
    Ok(Json(items))
}

#[instrument(skip(state, user, mp))]
pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    let form = read_listing_form(mp).await?;
    let listing = services::create_listing(&state, &user, form).await?;
    info!(listing_id = %listing.id, seller_id = %user.id, "listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

#[instrument(skip(state, user, mp))]
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<Listing>, ApiError> {
    let form = read_listing_form(mp).await?;
    let listing = services::update_listing(&state, &user, id, form).await?;
    info!(listing_id = %listing.id, "listing updated");
    Ok(Json(listing))
}

#[instrument(skip(state, user))]
pub async fn toggle_archive_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Listing>, ApiError> {
    let listing = services::toggle_archive(&state, &user, id).await?;
    info!(listing_id = %listing.id, archived = listing.archived, "listing archive toggled");
    Ok(Json(listing))
}

/// Drain a multipart body into a form. The image travels in the
/// `itemImageFile` field; unknown fields are ignored.
async fn read_listing_form(mut mp: Multipart) -> Result<ListingForm, ApiError> {
    let mut form = ListingForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        match name.as_str() {
            "itemImageFile" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field.bytes().await.map_err(|e| {
                    ApiError::UploadRejected(format!("Image upload failed: {}", e))
                })?;
                form.image_file = Some(ImageUpload { content_type, body });
            }
            "name" => form.name = Some(text(field).await?),
            "description" => form.description = Some(text(field).await?),
            "price" => form.price = Some(text(field).await?),
            "category" => form.category = Some(text(field).await?),
            "condition" => form.condition = Some(text(field).await?),
            "imageUrl" => form.image_url = Some(text(field).await?),
            _ => {}
        }
    }
    Ok(form)
}

async fn text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Malformed multipart body: {}", e)))
}

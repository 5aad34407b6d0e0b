use bytes::Bytes;
use serde::Deserialize;

/// Query params for the public listing feed.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Image file received in a multipart body.
pub struct ImageUpload {
    pub content_type: String,
    pub body: Bytes,
}

/// Text and file fields of a create/update form. Everything arrives as
/// strings from the multipart body; absent fields stay `None`.
#[derive(Default)]
pub struct ListingForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub image_url: Option<String>,
    pub image_file: Option<ImageUpload>,
}

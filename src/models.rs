use serde::{Deserialize, Serialize};

/// Column order used for the header row and for every data row.
pub const COLUMNS: [&str; 5] = ["title", "link", "image", "price", "description"];

/// One product card as it was read off the listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    pub link: String,
    pub image: String,
    pub price: String,
    pub description: String,
}

impl ProductRecord {
    /// Cells in `COLUMNS` order.
    pub fn cells(&self) -> [&str; 5] {
        [
            &self.title,
            &self.link,
            &self.image,
            &self.price,
            &self.description,
        ]
    }
}

pub mod order_items;
pub mod orders;
pub mod postcodes;
pub mod product_colors;
pub mod product_sizes;
pub mod products;
pub mod sessions;
pub mod shops;
pub mod users;

pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use postcodes::Entity as Postcodes;
pub use product_colors::Entity as ProductColors;
pub use product_sizes::Entity as ProductSizes;
pub use products::Entity as Products;
pub use sessions::Entity as Sessions;
pub use shops::Entity as Shops;
pub use users::Entity as Users;

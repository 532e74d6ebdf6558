pub mod blog_categories;
pub mod blog_posts;
pub mod competition_results;
pub mod competitions;
pub mod horse_transporters;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod product_categories;
pub mod products;
pub mod push_subscriptions;
pub mod sea_orm_active_enums;
pub mod service_bookings;
pub mod service_reviews;
pub mod users;
pub mod veterinarians;

pub use blog_categories::Entity as BlogCategories;
pub use blog_posts::Entity as BlogPosts;
pub use competition_results::Entity as CompetitionResults;
pub use competitions::Entity as Competitions;
pub use horse_transporters::Entity as HorseTransporters;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_categories::Entity as ProductCategories;
pub use products::Entity as Products;
pub use push_subscriptions::Entity as PushSubscriptions;
pub use service_bookings::Entity as ServiceBookings;
pub use service_reviews::Entity as ServiceReviews;
pub use users::Entity as Users;
pub use veterinarians::Entity as Veterinarians;

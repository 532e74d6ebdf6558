use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        CategoryList,
        blog::{CreatePostRequest, PostList, UpdatePostRequest},
        competitions::{
            AddResultRequest, CompetitionList, CreateCompetitionRequest, ResultList,
            UpdateCompetitionRequest,
        },
        notifications::{NotificationList, UnreadCount, UpdatedCount},
        orders::{
            CreateOrderRequest, OrderItemInput, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        push::{
            SentCount, SubscribeRequest, SubscriptionInput, SubscriptionKeys, SubscriptionList,
            TestPushRequest, UnsubscribeRequest, VapidKey,
        },
        search::{SearchBuckets, SearchResults},
        services::{
            BookingList, CreateBookingRequest, CreateReviewRequest, RegisterTransporterRequest,
            RegisterVeterinarianRequest, ReviewList, TransporterList, UpdateBookingStatusRequest,
            UpdateTransporterRequest, UpdateVeterinarianRequest, VeterinarianList,
        },
    },
    entity::sea_orm_active_enums::{
        BookingStatus, NotificationType, OrderStatus, PaymentStatus, ServiceType,
    },
    models::{
        BlogPost, BlogPostSummary, Booking, Category, Competition, CompetitionResult,
        Notification, Order, OrderItem, Product, PushSubscription, Review, Transporter,
        Veterinarian,
    },
    response::{ApiResponse, Meta},
    routes::{
        blog, competitions, health, notifications, orders, products as product_routes, push,
        search, services,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::list_categories,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        services::list_veterinarians,
        services::get_veterinarian,
        services::register_veterinarian,
        services::update_veterinarian,
        services::list_transporters,
        services::get_transporter,
        services::register_transporter,
        services::update_transporter,
        services::create_booking,
        services::list_bookings,
        services::update_booking_status,
        services::create_review,
        services::list_reviews,
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        push::vapid_public_key,
        push::subscribe,
        push::unsubscribe,
        push::list_subscriptions,
        push::send_test,
        competitions::list_competitions,
        competitions::get_competition,
        competitions::create_competition,
        competitions::update_competition,
        competitions::delete_competition,
        competitions::list_results,
        competitions::add_result,
        blog::list_posts,
        blog::search_posts,
        blog::get_post,
        blog::create_post,
        blog::update_post,
        blog::delete_post,
        blog::list_categories,
        search::global_search
    ),
    components(
        schemas(
            Product,
            Order,
            OrderItem,
            Notification,
            PushSubscription,
            Booking,
            Review,
            Veterinarian,
            Transporter,
            Competition,
            CompetitionResult,
            Category,
            BlogPost,
            BlogPostSummary,
            OrderStatus,
            PaymentStatus,
            BookingStatus,
            ServiceType,
            NotificationType,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            OrderItemInput,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            RegisterVeterinarianRequest,
            UpdateVeterinarianRequest,
            RegisterTransporterRequest,
            UpdateTransporterRequest,
            CreateBookingRequest,
            UpdateBookingStatusRequest,
            CreateReviewRequest,
            VeterinarianList,
            TransporterList,
            BookingList,
            ReviewList,
            NotificationList,
            UnreadCount,
            UpdatedCount,
            SubscriptionKeys,
            SubscriptionInput,
            SubscribeRequest,
            UnsubscribeRequest,
            TestPushRequest,
            VapidKey,
            SentCount,
            SubscriptionList,
            CreateCompetitionRequest,
            CompetitionList,
            UpdateCompetitionRequest,
            AddResultRequest,
            ResultList,
            CategoryList,
            CreatePostRequest,
            UpdatePostRequest,
            PostList,
            SearchBuckets,
            SearchResults,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Notification>,
            ApiResponse<NotificationList>,
            ApiResponse<Competition>,
            ApiResponse<CompetitionList>,
            ApiResponse<BlogPost>,
            ApiResponse<PostList>,
            ApiResponse<SearchResults>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Shop", description = "Product catalogue"),
        (name = "Orders", description = "Order placement and tracking"),
        (name = "Services", description = "Veterinarians and horse transporters"),
        (name = "Bookings", description = "Service bookings"),
        (name = "Reviews", description = "Provider reviews and ratings"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Push", description = "Web Push subscriptions"),
        (name = "Competitions", description = "Equestrian competition calendar and results"),
        (name = "Blog", description = "Articles and blog categories"),
        (name = "Search", description = "Search across posts, products and competitions"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

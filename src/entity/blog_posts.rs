use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "blog_posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(nullable)]
    pub featured_image: Option<String>,
    #[sea_orm(nullable)]
    pub category_id: Option<Uuid>,
    pub author_id: Uuid,
    pub is_published: bool,
    /// Set when the post is first published and again on every re-publish.
    #[sea_orm(nullable)]
    pub published_at: Option<DateTimeWithTimeZone>,
    pub views_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::blog_categories::Entity",
        from = "Column::CategoryId",
        to = "super::blog_categories::Column::Id",
        on_delete = "SetNull"
    )]
    BlogCategories,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::blog_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BlogCategories.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

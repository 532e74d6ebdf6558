use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "competitions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub competition_type: String,
    #[sea_orm(nullable)]
    pub location: Option<String>,
    pub start_date: Date,
    #[sea_orm(nullable)]
    pub end_date: Option<Date>,
    #[sea_orm(nullable)]
    pub registration_deadline: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub prize_info: Option<String>,
    #[sea_orm(nullable)]
    pub image_url: Option<String>,
    pub is_international: bool,
    pub is_published: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::competition_results::Entity")]
    CompetitionResults,
}

impl Related<super::competition_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompetitionResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

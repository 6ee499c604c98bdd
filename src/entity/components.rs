use sea_orm::entity::prelude::*;

/// One row per catalog item; kind specific attributes live in `specs`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "components")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    pub manufacturer_id: Uuid,
    pub model: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub specs: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::manufacturers::Entity",
        from = "Column::ManufacturerId",
        to = "super::manufacturers::Column::Id",
        on_delete = "Cascade"
    )]
    Manufacturers,
    #[sea_orm(has_one = "super::stock::Entity")]
    Stock,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::cart_items::Entity")]
    CartItems,
}

impl Related<super::manufacturers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manufacturers.def()
    }
}

impl Related<super::stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stock.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

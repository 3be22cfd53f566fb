use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub name: String,
    pub address: String,
    pub postcode_id: Option<i32>,
    pub homepage: String,
    pub email: String,
    #[sea_orm(unique)]
    pub phone: String,
    #[sea_orm(unique)]
    pub cvr_number: Option<String>,
    pub active: bool,
    pub order_pickup: bool,
    pub order_delivery: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::postcodes::Entity",
        from = "Column::PostcodeId",
        to = "super::postcodes::Column::Id",
        on_delete = "Cascade"
    )]
    Postcodes,
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::postcodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Postcodes.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
